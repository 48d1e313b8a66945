use std::{num::NonZeroUsize, ops::Range};

/// Default number of validators registered per transaction.
pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(40) {
    Some(size) => size,
    None => unreachable!(),
};

/// A contiguous slice of the loaded items that is registered in a single transaction.
#[derive(Debug, PartialEq, Eq)]
pub struct Chunk<'a, T> {
    /// Zero-based chunk index.
    pub index: usize,
    /// Position of the first item of the chunk in the full list.
    pub offset: usize,
    /// The items in this chunk.
    pub items: &'a [T],
}

impl<T> Clone for Chunk<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Chunk<'_, T> {}

impl<T> Chunk<'_, T> {
    /// Number of items in the chunk.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the chunk holds no items. Planned chunks are never empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Position of the chunk's items in the full list.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.items.len()
    }
}

/// Split `items` into consecutive chunks of `size` items. The last chunk holds the
/// remainder. Chunks are yielded lazily and in input order.
pub fn plan_chunks<T>(items: &[T], size: NonZeroUsize) -> impl Iterator<Item = Chunk<'_, T>> {
    items
        .chunks(size.get())
        .enumerate()
        .map(move |(index, items)| Chunk { index, offset: index * size.get(), items })
}

/// Number of chunks [`plan_chunks`] yields for `total` items.
pub fn chunk_count(total: usize, size: NonZeroUsize) -> usize {
    total.div_ceil(size.get())
}
