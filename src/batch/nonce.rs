/// Tracks the owner nonce that the next chunk's keyshares are bound to.
///
/// The tracker is seeded once from the owner's current nonce and only ever moves forward:
/// every chunk consumes one nonce slot per keystore as soon as its keyshares have been
/// requested, whether or not the registration transaction later succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceTracker {
    current: u64,
}

impl NonceTracker {
    /// Create a tracker starting at the given nonce.
    pub fn new(initial: u64) -> Self {
        Self { current: initial }
    }

    /// The nonce the next chunk will be bound to.
    pub fn current(&self) -> u64 {
        self.current
    }

    /// Consume `count` nonce slots and return the new current nonce.
    pub fn advance(&mut self, count: usize) -> u64 {
        self.current = self.current.saturating_add(count as u64);
        self.current
    }
}
