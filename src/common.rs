use std::{fmt, ops::Range, path::PathBuf};

use alloy::primitives::B256;
use blst::min_pk::PublicKey as BlsPublicKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single validator keystore loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreRecord {
    /// The file name the keystore was read from.
    pub name: String,
    /// The raw keystore document. Its shape is opaque to the registrar and is
    /// handed as-is to the keyshares generator.
    pub keystore: serde_json::Value,
}

impl KeystoreRecord {
    /// Create a new keystore record.
    pub fn new(name: impl Into<String>, keystore: serde_json::Value) -> Self {
        Self { name: name.into(), keystore }
    }

    /// Returns the validator BLS public key advertised by the keystore, if it carries
    /// a well-formed `pubkey` field (EIP-2335).
    pub fn pubkey(&self) -> Option<BlsPublicKey> {
        let encoded = self.keystore.get("pubkey")?.as_str()?;
        let bytes = alloy::hex::decode(encoded).ok()?;
        BlsPublicKey::from_bytes(&bytes).ok()
    }
}

/// Receipt of a confirmed on-chain transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// The transaction hash.
    pub tx_hash: B256,
    /// The block the transaction was included in.
    pub block_number: Option<u64>,
}

impl fmt::Display for TxReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.block_number {
            Some(block) => write!(f, "{} (block {block})", self.tx_hash),
            None => write!(f, "{}", self.tx_hash),
        }
    }
}

/// The outcome of a single chunk registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// The chunk was registered and the transaction confirmed.
    Registered(TxReceipt),
    /// Keyshares generation, submission or confirmation failed for this chunk.
    Failed {
        /// Human readable failure reason, as written to the failure log.
        reason: String,
    },
}

impl ChunkOutcome {
    /// Returns true if the chunk was registered.
    pub fn is_registered(&self) -> bool {
        matches!(self, ChunkOutcome::Registered(_))
    }
}

/// Report for a single processed chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkReport {
    /// Zero-based chunk index.
    pub index: usize,
    /// Position of the chunk's keystores in the loaded keystore list.
    pub range: Range<usize>,
    /// The owner nonce bound into this chunk's keyshares.
    pub nonce: u64,
    /// What happened to the chunk.
    pub outcome: ChunkOutcome,
}

/// The ordered per-chunk outcomes of a registration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// The owner nonce the run started from.
    pub initial_nonce: u64,
    /// The owner nonce after every chunk was attempted.
    pub final_nonce: u64,
    /// One report per chunk, in processing order.
    pub chunks: Vec<ChunkReport>,
}

impl RunReport {
    /// Chunks that were registered successfully.
    pub fn registered(&self) -> impl Iterator<Item = &ChunkReport> {
        self.chunks.iter().filter(|c| c.outcome.is_registered())
    }

    /// Chunks that failed.
    pub fn failed(&self) -> impl Iterator<Item = &ChunkReport> {
        self.chunks.iter().filter(|c| !c.outcome.is_registered())
    }

    /// Returns the number of keystores whose chunk was registered.
    pub fn registered_validators(&self) -> usize {
        self.registered().map(|c| c.range.len()).sum()
    }
}

/// An error that can occur when loading keystores from a directory.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum LoadError {
    #[error("Failed to list keystore directory {path}: {source}")]
    ReadDir { path: PathBuf, source: std::io::Error },
    #[error("Failed to read keystore file {path}: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("Invalid keystore JSON in {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

/// A fatal error that aborts a registration run before the chunk loop starts.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum RegistrarError {
    #[error("Failed to load keystores: {0}")]
    Load(#[from] LoadError),
    #[error("Token approval failed: {0:#}")]
    Approval(eyre::Report),
    #[error("Failed to fetch owner nonce: {0:#}")]
    Nonce(eyre::Report),
}
