use std::fmt;

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use eyre::{bail, eyre};
use serde::{Deserialize, Serialize};

use crate::{common::KeystoreRecord, registry::Operators};

mod http;
pub use http::HttpKeysharesGenerator;

/// Everything needed to split a chunk of validator keys across the cluster operators.
#[derive(Clone, Copy)]
pub struct KeysharesRequest<'a> {
    /// The keystores of the chunk.
    pub keystores: &'a [KeystoreRecord],
    /// Passphrase shared by all keystores.
    pub keystore_password: &'a str,
    /// The cluster operators.
    pub operators: &'a Operators,
    /// The account that will own the validators.
    pub owner: Address,
    /// Owner nonce of the first validator in the chunk.
    pub nonce: u64,
}

impl fmt::Debug for KeysharesRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeysharesRequest")
            .field("keystores", &self.keystores.len())
            .field("operators", &self.operators.ids)
            .field("owner", &self.owner)
            .field("nonce", &self.nonce)
            .finish_non_exhaustive()
    }
}

/// Generates the keyshares payload for a chunk of keystores.
#[async_trait]
pub trait KeysharesGenerator {
    /// Decrypt the keystores and split each validator key into encrypted operator shares,
    /// bound to `request.nonce`.
    async fn generate(&self, request: KeysharesRequest<'_>) -> eyre::Result<KeysharesPayload>;

    /// Check a generated payload before it is submitted. Payloads are currently
    /// submitted as generated.
    fn validate(&self, _payload: &KeysharesPayload) -> eyre::Result<()> {
        Ok(())
    }
}

/// The registration data of a chunk of validators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysharesPayload {
    /// One entry per validator.
    pub shares: Vec<ShareEntry>,
}

/// The registration data of a single validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareEntry {
    /// The validator BLS public key.
    pub public_key: Bytes,
    /// The operators holding a share of the key.
    pub operator_ids: Vec<u64>,
    /// Concatenated share public keys and encrypted shares.
    pub shares_data: Bytes,
}

/// A keyshares file as produced by the SSV key splitting tools.
#[derive(Debug, Deserialize)]
struct KeysharesFile {
    shares: Vec<KeysharesFileItem>,
}

#[derive(Debug, Deserialize)]
struct KeysharesFileItem {
    payload: ShareEntry,
}

impl KeysharesPayload {
    /// Parse a keyshares file (`{"version": .., "shares": [{"data": .., "payload": ..}]}`).
    pub fn from_keyshares_json(json: &[u8]) -> serde_json::Result<Self> {
        let file: KeysharesFile = serde_json::from_slice(json)?;
        Ok(Self { shares: file.shares.into_iter().map(|item| item.payload).collect() })
    }

    /// Number of validators in the payload.
    pub fn len(&self) -> usize {
        self.shares.len()
    }

    /// Returns true if the payload holds no validators.
    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    /// The operator IDs of the cluster. A bulk registration targets a single cluster, so
    /// every validator must use the same operators.
    pub fn operator_ids(&self) -> eyre::Result<&[u64]> {
        let first = self.shares.first().ok_or_else(|| eyre!("Empty keyshares payload"))?;

        if let Some(other) = self.shares.iter().find(|s| s.operator_ids != first.operator_ids) {
            bail!(
                "Validator {:?} uses operators {:?}, expected {:?}",
                other.public_key,
                other.operator_ids,
                first.operator_ids
            );
        }

        Ok(&first.operator_ids)
    }

    /// Validator public keys, in payload order.
    pub fn public_keys(&self) -> Vec<Bytes> {
        self.shares.iter().map(|s| s.public_key.clone()).collect()
    }

    /// Validator shares data, in payload order.
    pub fn shares_data(&self) -> Vec<Bytes> {
        self.shares.iter().map(|s| s.shares_data.clone()).collect()
    }
}
