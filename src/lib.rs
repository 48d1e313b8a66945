#![doc = include_str!("../README.md")]
#![warn(missing_debug_implementations, missing_docs, rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod common;
pub use common::{
    ChunkOutcome, ChunkReport, KeystoreRecord, LoadError, RegistrarError, RunReport, TxReceipt,
};

pub mod api;
pub use api::{ClusterSnapshot, SsvApi};

pub mod batch;
pub use batch::{NonceTracker, Registrar, RegistrarConfig};

pub mod failure;
pub use failure::FailureRecorder;

pub mod keyshares;
pub use keyshares::{HttpKeysharesGenerator, KeysharesGenerator, KeysharesPayload};

pub mod keystore;
pub use keystore::load_keystores;

pub mod network;
pub use network::{contract::SsvClient, Chain, SsvNetwork};

pub mod registry;
pub use registry::{
    api::ApiRegistry, filesystem::FilesystemRegistry, OperatorInfo, OperatorRegistry, Operators,
};

#[cfg(test)]
mod test_utils;
