use std::fmt;

use alloy::primitives::{address, Address, U256};
use async_trait::async_trait;

use crate::{common::TxReceipt, keyshares::KeysharesPayload};

pub mod contract;

/// The on-chain side of validator registration.
#[async_trait]
pub trait SsvNetwork {
    /// Gets the current registration nonce of the owner account.
    async fn owner_nonce(&self, owner: Address) -> eyre::Result<u64>;

    /// Approves the SSVNetwork contract to spend `amount` SSV of the owner, and waits for
    /// the approval to be confirmed.
    async fn approve(&self, amount: U256) -> eyre::Result<TxReceipt>;

    /// Registers every validator of the payload in a single transaction, depositing
    /// `amount` SSV into the cluster, and waits for the transaction to be confirmed.
    async fn register_validators(
        &self,
        payload: &KeysharesPayload,
        amount: U256,
    ) -> eyre::Result<TxReceipt>;
}

/// The Ethereum network the SSV contracts are deployed on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Chain {
    /// Ethereum mainnet.
    Mainnet,
    /// The Holesky testnet.
    #[default]
    Holesky,
}

impl Chain {
    /// Network name used by the SSV API.
    pub fn api_name(&self) -> &'static str {
        match self {
            Chain::Mainnet => "mainnet",
            Chain::Holesky => "holesky",
        }
    }

    /// Public RPC endpoint used when no execution client URL is configured.
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Chain::Mainnet => "https://ethereum-rpc.publicnode.com",
            Chain::Holesky => "https://ethereum-holesky-rpc.publicnode.com",
        }
    }

    /// Address of the SSVNetwork contract.
    pub fn network_address(&self) -> Address {
        match self {
            Chain::Mainnet => address!("DD9BC35aE942eF0cFa76930954a156B3fF30a4E1"),
            Chain::Holesky => address!("38A4794cCEd47d3baf7370CcC43B560D3a1beEFA"),
        }
    }

    /// Address of the SSV token contract.
    pub fn token_address(&self) -> Address {
        match self {
            Chain::Mainnet => address!("9D65fF81a3c488d585bBfb0Bfe3c7707c7917f54"),
            Chain::Holesky => address!("ad45A78180961079BFaeEe349704F411dfF947C6"),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}
