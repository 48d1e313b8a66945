use alloy::{
    primitives::{Address, B256, U256},
    providers::Provider,
    rpc::types::TransactionReceipt,
    sol,
    transports::http::Http,
};
use async_trait::async_trait;
use eyre::bail;
use reqwest::Client;
use tracing::{debug, instrument};

use super::{Chain, SsvNetwork};
use crate::{
    api::{ClusterSnapshot, SsvApi},
    common::TxReceipt,
    keyshares::KeysharesPayload,
};

use ISSVNetwork::{Cluster, ISSVNetworkInstance};
use ISSVToken::ISSVTokenInstance;

/// Client for the SSV token and SSVNetwork contracts of a single owner account.
///
/// Transactions are signed by whatever wallet the provider is configured with; cluster
/// snapshots and owner nonces are read from the SSV API.
#[derive(Debug, Clone)]
pub struct SsvClient<P> {
    token: ISSVTokenInstance<Http<Client>, P>,
    network: ISSVNetworkInstance<Http<Client>, P>,
    owner: Address,
    api: SsvApi,
}

impl<P> SsvClient<P>
where
    P: Provider<Http<Client>> + Clone,
{
    /// Creates a new `SsvClient` using the canonical contract deployments of `chain`.
    pub fn new(provider: P, chain: Chain, owner: Address, api: SsvApi) -> Self {
        Self::with_addresses(provider, chain.network_address(), chain.token_address(), owner, api)
    }

    /// Creates a new `SsvClient` for custom contract deployments.
    pub fn with_addresses(
        provider: P,
        network_address: Address,
        token_address: Address,
        owner: Address,
        api: SsvApi,
    ) -> Self {
        let token = ISSVToken::new(token_address, provider.clone());
        let network = ISSVNetwork::new(network_address, provider);

        Self { token, network, owner, api }
    }
}

#[async_trait]
impl<P> SsvNetwork for SsvClient<P>
where
    P: Provider<Http<Client>> + Clone + 'static,
{
    async fn owner_nonce(&self, owner: Address) -> eyre::Result<u64> {
        self.api.owner_nonce(owner).await
    }

    #[instrument(skip(self))]
    async fn approve(&self, amount: U256) -> eyre::Result<TxReceipt> {
        let spender = *self.network.address();

        let call = self.token.approve(spender, amount);
        let pending = call.send().await?;
        debug!(tx_hash = %pending.tx_hash(), %spender, "Sent token approval");

        confirmed(pending.get_receipt().await?)
    }

    #[instrument(skip_all, fields(validators = payload.len(), %amount))]
    async fn register_validators(
        &self,
        payload: &KeysharesPayload,
        amount: U256,
    ) -> eyre::Result<TxReceipt> {
        let operator_ids = payload.operator_ids()?.to_vec();

        let cluster = self.api.cluster(self.owner, &operator_ids).await?;
        debug!(?cluster, "Fetched cluster snapshot");

        let call = self.network.bulkRegisterValidator(
            payload.public_keys(),
            operator_ids,
            payload.shares_data(),
            amount,
            Cluster::try_from(cluster)?,
        );
        let pending = call.send().await?;
        debug!(tx_hash = %pending.tx_hash(), "Sent registration");

        confirmed(pending.get_receipt().await?)
    }
}

/// Fails if the transaction reverted.
fn confirmed(receipt: TransactionReceipt) -> eyre::Result<TxReceipt> {
    check_status(receipt.transaction_hash, receipt.block_number, receipt.status())
}

fn check_status(
    tx_hash: B256,
    block_number: Option<u64>,
    success: bool,
) -> eyre::Result<TxReceipt> {
    if !success {
        bail!("Transaction {tx_hash} reverted");
    }

    Ok(TxReceipt { tx_hash, block_number })
}

impl TryFrom<ClusterSnapshot> for Cluster {
    type Error = eyre::Report;

    fn try_from(snapshot: ClusterSnapshot) -> Result<Self, Self::Error> {
        Ok(Self {
            validatorCount: u32::try_from(snapshot.validator_count)?,
            networkFeeIndex: snapshot.network_fee_index,
            index: snapshot.index,
            active: snapshot.active,
            balance: snapshot.balance,
        })
    }
}

sol! {
    #[sol(rpc)]
    interface ISSVToken {
        function approve(address spender, uint256 amount) external returns (bool);
    }

    #[sol(rpc)]
    interface ISSVNetwork {
        struct Cluster {
            uint32 validatorCount;
            uint64 networkFeeIndex;
            uint64 index;
            bool active;
            uint256 balance;
        }

        function bulkRegisterValidator(
            bytes[] calldata publicKeys,
            uint64[] memory operatorIds,
            bytes[] calldata sharesData,
            uint256 amount,
            Cluster memory cluster
        ) external;
    }
}
