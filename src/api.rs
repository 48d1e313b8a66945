use alloy::primitives::{Address, U256};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::{network::Chain, registry::OperatorInfo};

/// Default base URL of the public SSV API.
pub const DEFAULT_SSV_API_URL: &str = "https://api.ssv.network/api/v4";

/// A minimal client for the public SSV API.
#[derive(Debug, Clone)]
pub struct SsvApi {
    http: Client,
    base_url: Url,
    chain: Chain,
}

impl SsvApi {
    /// Create a new API client for the given chain.
    pub fn new(base_url: Url, chain: Chain) -> Self {
        Self::with_client(Client::new(), base_url, chain)
    }

    /// Create a new API client reusing an existing HTTP client.
    pub fn with_client(http: Client, base_url: Url, chain: Chain) -> Self {
        Self { http, base_url, chain }
    }

    fn endpoint(&self, path: &str) -> eyre::Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{}/{path}", self.chain.api_name()))?)
    }

    /// Gets the current registration nonce of an owner account. Owners unknown to the
    /// API have not registered any validator yet and start at zero.
    #[instrument(skip(self))]
    pub async fn owner_nonce(&self, owner: Address) -> eyre::Result<u64> {
        let url = self.endpoint(&format!("accounts/{owner:#x}"))?;
        let response = self.http.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Owner account not found, starting from nonce 0");
            return Ok(0);
        }

        let account: AccountResponse = response.error_for_status()?.json().await?;
        Ok(account.data.nonce)
    }

    /// Gets the current snapshot of the cluster of `owner` with the given operators.
    /// Returns the empty snapshot if the cluster does not exist yet.
    #[instrument(skip(self))]
    pub async fn cluster(
        &self,
        owner: Address,
        operator_ids: &[u64],
    ) -> eyre::Result<ClusterSnapshot> {
        let ids = operator_ids.iter().map(u64::to_string).collect::<Vec<_>>().join(",");
        let url = self.endpoint(&format!("clusters/owner/{owner:#x}/operators/{ids}"))?;
        let response = self.http.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(ClusterSnapshot::default());
        }

        let cluster: ClusterResponse = response.error_for_status()?.json().await?;
        Ok(cluster.cluster.unwrap_or_default())
    }

    /// Gets a single operator by ID.
    #[instrument(skip(self))]
    pub async fn operator(&self, id: u64) -> eyre::Result<OperatorInfo> {
        let url = self.endpoint(&format!("operators/{id}"))?;
        let operator: OperatorResponse =
            self.http.get(url).send().await?.error_for_status()?.json().await?;

        Ok(OperatorInfo { id: operator.id, public_key: operator.public_key })
    }
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    data: AccountData,
}

#[derive(Debug, Deserialize)]
struct AccountData {
    #[serde(with = "serde_u64")]
    nonce: u64,
}

#[derive(Debug, Deserialize)]
struct ClusterResponse {
    cluster: Option<ClusterSnapshot>,
}

#[derive(Debug, Deserialize)]
struct OperatorResponse {
    id: u64,
    public_key: String,
}

/// State of an SSV cluster, as required by the SSVNetwork contract for every
/// cluster-mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSnapshot {
    /// Number of validators registered in the cluster.
    #[serde(with = "serde_u64")]
    pub validator_count: u64,
    /// Network fee index at the last cluster update.
    #[serde(with = "serde_u64")]
    pub network_fee_index: u64,
    /// Cluster index at the last cluster update.
    #[serde(with = "serde_u64")]
    pub index: u64,
    /// Whether the cluster is active.
    pub active: bool,
    /// SSV balance of the cluster.
    #[serde(with = "serde_u256")]
    pub balance: U256,
}

impl Default for ClusterSnapshot {
    fn default() -> Self {
        Self {
            validator_count: 0,
            network_fee_index: 0,
            index: 0,
            active: true,
            balance: U256::ZERO,
        }
    }
}

/// The API encodes large integers either as JSON numbers or as decimal strings.
mod serde_u64 {
    use serde::{de::Error, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::String(s) => s.parse().map_err(D::Error::custom),
        }
    }
}

mod serde_u256 {
    use alloy::primitives::U256;
    use serde::{de::Error, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => Ok(U256::from(n)),
            NumberOrString::String(s) => s.parse().map_err(|e| {
                D::Error::custom(format!("invalid uint256 {s:?}: {e:?}"))
            }),
        }
    }
}
