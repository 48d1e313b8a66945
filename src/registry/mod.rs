use async_trait::async_trait;
use eyre::bail;
use serde::{Deserialize, Serialize};

pub mod api;
pub mod filesystem;

/// A source of the operators that validator keys are distributed to.
#[async_trait]
pub trait OperatorRegistry {
    /// Returns every operator of the cluster.
    async fn operators(&self) -> eyre::Result<Vec<OperatorInfo>>;
}

/// A single SSV operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorInfo {
    /// The operator ID assigned by the SSVNetwork contract.
    pub id: u64,
    /// The operator's base64-encoded RSA public key.
    pub public_key: String,
}

/// The operator set of a cluster, as parallel lists of public keys and IDs sorted by ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Operators {
    /// Operator public keys, `keys[i]` belongs to `ids[i]`.
    pub keys: Vec<String>,
    /// Operator IDs in ascending order.
    pub ids: Vec<u64>,
}

impl Operators {
    /// Build an operator set from registry entries. The SSVNetwork contract only
    /// accepts clusters with sorted, unique operator IDs.
    pub fn from_infos(mut infos: Vec<OperatorInfo>) -> eyre::Result<Self> {
        if infos.is_empty() {
            bail!("Operator registry is empty");
        }

        infos.sort_by_key(|op| op.id);
        if let Some(dup) = infos.windows(2).find(|pair| pair[0].id == pair[1].id) {
            bail!("Duplicate operator ID {}", dup[0].id);
        }

        let (ids, keys): (Vec<u64>, Vec<String>) =
            infos.into_iter().map(|op| (op.id, op.public_key)).unzip();
        Ok(Self { keys, ids })
    }

    /// Number of operators.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if there are no operators.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[async_trait]
impl OperatorRegistry for api::ApiRegistry {
    async fn operators(&self) -> eyre::Result<Vec<OperatorInfo>> {
        self.get_operators().await
    }
}

#[async_trait]
impl OperatorRegistry for filesystem::FilesystemRegistry {
    async fn operators(&self) -> eyre::Result<Vec<OperatorInfo>> {
        Ok(self.operators.clone())
    }
}
