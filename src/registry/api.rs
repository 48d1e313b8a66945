use tracing::debug;

use super::OperatorInfo;
use crate::api::SsvApi;

/// An operator registry backed by the public SSV API.
#[derive(Debug, Clone)]
pub struct ApiRegistry {
    api: SsvApi,
    ids: Vec<u64>,
}

impl ApiRegistry {
    /// Creates a new `ApiRegistry` that looks up the given operator IDs.
    pub fn new(api: SsvApi, ids: Vec<u64>) -> Self {
        Self { api, ids }
    }

    /// Gets all configured operators. Fails if any operator cannot be fetched.
    pub async fn get_operators(&self) -> eyre::Result<Vec<OperatorInfo>> {
        let mut operators = Vec::with_capacity(self.ids.len());

        for id in &self.ids {
            let operator = self.api.operator(*id).await?;
            debug!(id, public_key = %operator.public_key, "Fetched operator");
            operators.push(operator);
        }

        Ok(operators)
    }
}
