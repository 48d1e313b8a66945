use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use super::{KeysharesGenerator, KeysharesPayload, KeysharesRequest};

/// Delegates key splitting to an external keyshares service.
///
/// The service receives the chunk's keystores, passphrase, operators, owner and nonce as
/// JSON and answers with a keyshares file.
#[derive(Debug, Clone)]
pub struct HttpKeysharesGenerator {
    http: Client,
    url: Url,
}

impl HttpKeysharesGenerator {
    /// Create a generator posting to the given service URL.
    pub fn new(url: Url) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Create a generator reusing an existing HTTP client.
    pub fn with_client(http: Client, url: Url) -> Self {
        Self { http, url }
    }
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    keystore: Vec<&'a serde_json::Value>,
    keystore_password: &'a str,
    operator_keys: &'a [String],
    operator_ids: &'a [u64],
    owner_address: Address,
    nonce: u64,
}

impl<'a> From<&KeysharesRequest<'a>> for GenerateBody<'a> {
    fn from(request: &KeysharesRequest<'a>) -> Self {
        Self {
            keystore: request.keystores.iter().map(|k| &k.keystore).collect(),
            keystore_password: request.keystore_password,
            operator_keys: &request.operators.keys,
            operator_ids: &request.operators.ids,
            owner_address: request.owner,
            nonce: request.nonce,
        }
    }
}

#[async_trait]
impl KeysharesGenerator for HttpKeysharesGenerator {
    #[instrument(skip_all, fields(nonce = request.nonce, keystores = request.keystores.len()))]
    async fn generate(&self, request: KeysharesRequest<'_>) -> eyre::Result<KeysharesPayload> {
        let body = GenerateBody::from(&request);

        let response =
            self.http.post(self.url.clone()).json(&body).send().await?.error_for_status()?;
        let payload = KeysharesPayload::from_keyshares_json(&response.bytes().await?)?;

        debug!(validators = payload.len(), "Generated keyshares");

        Ok(payload)
    }
}
