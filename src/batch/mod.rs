use std::{fmt, num::NonZeroUsize, path::Path};

use alloy::primitives::{Address, U256};
use tracing::{error, info, instrument, warn};

mod nonce;
pub use nonce::NonceTracker;

mod planner;
pub use planner::{chunk_count, plan_chunks, Chunk, DEFAULT_CHUNK_SIZE};

use crate::{
    common::{ChunkOutcome, ChunkReport, KeystoreRecord, RegistrarError, RunReport, TxReceipt},
    failure::FailureRecorder,
    keyshares::{KeysharesGenerator, KeysharesPayload, KeysharesRequest},
    keystore::load_keystores,
    network::SsvNetwork,
    registry::Operators,
};

/// Settings of a registration run.
#[derive(Clone)]
pub struct RegistrarConfig {
    /// The account that owns the registered validators.
    pub owner: Address,
    /// Passphrase shared by all keystores.
    pub keystore_password: String,
    /// The cluster operators.
    pub operators: Operators,
    /// Maximum number of validators per registration transaction.
    pub chunk_size: NonZeroUsize,
    /// SSV deposited into the cluster with every registration transaction.
    pub deposit_amount: U256,
    /// SSV allowance granted to the SSVNetwork contract before registering.
    pub approve_amount: U256,
}

impl fmt::Debug for RegistrarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrarConfig")
            .field("owner", &self.owner)
            .field("keystore_password", &"<redacted>")
            .field("operators", &self.operators.ids)
            .field("chunk_size", &self.chunk_size)
            .field("deposit_amount", &self.deposit_amount)
            .field("approve_amount", &self.approve_amount)
            .finish()
    }
}

/// Registers a directory of validator keystores in chunks, one transaction per chunk.
///
/// Every chunk's keyshares are bound to the owner nonce reached after the previous chunk.
/// The nonce advances by the chunk size as soon as the chunk's keyshares were requested,
/// regardless of whether generation or registration succeeds. A failing chunk is recorded
/// and never stops the remaining chunks from being attempted.
#[derive(Debug)]
pub struct Registrar<G, N> {
    generator: G,
    network: N,
    recorder: FailureRecorder,
    config: RegistrarConfig,
}

impl<G, N> Registrar<G, N>
where
    G: KeysharesGenerator + Send + Sync,
    N: SsvNetwork + Send + Sync,
{
    /// Creates a new registrar.
    pub fn new(
        generator: G,
        network: N,
        recorder: FailureRecorder,
        config: RegistrarConfig,
    ) -> Self {
        Self { generator, network, recorder, config }
    }

    /// The run configuration.
    pub fn config(&self) -> &RegistrarConfig {
        &self.config
    }

    /// Load the keystores in `directory`, approve the SSV allowance, fetch the owner
    /// nonce and register every keystore.
    ///
    /// Failing to load keystores, approve or fetch the nonce aborts the run. Chunk
    /// failures do not: they are reported in the returned [`RunReport`].
    pub async fn run(&self, directory: impl AsRef<Path>) -> Result<RunReport, RegistrarError> {
        let keystores = load_keystores(directory).await.inspect_err(|err| {
            error!(%err, "Failed to load keystores");
        })?;

        let approval = self
            .network
            .approve(self.config.approve_amount)
            .await
            .map_err(RegistrarError::Approval)?;
        info!(receipt = %approval, amount = %self.config.approve_amount, "Approved SSV allowance");

        let nonce =
            self.network.owner_nonce(self.config.owner).await.map_err(RegistrarError::Nonce)?;
        info!(nonce, owner = %self.config.owner, "Initial nonce");

        Ok(self.register_all(&keystores, NonceTracker::new(nonce)).await)
    }

    /// Register `keystores` chunk by chunk, starting from `nonce`.
    pub async fn register_all(
        &self,
        keystores: &[KeystoreRecord],
        mut nonce: NonceTracker,
    ) -> RunReport {
        let initial_nonce = nonce.current();
        let total = chunk_count(keystores.len(), self.config.chunk_size);
        let mut chunks = Vec::with_capacity(total);

        for chunk in plan_chunks(keystores, self.config.chunk_size) {
            let bound_nonce = nonce.current();
            let range = chunk.range();
            info!(
                chunk = chunk.index + 1,
                total,
                from = range.start,
                to = range.end - 1,
                nonce = bound_nonce,
                "Processing chunk"
            );

            let generated = self.generate(chunk, bound_nonce).await;

            let next = nonce.advance(chunk.len());
            info!(nonce = next, "New nonce");

            let outcome = match self.submit(generated).await {
                Ok(receipt) => {
                    info!(chunk = chunk.index + 1, %receipt, "Registered validators");
                    ChunkOutcome::Registered(receipt)
                }
                Err(err) => {
                    let reason = self.recorder.record(&err).await;
                    ChunkOutcome::Failed { reason }
                }
            };

            chunks.push(ChunkReport { index: chunk.index, range, nonce: bound_nonce, outcome });
        }

        let report = RunReport { initial_nonce, final_nonce: nonce.current(), chunks };

        let failed = report.failed().count();
        if failed > 0 {
            warn!(
                failed,
                registered = report.registered().count(),
                log = %self.recorder.path().display(),
                "Some chunks failed to register"
            );
        } else {
            info!(
                chunks = report.chunks.len(),
                validators = report.registered_validators(),
                "All chunks registered"
            );
        }

        report
    }

    async fn generate(
        &self,
        chunk: Chunk<'_, KeystoreRecord>,
        nonce: u64,
    ) -> eyre::Result<KeysharesPayload> {
        let request = KeysharesRequest {
            keystores: chunk.items,
            keystore_password: &self.config.keystore_password,
            operators: &self.config.operators,
            owner: self.config.owner,
            nonce,
        };

        self.generator.generate(request).await
    }

    #[instrument(skip_all)]
    async fn submit(&self, generated: eyre::Result<KeysharesPayload>) -> eyre::Result<TxReceipt> {
        let payload = generated?;
        self.generator.validate(&payload)?;

        self.network.register_validators(&payload, self.config.deposit_amount).await
    }
}
