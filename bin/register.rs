use std::{num::NonZeroUsize, path::PathBuf};

use alloy::{
    network::EthereumWallet,
    primitives::{utils::parse_ether, Address, U256},
    providers::ProviderBuilder,
    signers::local::PrivateKeySigner,
};
use clap::Parser;
use eyre::{bail, eyre};
use tracing::{info, warn};
use url::Url;

use ssv_registrar::{
    api::DEFAULT_SSV_API_URL, failure::DEFAULT_ERROR_LOG, ApiRegistry, Chain, FailureRecorder,
    FilesystemRegistry, HttpKeysharesGenerator, OperatorRegistry, Operators, Registrar,
    RegistrarConfig, SsvApi, SsvClient,
};

/// Register a directory of validator keystores as SSV validators.
#[derive(Debug, Parser)]
struct CliOpts {
    /// Directory containing the `keystore-m*.json` files.
    #[clap(long, env = "KEYSTORE_FILE_DIRECTORY")]
    pub keystore_dir: PathBuf,
    /// Account that will own the validators.
    #[clap(long, env = "OWNER_ADDRESS")]
    pub owner_address: Address,
    /// Passphrase of the keystores.
    #[clap(long, env = "KEYSTORE_PASSWORD", hide_env_values = true)]
    pub keystore_password: String,
    /// Private key of the account sending the transactions.
    #[clap(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,
    #[clap(long, env = "SSV_NETWORK", value_enum, default_value_t = Chain::Holesky)]
    pub network: Chain,
    #[clap(long, env = "EXECUTION_CLIENT_URL")]
    pub execution_client_url: Option<Url>,
    #[clap(long, env = "SSV_API_URL", default_value = DEFAULT_SSV_API_URL)]
    pub ssv_api_url: Url,
    #[clap(long, env = "KEYSHARES_SERVICE_URL", default_value = "http://localhost:3000/keyshares")]
    pub keyshares_service_url: Url,
    /// CSV file of `id,public_key` operator lines.
    #[clap(long, env = "OPERATORS_PATH", conflicts_with = "operator_ids")]
    pub operators_path: Option<PathBuf>,
    /// Operator IDs to look up on the SSV API.
    #[clap(long, env = "OPERATOR_IDS", value_delimiter = ',', conflicts_with = "operators_path")]
    pub operator_ids: Vec<u64>,
    /// Number of validators per registration transaction.
    #[clap(long, env = "CHUNK_SIZE", default_value = "40")]
    pub chunk_size: NonZeroUsize,
    /// SSV deposited with each registration transaction.
    #[clap(long, env = "DEPOSIT_AMOUNT", default_value = "30", value_parser = parse_ssv)]
    pub deposit_amount: U256,
    /// SSV allowance approved for the SSVNetwork contract.
    #[clap(long, env = "APPROVE_AMOUNT", default_value = "10000", value_parser = parse_ssv)]
    pub approve_amount: U256,
    #[clap(long, env = "ERROR_LOG_PATH", default_value = DEFAULT_ERROR_LOG)]
    pub error_log: PathBuf,
    #[clap(long, env = "SSV_NETWORK_ADDRESS")]
    pub network_address: Option<Address>,
    #[clap(long, env = "SSV_TOKEN_ADDRESS")]
    pub token_address: Option<Address>,
}

fn parse_ssv(amount: &str) -> Result<U256, String> {
    parse_ether(amount).map_err(|e| e.to_string())
}

/// Validates the signing key, then resolves the operator set. Configuration errors are
/// reported before the operator registry is queried.
async fn setup(opts: &CliOpts, api: &SsvApi) -> eyre::Result<(PrivateKeySigner, Operators)> {
    let signer: PrivateKeySigner = opts
        .private_key
        .as_deref()
        .ok_or(eyre!("Missing private key, required to sign transactions"))?
        .parse()?;

    let registry: Box<dyn OperatorRegistry> = if let Some(path) = opts.operators_path.clone() {
        Box::new(FilesystemRegistry::read_from_file(path)?)
    } else if !opts.operator_ids.is_empty() {
        Box::new(ApiRegistry::new(api.clone(), opts.operator_ids.clone()))
    } else {
        bail!("Either 'operators_path' or 'operator_ids' must be provided as a CLI argument");
    };

    let operators = Operators::from_infos(registry.operators().await?)?;
    info!(keys = ?operators.keys, ids = ?operators.ids, "Loaded operators");

    Ok((signer, operators))
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let _ = dotenvy::dotenv();
    let _ = tracing_subscriber::fmt::try_init();
    let opts = CliOpts::parse();

    let api = SsvApi::new(opts.ssv_api_url.clone(), opts.network);
    let (signer, operators) = setup(&opts, &api).await?;
    info!(signer = %signer.address(), network = %opts.network, "Using signing account");

    let rpc_url = match opts.execution_client_url.clone() {
        Some(url) => url,
        None => Url::parse(opts.network.default_rpc_url())?,
    };
    let provider = ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(EthereumWallet::from(signer))
        .on_http(rpc_url);

    let network = SsvClient::with_addresses(
        provider,
        opts.network_address.unwrap_or(opts.network.network_address()),
        opts.token_address.unwrap_or(opts.network.token_address()),
        opts.owner_address,
        api,
    );

    let config = RegistrarConfig {
        owner: opts.owner_address,
        keystore_password: opts.keystore_password.clone(),
        operators,
        chunk_size: opts.chunk_size,
        deposit_amount: opts.deposit_amount,
        approve_amount: opts.approve_amount,
    };

    let registrar = Registrar::new(
        HttpKeysharesGenerator::new(opts.keyshares_service_url.clone()),
        network,
        FailureRecorder::new(opts.error_log.clone()),
        config,
    );

    let report = registrar.run(&opts.keystore_dir).await?;

    for chunk in report.failed() {
        warn!(chunk = chunk.index + 1, range = ?chunk.range, nonce = chunk.nonce, "Chunk failed");
    }
    info!(
        registered = report.registered_validators(),
        failed_chunks = report.failed().count(),
        final_nonce = report.final_nonce,
        "Done"
    );

    Ok(())
}
