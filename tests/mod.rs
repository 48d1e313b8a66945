use alloy::primitives::B256;
use tracing::info;

use utils::{payload_indices, registrar, write_keystores, MockGenerator, MockNetwork};

use ssv_registrar::{
    keyshares::KeysharesRequest, ChunkOutcome, FailureRecorder, KeysharesGenerator,
    KeysharesPayload, KeystoreRecord, NonceTracker, Registrar, RegistrarError, TxReceipt,
};

fn keystores(count: usize) -> Vec<KeystoreRecord> {
    (0..count)
        .map(|i| {
            KeystoreRecord::new(format!("keystore-m{i}.json"), serde_json::json!({ "index": i }))
        })
        .collect()
}

#[tokio::test]
async fn test_register_85_keystores_with_failing_chunk() -> eyre::Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    let dir = tempfile::tempdir()?;
    let keys_dir = dir.path().join("validator_keys");
    std::fs::create_dir(&keys_dir)?;
    write_keystores(&keys_dir, 85)?;
    std::fs::write(keys_dir.join("deposit_data-1700000000.json"), "[]")?;
    let error_log = dir.path().join("error-log.txt");

    let generator = MockGenerator::default();
    let network = MockNetwork::with_nonce(7).failing_registration(1, "insufficient funds");
    let registrar = registrar(generator.clone(), network.clone(), &error_log, 40);

    let report = registrar.run(&keys_dir).await?;
    info!(?report, "Finished run");

    assert_eq!(network.approvals(), 1);
    assert_eq!(generator.nonces(), vec![7, 47, 87]);

    let sizes: Vec<_> = report.chunks.iter().map(|c| c.range.len()).collect();
    assert_eq!(sizes, vec![40, 40, 5]);
    let nonces: Vec<_> = report.chunks.iter().map(|c| c.nonce).collect();
    assert_eq!(nonces, vec![7, 47, 87]);

    assert!(report.chunks[0].outcome.is_registered());
    assert_eq!(
        report.chunks[1].outcome,
        ChunkOutcome::Failed { reason: "insufficient funds".into() }
    );
    // the chunk after the failing one is still attempted, with the advanced nonce
    assert_eq!(
        report.chunks[2].outcome,
        ChunkOutcome::Registered(TxReceipt {
            tx_hash: B256::with_last_byte(3),
            block_number: Some(102)
        })
    );
    assert_eq!(report.initial_nonce, 7);
    assert_eq!(report.final_nonce, 92);
    assert_eq!(report.registered_validators(), 45);

    // every keystore was submitted exactly once, in file name order
    let registrations = network.registrations();
    assert_eq!(registrations.len(), 3);
    let submitted: Vec<u64> = registrations.iter().flat_map(payload_indices).collect();
    assert_eq!(submitted, (0..85).collect::<Vec<u64>>());

    let log = std::fs::read_to_string(&error_log)?;
    assert_eq!(log, "Failed to do register: insufficient funds\n");

    Ok(())
}

#[tokio::test]
async fn test_nonce_binding_ignores_outcomes() -> eyre::Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    let dir = tempfile::tempdir()?;
    let error_log = dir.path().join("error-log.txt");

    let cases = [(10usize, 3usize, 0u64), (7, 7, 100), (23, 4, 5), (1, 40, 9)];
    for (total, chunk_size, initial) in cases {
        let chunks = total.div_ceil(chunk_size);
        let mut network = MockNetwork::default();
        // fail every other chunk
        for call in (0..chunks).step_by(2) {
            network = network.failing_registration(call, "execution reverted");
        }
        let generator = MockGenerator::default();
        let registrar = registrar(generator.clone(), network, &error_log, chunk_size);

        let report = registrar.register_all(&keystores(total), NonceTracker::new(initial)).await;

        assert_eq!(report.chunks.len(), chunks);
        let mut expected = initial;
        for (i, chunk) in report.chunks.iter().enumerate() {
            assert_eq!(chunk.nonce, expected, "chunk {i} of {total}/{chunk_size}");
            assert_eq!(chunk.outcome.is_registered(), i % 2 == 1);
            expected += chunk.range.len() as u64;
        }
        assert_eq!(report.final_nonce, initial + total as u64);
        assert_eq!(generator.calls().iter().map(|c| c.indices.len()).sum::<usize>(), total);
    }

    Ok(())
}

#[tokio::test]
async fn test_generation_failure_is_isolated() -> eyre::Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    let dir = tempfile::tempdir()?;
    let error_log = dir.path().join("error-log.txt");

    let generator = MockGenerator::failing_at(47, "invalid keystore password");
    let network = MockNetwork::default();
    let registrar = registrar(generator.clone(), network.clone(), &error_log, 40);

    let report = registrar.register_all(&keystores(85), NonceTracker::new(7)).await;

    // generation was attempted for every chunk, nonce advanced past the failed one
    assert_eq!(generator.nonces(), vec![7, 47, 87]);
    assert_eq!(report.final_nonce, 92);

    // nothing was submitted for the chunk whose generation failed
    let registrations = network.registrations();
    assert_eq!(registrations.len(), 2);
    assert_eq!(payload_indices(&registrations[1]), (80..85).collect::<Vec<u64>>());

    assert_eq!(report.failed().map(|c| c.index).collect::<Vec<_>>(), vec![1]);
    assert_eq!(
        std::fs::read_to_string(&error_log)?,
        "Failed to do register: invalid keystore password\n"
    );

    Ok(())
}

#[tokio::test]
async fn test_approval_failure_is_fatal() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    write_keystores(dir.path(), 3)?;

    let generator = MockGenerator::default();
    let network = MockNetwork::default().failing_approval();
    let registrar = registrar(generator.clone(), network.clone(), &dir.path().join("log"), 40);

    let err = registrar.run(dir.path()).await.unwrap_err();
    assert!(matches!(err, RegistrarError::Approval(_)));
    assert!(err.to_string().contains("insufficient balance"));

    assert!(generator.calls().is_empty());
    assert!(network.registrations().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_load_failure_is_fatal() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    write_keystores(dir.path(), 3)?;
    std::fs::write(dir.path().join("keystore-m_broken.json"), "{")?;

    let generator = MockGenerator::default();
    let network = MockNetwork::default();
    let registrar = registrar(generator.clone(), network.clone(), &dir.path().join("log"), 40);

    let err = registrar.run(dir.path()).await.unwrap_err();
    assert!(matches!(err, RegistrarError::Load(_)));

    // nothing happens on-chain if the keystores cannot be loaded
    assert_eq!(network.approvals(), 0);
    assert!(generator.calls().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_empty_directory_registers_nothing() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;

    let generator = MockGenerator::default();
    let network = MockNetwork::with_nonce(3);
    let registrar = registrar(generator.clone(), network.clone(), &dir.path().join("log"), 40);

    let report = registrar.run(dir.path()).await?;

    assert!(report.chunks.is_empty());
    assert_eq!(report.initial_nonce, 3);
    assert_eq!(report.final_nonce, 3);
    assert!(generator.calls().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_unwritable_error_log_does_not_abort() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;

    let network = MockNetwork::default()
        .failing_registration(0, "nonce too low")
        .failing_registration(1, "replacement transaction underpriced");
    // the error log path is a directory, so recording fails
    let registrar = registrar(MockGenerator::default(), network.clone(), dir.path(), 2);

    let report = registrar.register_all(&keystores(5), NonceTracker::new(0)).await;

    assert_eq!(network.registrations().len(), 3);
    assert_eq!(report.failed().count(), 2);
    assert!(report.chunks[2].outcome.is_registered());

    Ok(())
}

/// A generator rejecting every payload it produced.
#[derive(Debug, Clone, Default)]
struct RejectingGenerator(MockGenerator);

#[async_trait::async_trait]
impl KeysharesGenerator for RejectingGenerator {
    async fn generate(&self, request: KeysharesRequest<'_>) -> eyre::Result<KeysharesPayload> {
        self.0.generate(request).await
    }

    fn validate(&self, payload: &KeysharesPayload) -> eyre::Result<()> {
        eyre::bail!("refusing {} shares", payload.len())
    }
}

#[tokio::test]
async fn test_validation_hook_runs_before_submission() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    let error_log = dir.path().join("error-log.txt");

    let network = MockNetwork::default();
    let registrar = Registrar::new(
        RejectingGenerator::default(),
        network.clone(),
        FailureRecorder::new(&error_log),
        utils::test_config(4),
    );

    let report = registrar.register_all(&keystores(6), NonceTracker::new(0)).await;

    assert!(network.registrations().is_empty());
    assert_eq!(report.final_nonce, 6);
    assert_eq!(
        std::fs::read_to_string(&error_log)?,
        "Failed to do register: refusing 4 shares\nFailed to do register: refusing 2 shares\n"
    );

    Ok(())
}
