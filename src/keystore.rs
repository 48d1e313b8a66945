use std::path::Path;

use tracing::{debug, info};

use crate::common::{KeystoreRecord, LoadError};

/// File name prefix of validator keystores produced by the staking deposit CLI.
pub const KEYSTORE_PREFIX: &str = "keystore-m";

/// File name suffix of validator keystores.
pub const KEYSTORE_SUFFIX: &str = ".json";

/// Returns true if the file name looks like a validator keystore (`keystore-m*.json`).
pub fn is_keystore_file(name: &str) -> bool {
    name.starts_with(KEYSTORE_PREFIX) && name.ends_with(KEYSTORE_SUFFIX)
}

/// Load every `keystore-m*.json` file in the given directory.
///
/// Matching file names are sorted lexicographically, so that chunk composition and the
/// nonce bound to each keystore do not depend on the filesystem listing order. Any
/// unreadable or malformed keystore aborts the whole load.
pub async fn load_keystores(directory: impl AsRef<Path>) -> Result<Vec<KeystoreRecord>, LoadError> {
    let directory = directory.as_ref();
    let read_dir_err = |source| LoadError::ReadDir { path: directory.to_path_buf(), source };

    let mut entries = tokio::fs::read_dir(directory).await.map_err(read_dir_err)?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_dir_err)? {
        // non UTF-8 names can never match the keystore pattern
        let Ok(name) = entry.file_name().into_string() else { continue };

        if is_keystore_file(&name) {
            names.push(name);
        }
    }
    names.sort();

    let mut keystores = Vec::with_capacity(names.len());
    for name in names {
        let path = directory.join(&name);

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| LoadError::ReadFile { path: path.clone(), source })?;
        let keystore = serde_json::from_str(&content)
            .map_err(|source| LoadError::Parse { path: path.clone(), source })?;

        let record = KeystoreRecord::new(name, keystore);
        debug!(name = %record.name, pubkey = ?record.pubkey(), "Loaded keystore");
        keystores.push(record);
    }

    info!(count = keystores.len(), directory = %directory.display(), "Loaded keystores");

    Ok(keystores)
}
