use std::path::{Path, PathBuf};

use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use tracing::{debug, error};

/// Prefix of every line written to the failure log.
pub const FAILURE_PREFIX: &str = "Failed to do register: ";

/// Default location of the failure log.
pub const DEFAULT_ERROR_LOG: &str = "./error-log.txt";

/// Appends chunk registration failures to a local log file for later audit.
///
/// Writing to the log is best effort: if the append fails, the error is only reported
/// through `tracing` and never returned to the caller.
#[derive(Debug, Clone)]
pub struct FailureRecorder {
    path: PathBuf,
}

impl Default for FailureRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_LOG)
    }
}

impl FailureRecorder {
    /// Create a recorder appending to the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the failure log.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a failure and return its message.
    pub async fn record(&self, err: &eyre::Report) -> String {
        let message = failure_message(err);
        let line = format!("{FAILURE_PREFIX}{message}\n");

        error!("{}", line.trim_end());
        self.append(&line).await;

        message
    }

    async fn append(&self, line: &str) {
        let res = async {
            let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        }
        .await;

        match res {
            Ok(()) => debug!(path = %self.path.display(), "Error saved to file"),
            Err(err) => {
                error!(?err, path = %self.path.display(), "Failed to write to failure log")
            }
        }
    }
}

/// Render an error and its causes on a single line.
pub fn failure_message(err: &eyre::Report) -> String {
    format!("{err:#}").replace('\n', " ")
}
