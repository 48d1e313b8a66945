use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use eyre::{eyre, WrapErr};

use super::OperatorInfo;

/// An operator registry read once from the filesystem.
#[derive(Debug, Clone)]
pub struct FilesystemRegistry {
    /// The path to the file containing the operator information.
    pub path: PathBuf,
    /// The list of operators loaded from the file.
    pub operators: Vec<OperatorInfo>,
}

impl FilesystemRegistry {
    /// Create a new `FilesystemRegistry` that reads from the given path.
    ///
    /// The file should be a CSV with the following columns:
    /// `id, public_key`
    ///
    /// Blank lines and lines starting with `#` are ignored.
    pub fn read_from_file(path: PathBuf) -> eyre::Result<Self> {
        let file = BufReader::new(
            File::open(&path).wrap_err_with(|| format!("opening {}", path.display()))?,
        );

        let mut operators = Vec::new();
        for (lineno, line) in file.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, public_key) = line
                .split_once(',')
                .ok_or_else(|| eyre!("line {}: expected `id,public_key`", lineno + 1))?;

            let id = id.trim().parse::<u64>().wrap_err_with(|| format!("line {}", lineno + 1))?;
            let public_key = public_key.trim().to_owned();
            if public_key.is_empty() {
                return Err(eyre!("line {}: empty operator public key", lineno + 1));
            }

            operators.push(OperatorInfo { id, public_key });
        }

        Ok(Self { path, operators })
    }
}
