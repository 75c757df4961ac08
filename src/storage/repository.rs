use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Context;

use crate::domain::{Account, LedgerError, validate_accounts};

/// Flat-file store for the full account set.
///
/// The file is a JSON array of account records, ordered by id. Every save
/// rewrites the whole file; there is no journal and no partial-write protection.
pub struct Repository {
    path: PathBuf,
}

impl Repository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read every account from the file.
    /// Returns `None` when the file does not exist yet.
    pub fn load(&self) -> Result<Option<Vec<Account>>, LedgerError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to read ledger file {}", self.path.display()))
                    .into());
            }
        };

        let accounts: Vec<Account> =
            serde_json::from_str(&contents).map_err(|e| self.corrupt(e.to_string()))?;
        validate_accounts(&accounts).map_err(|reason| self.corrupt(reason))?;

        Ok(Some(accounts))
    }

    /// Overwrite the file with `accounts`.
    pub fn save(&self, accounts: &[Account]) -> Result<(), LedgerError> {
        let json =
            serde_json::to_string_pretty(accounts).context("Failed to serialize accounts")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write ledger file {}", self.path.display()))?;
        Ok(())
    }

    fn corrupt(&self, reason: String) -> LedgerError {
        LedgerError::CorruptState {
            path: self.path.clone(),
            reason,
        }
    }
}
