//! JSON file ledger.
//!
//! Keys and values are hex-encoded into one JSON object. Every batch
//! rewrites a temporary file and renames it over the ledger.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::ports::{BatchOperation, Ledger, LedgerError};

/// File-backed ledger.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileLedger {
    /// Open `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| LedgerError::Io(e.to_string()))?;
            serde_json::from_str(&raw).map_err(|e| LedgerError::Corrupt(e.to_string()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    /// Ledger file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Ledger for FileLedger {
    fn read_state(&self, key: &[u8]) -> Result<Option<Vec<u8>>, LedgerError> {
        self.entries
            .get(&hex::encode(key))
            .map(|value| hex::decode(value).map_err(|e| LedgerError::Corrupt(e.to_string())))
            .transpose()
    }

    fn write_batch(&mut self, operations: Vec<BatchOperation>) -> Result<(), LedgerError> {
        let mut next = self.entries.clone();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    next.insert(hex::encode(key), hex::encode(value));
                }
                BatchOperation::Delete { key } => {
                    next.remove(&hex::encode(key));
                }
            }
        }

        let json =
            serde_json::to_string_pretty(&next).map_err(|e| LedgerError::Corrupt(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| LedgerError::Io(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| LedgerError::Io(e.to_string()))?;

        debug!("[xcr-05] Wrote {} ledger entries to {:?}", next.len(), self.path);
        self.entries = next;
        Ok(())
    }
}
