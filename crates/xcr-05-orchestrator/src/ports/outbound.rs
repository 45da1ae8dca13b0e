//! # Outbound Ports
//!
//! The chain ledger the node persists its state to.

use thiserror::Error;

/// Per-chain ledger - outbound port.
///
/// Production: the host chain's contract storage.
/// Testing: `InMemoryLedger`; CLI: `FileLedger`.
pub trait Ledger {
    /// Read a value.
    fn read_state(&self, key: &[u8]) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Write a single value.
    fn write_state(&mut self, key: &[u8], value: &[u8]) -> Result<(), LedgerError> {
        self.write_batch(vec![BatchOperation::put(key, value)])
    }

    /// Execute an atomic batch write.
    ///
    /// Either ALL operations in the batch are applied, or NONE are.
    fn write_batch(&mut self, operations: Vec<BatchOperation>) -> Result<(), LedgerError>;
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put {
        /// Key
        key: Vec<u8>,
        /// Value
        value: Vec<u8>,
    },
    /// Delete a key.
    Delete {
        /// Key
        key: Vec<u8>,
    },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// Ledger errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Underlying I/O failed.
    #[error("Ledger I/O error: {0}")]
    Io(String),
    /// Stored data could not be decoded.
    #[error("Ledger data corrupt: {0}")]
    Corrupt(String),
}
