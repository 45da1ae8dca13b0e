//! In-memory ledger for testing.

use std::collections::HashMap;

use crate::ports::{BatchOperation, Ledger, LedgerError};

/// In-memory ledger.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    data: HashMap<Vec<u8>, Vec<u8>>,
    batches: usize,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches written.
    pub fn batch_count(&self) -> usize {
        self.batches
    }
}

impl Ledger for InMemoryLedger {
    fn read_state(&self, key: &[u8]) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.data.get(key).cloned())
    }

    fn write_batch(&mut self, operations: Vec<BatchOperation>) -> Result<(), LedgerError> {
        // For in-memory, we can just apply all operations
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    self.data.remove(&key);
                }
            }
        }
        self.batches += 1;
        Ok(())
    }
}
