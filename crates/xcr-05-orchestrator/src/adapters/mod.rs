//! # Adapters Layer (Hexagonal Architecture)
//!
//! Ledger implementations.

mod file;
mod memory;

pub use file::FileLedger;
pub use memory::InMemoryLedger;
