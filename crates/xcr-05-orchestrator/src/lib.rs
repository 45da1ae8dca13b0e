//! # XCR-05 Registry Orchestrator
//!
//! Drives one chain's registry flow: registration, proposal creation, the
//! miner and validator commit-reveal rounds, finalization, propagation and
//! ingestion of counter-chain messages.
//!
//! **Component:** 5 (root)
//!
//! ## Flow
//!
//! ```text
//! register_protocol → register → create_proposal → commit → reveal → score_commit → score_reveal
//!          → finalize → propagate ──bridge──→ receive (counter-chain)
//! ```
//!
//! Every step is idempotent: repeating an applied step returns
//! [`StepOutcome::AlreadyApplied`]. A step whose predecessor has not
//! completed fails with `PrecedingStepIncomplete`. The node snapshot is
//! written to the [`Ledger`] in one atomic batch after every mutating step.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod node;
pub mod ports;

// Re-exports
pub use adapters::{FileLedger, InMemoryLedger};
pub use config::{ConfigError, NodeConfig};
pub use domain::{NodeStatus, OrchestratorError, OrchestratorResult, ProposalSummary, StepOutcome};
pub use node::ChainNode;
pub use ports::{BatchOperation, Ledger, LedgerError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
