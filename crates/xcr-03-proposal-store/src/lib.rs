//! # XCR-03 Proposal Store
//!
//! Owns proposals on their origin chain and read-only mirrors of
//! proposals finalized on the counter-chain.
//!
//! **Component:** 3
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Lifecycle
//!
//! ```text
//! created → commit_open → commit_closed → reveal_open → reveal_closed   (miner round)
//!         → commit_open → commit_closed → reveal_open → reveal_closed   (validator round)
//!         → scored → propagated → finalized
//!
//! any non-terminal status ──→ rejected
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod ports;
pub mod store;

// Re-exports
pub use domain::{
    FinalizedProposal, PropagationState, Proposal, ProposalError, ProposalResult, ProposalStatus,
    ProposalStoreConfig,
};
pub use ports::ProposalStoreApi;
pub use store::ProposalStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
