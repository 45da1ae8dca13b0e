//! # XCR-02 Commit-Reveal Engine
//!
//! Two-phase commit-reveal rounds over proposals.
//!
//! **Component:** 2
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Bind participants to a value before anyone discloses it
//! - Verify reveals against the stored commitment hash
//! - Close windows on deadline or quorum, whichever comes first
//! - Aggregate revealed values order-independently
//!
//! ## Rounds
//!
//! ```text
//! miner:      miner_commit ──→ miner_reveal ──→ closed (content resolved)
//! validator:  validator_score_commit ──→ validator_score_reveal ──→ closed (score)
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! xcr-02-commit-reveal/
//! ├── domain/          # Commitment, Reveal, RoundState, ScoreAggregate
//! ├── ports/           # CommitRevealApi, EligibilityOracle
//! ├── adapters/        # Registry-backed oracle
//! └── engine.rs        # CommitRevealEngine
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod engine;
pub mod ports;

// Re-exports
pub use adapters::AlwaysEligible;
pub use domain::{
    AggregationPolicy, CommitRevealConfig, CommitRevealError, CommitRevealResult, Commitment,
    NonRevealPolicy, Reveal, RoundOutcome, RoundPhase, RoundState, ScoreAggregate,
};
pub use engine::CommitRevealEngine;
pub use ports::{CommitRevealApi, EligibilityOracle};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
