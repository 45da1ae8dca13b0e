//! # XCR-01 Participant Registry
//!
//! Tracks staked miners and validators and their eligibility.
//!
//! **Component:** 1 (leaf)
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Register the governed protocols proposals may target
//! - Register participants under a role with a minimum stake
//! - Schedule exits behind a cooldown window
//! - Answer eligibility queries as of a given timestamp
//! - Emit events that the relay mirrors to the counter-chain
//!
//! ## Module Structure
//!
//! ```text
//! xcr-01-participant-registry/
//! ├── domain/          # Participant, status, events, errors
//! ├── ports/           # ParticipantRegistryApi
//! └── registry.rs      # ParticipantRegistry (implements the port)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod ports;
pub mod registry;

// Re-exports
pub use domain::{
    Participant, ParticipantStatus, Protocol, RegistryConfig, RegistryError, RegistryEvent,
    RegistryResult, ValidatorSetChange,
};
pub use ports::ParticipantRegistryApi;
pub use registry::ParticipantRegistry;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
