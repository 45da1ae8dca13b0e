//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implementations of the eligibility oracle port.

mod registry_oracle;

pub use registry_oracle::AlwaysEligible;
