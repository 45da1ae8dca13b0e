//! # Shared Types Crate
//!
//! Types shared by every component of the cross-chain registry, on both the
//! origin (L2) and the settlement (L1) side.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: primitives, roles and phases are defined once.
//! - **Bit-Identical Hashing**: the commitment hash lives here so both chains
//!   verify reveals with exactly the same function.
//! - **One Error Taxonomy**: every component error maps onto [`ErrorKind`].

pub mod commitment;
pub mod entities;
pub mod errors;
pub mod security;

pub use commitment::{commitment_hash, generate_salt, keccak256, verify_commitment};
pub use entities::*;
pub use errors::*;
pub use security::*;
