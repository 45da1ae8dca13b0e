//! # Domain Layer
//!
//! Pure commit-reveal logic with no I/O.

pub mod aggregate;
pub mod config;
pub mod entities;
pub mod errors;
pub mod invariants;

pub use aggregate::*;
pub use config::*;
pub use entities::*;
pub use errors::*;
pub use invariants::*;
