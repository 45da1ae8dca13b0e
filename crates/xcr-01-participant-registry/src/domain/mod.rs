//! # Domain Module
//!
//! Core domain types for the Participant Registry.

pub mod entities;
pub mod errors;
pub mod events;

pub use entities::*;
pub use errors::*;
pub use events::*;
