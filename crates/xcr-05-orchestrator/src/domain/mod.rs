//! # Domain Layer

pub mod errors;
pub mod status;

pub use errors::*;
pub use status::*;
