//! # Domain Layer

pub mod config;
pub mod errors;
pub mod message;
pub mod payload;

pub use config::*;
pub use errors::*;
pub use message::*;
pub use payload::*;
