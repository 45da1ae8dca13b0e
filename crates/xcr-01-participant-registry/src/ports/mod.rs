//! # Ports Module
//!
//! Inbound API of the Participant Registry.

pub mod inbound;

pub use inbound::*;
