//! # Ports Layer
//!
//! - `inbound`: API this engine provides
//! - `outbound`: live eligibility lookups it depends on

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
