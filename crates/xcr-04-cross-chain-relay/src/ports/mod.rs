//! # Ports Layer
//!
//! - `inbound`: API this relay provides
//! - `outbound`: bridge transport, authentication and mirror application

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
