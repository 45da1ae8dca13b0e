//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the relay's outbound port traits.

mod hmac_authenticator;
mod in_memory_bridge;
mod mirrored_state;

pub use hmac_authenticator::HmacAuthenticator;
pub use in_memory_bridge::InMemoryBridge;
pub use mirrored_state::MirroredState;
