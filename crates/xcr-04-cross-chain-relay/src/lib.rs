//! # XCR-04 Cross-Chain Relay Adapter
//!
//! Authenticated, ordered, replay-safe delivery of finalized proposals and
//! validator-set changes between the origin chain and its counterparty.
//!
//! **Component:** 4
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Guarantees
//!
//! - Nonces are strictly increasing and gap-free per (origin, destination)
//! - Every message carries an HMAC-SHA256 proof over its signing bytes
//! - Out-of-order arrivals wait in a bounded buffer until the gap fills
//! - A nonce is applied at most once
//!
//! ## Module Structure
//!
//! ```text
//! xcr-04-cross-chain-relay/
//! ├── domain/          # CrossChainMessage (wire codec), payload, config, errors
//! ├── ports/           # RelayApi, BridgeTransport, MessageAuthenticator, MirrorSink
//! ├── adapters/        # HmacAuthenticator, InMemoryBridge, MirroredState
//! └── relay.rs         # CrossChainRelay
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod relay;

// Re-exports
pub use adapters::{HmacAuthenticator, InMemoryBridge, MirroredState};
pub use domain::{
    AppliedMessage, ApplyOutcome, CrossChainMessage, RelayConfig, RelayError, RelayPayload,
    RelayResult, Resubmission, RetryPolicy, SendReceipt,
};
pub use ports::{
    BridgeTransport, DeliveryReceipt, MessageAuthenticator, MirrorSink, RelayApi, TransportError,
};
pub use relay::{CrossChainRelay, RelayState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
