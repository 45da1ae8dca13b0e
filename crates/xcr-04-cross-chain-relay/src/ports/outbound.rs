//! # Outbound Ports
//!
//! Traits for external dependencies (bridge, keys, mirrored state).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::ChainId;
use thiserror::Error;

use crate::domain::{CrossChainMessage, RelayPayload};

/// Bridge acknowledgment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Bridge-assigned id.
    pub id: String,
    /// Destination chain.
    pub destination: ChainId,
    /// Message nonce.
    pub nonce: u64,
}

/// Bridge submission failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Bridge unreachable or busy.
    #[error("Bridge unavailable: {0}")]
    Unavailable(String),
    /// Bridge refused the message.
    #[error("Bridge rejected message: {0}")]
    Rejected(String),
}

/// Bridge transport - outbound port.
///
/// At-least-once and unordered.
#[async_trait]
pub trait BridgeTransport: Send + Sync {
    /// Submit a message for delivery to `destination`.
    async fn submit(
        &self,
        destination: ChainId,
        message: &CrossChainMessage,
    ) -> Result<DeliveryReceipt, TransportError>;
}

/// Message authentication - outbound port.
pub trait MessageAuthenticator: Send + Sync {
    /// Proof over the message's signing bytes. `None` without a shared key.
    fn sign(&self, message: &CrossChainMessage) -> Option<Vec<u8>>;

    /// Check the message's proof.
    fn verify(&self, message: &CrossChainMessage) -> bool;
}

/// Destination-side state that applies verified payloads - outbound port.
pub trait MirrorSink {
    /// Apply a payload from `origin`.
    ///
    /// `Ok(true)` if state changed, `Ok(false)` if already present,
    /// `Err(reason)` if the payload cannot be applied.
    fn apply(&mut self, origin: ChainId, payload: RelayPayload) -> Result<bool, String>;
}
