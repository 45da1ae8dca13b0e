//! In-Memory Bridge Adapter
//!
//! Implements `BridgeTransport` by queueing messages per destination.
//! Failures and latency can be injected for testing.

use async_trait::async_trait;
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use rand::Rng;
use shared_types::ChainId;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::domain::CrossChainMessage;
use crate::ports::{BridgeTransport, DeliveryReceipt, TransportError};

/// In-memory bridge.
#[derive(Debug, Default)]
pub struct InMemoryBridge {
    /// Delivered messages per destination.
    queues: RwLock<HashMap<ChainId, Vec<CrossChainMessage>>>,
    /// Submissions to fail before accepting again.
    failures_remaining: RwLock<u32>,
    /// Nonces refused until unblocked.
    blocked: RwLock<HashSet<u64>>,
    /// Latency applied to every submission.
    delay: RwLock<Duration>,
    /// Submission attempts seen.
    attempts: RwLock<u64>,
}

impl InMemoryBridge {
    /// Create an empty bridge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` submissions.
    pub fn fail_next(&self, count: u32) {
        *self.failures_remaining.write() = count;
    }

    /// Refuse every submission of `nonce`.
    pub fn block_nonce(&self, nonce: u64) {
        self.blocked.write().insert(nonce);
    }

    /// Accept `nonce` again.
    pub fn unblock_nonce(&self, nonce: u64) {
        self.blocked.write().remove(&nonce);
    }

    /// Delay every submission.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.write() = delay;
    }

    /// Submission attempts seen so far.
    pub fn attempts(&self) -> u64 {
        *self.attempts.read()
    }

    /// Messages waiting for `destination`.
    pub fn pending(&self, destination: ChainId) -> usize {
        self.queues
            .read()
            .get(&destination)
            .map_or(0, |queue| queue.len())
    }

    /// Take everything queued for `destination` in submission order.
    pub fn take_delivered(&self, destination: ChainId) -> Vec<CrossChainMessage> {
        self.queues
            .write()
            .remove(&destination)
            .unwrap_or_default()
    }

    /// Take everything queued for `destination` in random order.
    pub fn take_shuffled<R: Rng>(&self, destination: ChainId, rng: &mut R) -> Vec<CrossChainMessage> {
        let mut messages = self.take_delivered(destination);
        messages.shuffle(rng);
        messages
    }

    /// Queue a message directly, bypassing submission.
    pub fn inject(&self, message: CrossChainMessage) {
        self.queues
            .write()
            .entry(message.destination)
            .or_default()
            .push(message);
    }
}

#[async_trait]
impl BridgeTransport for InMemoryBridge {
    async fn submit(
        &self,
        destination: ChainId,
        message: &CrossChainMessage,
    ) -> Result<DeliveryReceipt, TransportError> {
        *self.attempts.write() += 1;

        let delay = *self.delay.read();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.blocked.read().contains(&message.nonce) {
            return Err(TransportError::Unavailable(format!(
                "nonce {} blocked",
                message.nonce
            )));
        }
        {
            let mut failures = self.failures_remaining.write();
            if *failures > 0 {
                *failures -= 1;
                return Err(TransportError::Unavailable("injected failure".to_string()));
            }
        }

        debug!(
            "[xcr-04] Bridge queued nonce {} for {}",
            message.nonce, destination
        );
        self.queues
            .write()
            .entry(destination)
            .or_default()
            .push(message.clone());

        Ok(DeliveryReceipt {
            id: Uuid::new_v4().to_string(),
            destination,
            nonce: message.nonce,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(nonce: u64) -> CrossChainMessage {
        CrossChainMessage {
            origin: ChainId::new(10),
            destination: ChainId::new(1),
            nonce,
            proposal_id: [0u8; 32],
            payload: Vec::new(),
            proof: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_submit_queues_message() {
        let bridge = InMemoryBridge::new();
        let receipt = bridge.submit(ChainId::new(1), &message(1)).await.unwrap();
        assert_eq!(receipt.nonce, 1);
        assert_eq!(bridge.pending(ChainId::new(1)), 1);
        assert_eq!(bridge.take_delivered(ChainId::new(1)).len(), 1);
        assert_eq!(bridge.pending(ChainId::new(1)), 0);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let bridge = InMemoryBridge::new();
        bridge.fail_next(2);
        assert!(bridge.submit(ChainId::new(1), &message(1)).await.is_err());
        assert!(bridge.submit(ChainId::new(1), &message(1)).await.is_err());
        assert!(bridge.submit(ChainId::new(1), &message(1)).await.is_ok());
        assert_eq!(bridge.attempts(), 3);
    }

    #[tokio::test]
    async fn test_blocked_nonce() {
        let bridge = InMemoryBridge::new();
        bridge.block_nonce(2);
        assert!(bridge.submit(ChainId::new(1), &message(1)).await.is_ok());
        assert!(bridge.submit(ChainId::new(1), &message(2)).await.is_err());
        assert!(bridge.submit(ChainId::new(1), &message(3)).await.is_ok());

        bridge.unblock_nonce(2);
        assert!(bridge.submit(ChainId::new(1), &message(2)).await.is_ok());
        assert_eq!(bridge.pending(ChainId::new(1)), 3);
    }
}
