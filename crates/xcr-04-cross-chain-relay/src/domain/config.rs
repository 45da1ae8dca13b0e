//! # Relay Configuration

use serde::{Deserialize, Serialize};
use shared_types::ChainId;
use std::collections::BTreeSet;
use std::time::Duration;

/// Bounded exponential backoff for bridge submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub initial_backoff_ms: u64,
    /// Backoff cap.
    pub max_backoff_ms: u64,
    /// Growth factor per attempt.
    pub multiplier: u32,
}

impl RetryPolicy {
    /// Delay after failed attempt number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = (self.multiplier.max(1) as u64).saturating_pow(attempt.saturating_sub(1));
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 200,
            max_backoff_ms: 5_000,
            multiplier: 2,
        }
    }
}

/// Relay configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// This chain.
    pub local_chain: ChainId,
    /// Recognized counterparty chains.
    pub counterparties: BTreeSet<ChainId>,
    /// Out-of-order messages held per origin.
    pub max_buffered_per_origin: usize,
    /// Furthest a nonce may run ahead of the last applied one.
    pub max_nonce_gap: u64,
    /// Seconds a buffered message waits for its gap.
    pub ordering_timeout_secs: u64,
    /// Submission retries.
    pub retry: RetryPolicy,
    /// Per-attempt submission timeout.
    pub submit_timeout_ms: u64,
}

impl RelayConfig {
    /// Config for `local_chain` talking to `counterparty`.
    pub fn new(local_chain: ChainId, counterparty: ChainId) -> Self {
        Self {
            local_chain,
            counterparties: BTreeSet::from([counterparty]),
            ..Default::default()
        }
    }

    /// True if `chain` is a counterparty.
    pub fn is_counterparty(&self, chain: ChainId) -> bool {
        self.counterparties.contains(&chain)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            local_chain: ChainId::default(),
            counterparties: BTreeSet::new(),
            max_buffered_per_origin: 64,
            max_nonce_gap: 1_024,
            ordering_timeout_secs: 300,
            retry: RetryPolicy::default(),
            submit_timeout_ms: 10_000,
        }
    }
}
