//! Cross-Chain Relay - core business logic
//!
//! Outbound: reserve the next nonce, sign, submit with bounded backoff.
//! Inbound: route, authenticate and sequence before anything is applied.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{ChainId, Timestamp};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};
use uuid::Uuid;
use xcr_01_participant_registry::ValidatorSetChange;
use xcr_03_proposal_store::FinalizedProposal;

use crate::domain::{
    AppliedMessage, ApplyOutcome, CrossChainMessage, RelayConfig, RelayError, RelayPayload,
    RelayResult, Resubmission, SendReceipt,
};
use crate::ports::{BridgeTransport, DeliveryReceipt, MessageAuthenticator, MirrorSink, RelayApi};

/// Inbound message waiting for its predecessor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct BufferedMessage {
    message: CrossChainMessage,
    received_at: Timestamp,
}

/// Persistent relay state: nonces, outbox and ordering buffers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayState {
    last_sent: BTreeMap<ChainId, u64>,
    outbox: BTreeMap<(ChainId, u64), CrossChainMessage>,
    last_applied: BTreeMap<ChainId, u64>,
    buffers: BTreeMap<ChainId, BTreeMap<u64, BufferedMessage>>,
}

impl RelayState {
    /// Highest nonce reserved towards `destination`.
    pub fn last_sent(&self, destination: ChainId) -> u64 {
        self.last_sent.get(&destination).copied().unwrap_or(0)
    }

    /// Highest nonce applied from `origin`.
    pub fn last_applied(&self, origin: ChainId) -> u64 {
        self.last_applied.get(&origin).copied().unwrap_or(0)
    }

    /// Messages whose submission failed, in (destination, nonce) order.
    pub fn outbox(&self) -> Vec<&CrossChainMessage> {
        self.outbox.values().collect()
    }

    /// Buffered nonces from `origin`.
    pub fn buffered(&self, origin: ChainId) -> Vec<u64> {
        self.buffers
            .get(&origin)
            .map(|buffer| buffer.keys().copied().collect())
            .unwrap_or_default()
    }
}

/// Relay for one chain.
pub struct CrossChainRelay<T: BridgeTransport, A: MessageAuthenticator> {
    config: RelayConfig,
    state: RelayState,
    transport: Arc<T>,
    authenticator: A,
}

impl<T: BridgeTransport, A: MessageAuthenticator> CrossChainRelay<T, A> {
    /// Create a relay with empty state.
    pub fn new(config: RelayConfig, transport: Arc<T>, authenticator: A) -> Self {
        Self {
            config,
            state: RelayState::default(),
            transport,
            authenticator,
        }
    }

    /// Replace the state with a persisted one.
    pub fn with_state(mut self, state: RelayState) -> Self {
        self.state = state;
        self
    }

    /// Relay configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> &RelayState {
        &self.state
    }

    /// Bridge transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    fn reject(&self, err: RelayError) -> RelayError {
        warn!(target: "xcr::security", "[xcr-04] Rejected inbound message: {}", err);
        err
    }

    async fn dispatch(
        &mut self,
        destination: ChainId,
        payload: RelayPayload,
    ) -> RelayResult<SendReceipt> {
        if !self.config.is_counterparty(destination) {
            return Err(RelayError::UnknownDestination { destination });
        }

        let nonce = self.state.last_sent(destination) + 1;
        let mut message = CrossChainMessage {
            origin: self.config.local_chain,
            destination,
            nonce,
            proposal_id: payload.proposal_word(),
            payload: payload.to_bytes()?,
            proof: Vec::new(),
        };
        message.proof = self
            .authenticator
            .sign(&message)
            .ok_or(RelayError::UnknownDestination { destination })?;

        // Reserve the nonce before the first attempt
        self.state.last_sent.insert(destination, nonce);
        self.state
            .outbox
            .insert((destination, nonce), message.clone());

        let receipt = self.submit_with_retry(&message).await?;
        self.state.outbox.remove(&(destination, nonce));

        Ok(SendReceipt {
            destination,
            nonce,
            proposal: message.proposal(),
            receipt,
        })
    }

    async fn submit_with_retry(&self, message: &CrossChainMessage) -> RelayResult<DeliveryReceipt> {
        let correlation_id = Uuid::new_v4();
        let policy = &self.config.retry;
        let attempt_timeout = Duration::from_millis(self.config.submit_timeout_ms);
        let mut last_error = String::from("no attempts made");

        for attempt in 1..=policy.max_attempts {
            match timeout(
                attempt_timeout,
                self.transport.submit(message.destination, message),
            )
            .await
            {
                Ok(Ok(receipt)) => {
                    info!(
                        correlation_id = %correlation_id,
                        "[xcr-04] Submitted nonce {} to {} (attempt {})",
                        message.nonce,
                        message.destination,
                        attempt
                    );
                    return Ok(receipt);
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => {
                    last_error = format!("timed out after {} ms", self.config.submit_timeout_ms)
                }
            }

            warn!(
                correlation_id = %correlation_id,
                "[xcr-04] Submission of nonce {} to {} failed (attempt {}/{}): {}",
                message.nonce,
                message.destination,
                attempt,
                policy.max_attempts,
                last_error
            );
            if attempt < policy.max_attempts {
                sleep(policy.backoff_for(attempt)).await;
            }
        }

        Err(RelayError::PropagationFailed {
            destination: message.destination,
            nonce: message.nonce,
            attempts: policy.max_attempts,
            reason: last_error,
        })
    }

    /// Authentic messages always consume their nonce, even when unusable.
    fn apply_one(
        &mut self,
        message: &CrossChainMessage,
        sink: &mut dyn MirrorSink,
    ) -> AppliedMessage {
        let origin = message.origin;
        let outcome = match decode_payload(message) {
            Err(err) => {
                warn!(
                    target: "xcr::security",
                    "[xcr-04] Consumed nonce {} from {} without applying: {}",
                    message.nonce,
                    origin,
                    err
                );
                ApplyOutcome::Rejected(err.to_string())
            }
            Ok(payload) => match sink.apply(origin, payload) {
                Ok(true) => ApplyOutcome::Applied,
                Ok(false) => ApplyOutcome::Unchanged,
                Err(reason) => {
                    warn!(
                        "[xcr-04] Mirror refused nonce {} from {}: {}",
                        message.nonce, origin, reason
                    );
                    ApplyOutcome::Rejected(reason)
                }
            },
        };
        self.state.last_applied.insert(origin, message.nonce);
        info!(
            "[xcr-04] Applied nonce {} from {} ({:?})",
            message.nonce, origin, outcome
        );

        AppliedMessage {
            origin,
            nonce: message.nonce,
            proposal: message.proposal(),
            outcome,
        }
    }
}

/// Payload of an authenticated message; its header must name the same proposal.
fn decode_payload(message: &CrossChainMessage) -> RelayResult<RelayPayload> {
    let payload = RelayPayload::from_bytes(&message.payload)?;
    if payload.proposal_word() != message.proposal_id {
        return Err(RelayError::Malformed(format!(
            "header proposal {} differs from payload proposal {}",
            hex::encode(message.proposal_id),
            hex::encode(payload.proposal_word())
        )));
    }
    Ok(payload)
}

#[async_trait]
impl<T: BridgeTransport, A: MessageAuthenticator> RelayApi for CrossChainRelay<T, A> {
    async fn send(
        &mut self,
        destination: ChainId,
        finalized: &FinalizedProposal,
    ) -> RelayResult<SendReceipt> {
        let payload = RelayPayload::ProposalOutcome {
            proposal: finalized.proposal.clone(),
            aggregate: finalized.aggregate.clone(),
        };
        self.dispatch(destination, payload).await
    }

    async fn send_validator_set(
        &mut self,
        destination: ChainId,
        changes: Vec<ValidatorSetChange>,
    ) -> RelayResult<SendReceipt> {
        self.dispatch(destination, RelayPayload::ValidatorSetUpdate { changes })
            .await
    }

    async fn resubmit_pending(&mut self) -> Resubmission {
        let pending: Vec<CrossChainMessage> = self.state.outbox.values().cloned().collect();
        let mut outcome = Resubmission::default();

        for message in pending {
            match self.submit_with_retry(&message).await {
                Ok(receipt) => {
                    self.state
                        .outbox
                        .remove(&(message.destination, message.nonce));
                    outcome.receipts.push(SendReceipt {
                        destination: message.destination,
                        nonce: message.nonce,
                        proposal: message.proposal(),
                        receipt,
                    });
                }
                Err(err) => {
                    outcome.failure.get_or_insert(err);
                }
            }
        }
        outcome
    }

    fn receive(
        &mut self,
        message: CrossChainMessage,
        sink: &mut dyn MirrorSink,
        now: Timestamp,
    ) -> RelayResult<Vec<AppliedMessage>> {
        let origin = message.origin;
        let nonce = message.nonce;

        if message.destination != self.config.local_chain {
            return Err(self.reject(RelayError::Misrouted {
                destination: message.destination,
                local: self.config.local_chain,
            }));
        }
        if !self.config.is_counterparty(origin) {
            return Err(self.reject(RelayError::UnknownOrigin { origin }));
        }
        if !self.authenticator.verify(&message) {
            return Err(self.reject(RelayError::InvalidProof { origin, nonce }));
        }

        let last_applied = self.state.last_applied(origin);
        let already_buffered = self
            .state
            .buffers
            .get(&origin)
            .is_some_and(|buffer| buffer.contains_key(&nonce));
        if nonce <= last_applied
            || already_buffered
            || nonce > last_applied.saturating_add(self.config.max_nonce_gap)
        {
            return Err(self.reject(RelayError::ReplayedNonce {
                origin,
                nonce,
                last_applied,
            }));
        }

        if nonce != last_applied + 1 {
            let capacity = self.config.max_buffered_per_origin;
            let held = self.state.buffers.get(&origin).map_or(0, |b| b.len());
            if held >= capacity {
                return Err(self.reject(RelayError::BufferFull { origin, capacity }));
            }
            self.state.buffers.entry(origin).or_default().insert(
                nonce,
                BufferedMessage {
                    message,
                    received_at: now,
                },
            );
            debug!(
                "[xcr-04] Buffered nonce {} from {} (waiting for {})",
                nonce,
                origin,
                last_applied + 1
            );
            return Ok(Vec::new());
        }

        let mut applied = vec![self.apply_one(&message, sink)];
        loop {
            let next = self.state.last_applied(origin) + 1;
            let Some(buffered) = self
                .state
                .buffers
                .get_mut(&origin)
                .and_then(|buffer| buffer.remove(&next))
            else {
                break;
            };
            applied.push(self.apply_one(&buffered.message, sink));
        }
        Ok(applied)
    }

    fn expire_stale(&mut self, now: Timestamp) -> Vec<RelayError> {
        let ttl = self.config.ordering_timeout_secs;
        let mut timeouts = Vec::new();

        for (origin, buffer) in self.state.buffers.iter_mut() {
            let stale: Vec<u64> = buffer
                .iter()
                .filter(|(_, b)| now.saturating_sub(b.received_at) >= ttl)
                .map(|(nonce, _)| *nonce)
                .collect();
            if stale.is_empty() {
                continue;
            }
            for nonce in &stale {
                buffer.remove(nonce);
            }
            warn!(
                target: "xcr::security",
                "[xcr-04] Ordering timeout for {}: discarded nonces {:?}",
                origin,
                stale
            );
            timeouts.push(RelayError::OrderingTimeout {
                origin: *origin,
                discarded: stale,
            });
        }
        timeouts
    }
}
