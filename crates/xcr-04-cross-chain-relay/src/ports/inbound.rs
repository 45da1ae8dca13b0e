//! # Inbound Ports
//!
//! API trait defining what the Cross-Chain Relay can do.

use async_trait::async_trait;
use shared_types::{ChainId, Timestamp};
use xcr_01_participant_registry::ValidatorSetChange;
use xcr_03_proposal_store::FinalizedProposal;

use super::outbound::MirrorSink;
use crate::domain::{
    AppliedMessage, CrossChainMessage, RelayError, RelayResult, Resubmission, SendReceipt,
};

/// Cross-chain relay API - inbound port.
#[async_trait]
pub trait RelayApi: Send {
    /// Send a finalized proposal and its aggregate to `destination`.
    async fn send(
        &mut self,
        destination: ChainId,
        finalized: &FinalizedProposal,
    ) -> RelayResult<SendReceipt>;

    /// Mirror validator-set changes to `destination`.
    async fn send_validator_set(
        &mut self,
        destination: ChainId,
        changes: Vec<ValidatorSetChange>,
    ) -> RelayResult<SendReceipt>;

    /// Retry every message whose nonce was reserved by a failed send.
    ///
    /// Continues past failures; accepted messages are always reported.
    async fn resubmit_pending(&mut self) -> Resubmission;

    /// Verify and apply (or buffer) an inbound message.
    ///
    /// Returns the messages applied by this call, in nonce order.
    fn receive(
        &mut self,
        message: CrossChainMessage,
        sink: &mut dyn MirrorSink,
        now: Timestamp,
    ) -> RelayResult<Vec<AppliedMessage>>;

    /// Discard buffered messages that waited past the ordering timeout.
    ///
    /// Each returned error is `RelayError::OrderingTimeout`.
    fn expire_stale(&mut self, now: Timestamp) -> Vec<RelayError>;
}
