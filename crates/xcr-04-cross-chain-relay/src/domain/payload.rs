//! # Relay Payloads and Results

use serde::{Deserialize, Serialize};
use shared_types::{proposal_id_to_word, ChainId, ProposalId};
use xcr_01_participant_registry::ValidatorSetChange;
use xcr_02_commit_reveal::ScoreAggregate;
use xcr_03_proposal_store::Proposal;

use super::errors::{RelayError, RelayResult};
use crate::ports::DeliveryReceipt;

/// What a message carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayPayload {
    /// A finalized proposal and its validator aggregate.
    ProposalOutcome {
        /// Proposal snapshot at hand-off
        proposal: Proposal,
        /// Validator aggregate
        aggregate: ScoreAggregate,
    },
    /// Validator-set changes on the origin chain.
    ValidatorSetUpdate {
        /// Ordered changes
        changes: Vec<ValidatorSetChange>,
    },
}

impl RelayPayload {
    /// bincode encoding.
    pub fn to_bytes(&self) -> RelayResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| RelayError::Malformed(e.to_string()))
    }

    /// Decode a bincode payload.
    pub fn from_bytes(bytes: &[u8]) -> RelayResult<Self> {
        bincode::deserialize(bytes).map_err(|e| RelayError::Malformed(e.to_string()))
    }

    /// Proposal id word for the message header.
    pub fn proposal_word(&self) -> [u8; 32] {
        match self {
            Self::ProposalOutcome { proposal, .. } => proposal_id_to_word(proposal.id),
            Self::ValidatorSetUpdate { .. } => [0u8; 32],
        }
    }
}

/// Successful submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Destination chain.
    pub destination: ChainId,
    /// Nonce used.
    pub nonce: u64,
    /// Proposal carried, if any.
    pub proposal: Option<ProposalId>,
    /// Bridge acknowledgment.
    pub receipt: DeliveryReceipt,
}

/// Outcome of retrying the outbox.
///
/// Accepted messages leave the outbox even when a later one fails, so their
/// receipts are always reported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resubmission {
    /// Messages the bridge accepted.
    pub receipts: Vec<SendReceipt>,
    /// First failure. Failed messages stay queued under their nonce.
    pub failure: Option<RelayError>,
}

impl Resubmission {
    /// Receipts, or the first failure.
    pub fn into_result(self) -> RelayResult<Vec<SendReceipt>> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.receipts),
        }
    }
}

/// How the mirror handled an applied message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyOutcome {
    /// State changed.
    Applied,
    /// Mirror already held this state.
    Unchanged,
    /// Mirror refused the payload; the nonce is still consumed.
    Rejected(String),
}

/// A message applied in nonce order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMessage {
    /// Origin chain.
    pub origin: ChainId,
    /// Applied nonce.
    pub nonce: u64,
    /// Proposal carried, if any.
    pub proposal: Option<ProposalId>,
    /// Mirror result.
    pub outcome: ApplyOutcome,
}
