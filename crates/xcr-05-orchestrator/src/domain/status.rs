//! Step results and the node status view.

use serde::{Deserialize, Serialize};
use shared_types::{ChainId, ProposalId};
use xcr_03_proposal_store::{PropagationState, Proposal};

/// Result of a successful step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// The step changed state.
    Applied,
    /// An identical step had already been applied; nothing changed.
    AlreadyApplied,
}

impl StepOutcome {
    /// True for `Applied`.
    pub fn is_applied(&self) -> bool {
        matches!(self, StepOutcome::Applied)
    }
}

/// One proposal in the status view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalSummary {
    /// Proposal ID.
    pub id: ProposalId,
    /// Origin chain.
    pub origin: ChainId,
    /// Governor address of the targeted protocol (hex).
    pub protocol: String,
    /// Lifecycle status.
    pub status: String,
    /// Current round.
    pub round: String,
    /// Resolved content hash (hex).
    pub content: Option<String>,
    /// Aggregated score.
    pub score: Option<u64>,
    /// Valid validator reveals.
    pub valid_reveals: u32,
    /// Bridge hand-off.
    pub propagation: String,
}

impl From<&Proposal> for ProposalSummary {
    fn from(proposal: &Proposal) -> Self {
        let propagation = match &proposal.propagation {
            PropagationState::NotReady => "not_ready".to_string(),
            PropagationState::Pending => "pending".to_string(),
            PropagationState::Submitted { nonce, .. } => format!("submitted(nonce={})", nonce),
        };
        Self {
            id: proposal.id,
            origin: proposal.origin,
            protocol: hex::encode(proposal.protocol),
            status: proposal.status.to_string(),
            round: proposal.round.to_string(),
            content: proposal.content.map(hex::encode),
            score: proposal.final_score(),
            valid_reveals: proposal.score.as_ref().map_or(0, |agg| agg.valid_reveals),
            propagation,
        }
    }
}

/// Snapshot of a node for operators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    /// This chain.
    pub chain: ChainId,
    /// Counterparty chain.
    pub counterparty: ChainId,
    /// Registered participants.
    pub participants: usize,
    /// Registered protocols.
    pub protocols: usize,
    /// Local proposals.
    pub proposals: Vec<ProposalSummary>,
    /// Proposals mirrored from the counterparty.
    pub mirrored: Vec<ProposalSummary>,
    /// Highest nonce reserved towards the counterparty.
    pub last_sent: u64,
    /// Highest nonce applied from the counterparty.
    pub last_applied: u64,
    /// Messages waiting for resubmission.
    pub outbox: usize,
    /// Out-of-order nonces waiting for their gap.
    pub buffered: Vec<u64>,
    /// Validator-set changes not yet propagated.
    pub pending_validator_changes: usize,
}
