//! # Domain Entities

use serde::{Deserialize, Serialize};
use shared_types::{Address, ChainId, Hash, ProposalId, Round, Timestamp};
use std::fmt;
use xcr_02_commit_reveal::ScoreAggregate;

/// Proposal lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Just created.
    Created,
    /// Commit window open for the current round.
    CommitOpen,
    /// Commit window closed.
    CommitClosed,
    /// Reveal window open.
    RevealOpen,
    /// Reveal window closed.
    RevealClosed,
    /// Validator score aggregated.
    Scored,
    /// Handed to the relay.
    Propagated,
    /// Applied on the counter-chain (terminal).
    Finalized,
    /// Abandoned (terminal).
    Rejected,
}

impl ProposalStatus {
    /// Check if transition is valid from this status in `round`.
    pub fn can_transition_to(&self, next: ProposalStatus, round: Round) -> bool {
        use ProposalStatus::*;
        match (self, next) {
            (Finalized | Rejected, _) => false,
            (_, Rejected) => true,
            (Created, CommitOpen) => round == Round::Miner,
            (CommitOpen, CommitClosed) => true,
            (CommitClosed, RevealOpen) => true,
            (RevealOpen, RevealClosed) => true,
            // Miner content resolved, validator round opens
            (RevealClosed, CommitOpen) => round == Round::Miner,
            (RevealClosed, Scored) => round == Round::Validator,
            (Scored, Propagated) => true,
            (Propagated, Finalized) => true,
            _ => false,
        }
    }

    /// True for `finalized` and `rejected`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalStatus::Finalized | ProposalStatus::Rejected)
    }

    /// Position inside a round, for the four round statuses.
    pub(crate) fn round_rank(&self) -> Option<u8> {
        match self {
            ProposalStatus::Created => Some(0),
            ProposalStatus::CommitOpen => Some(1),
            ProposalStatus::CommitClosed => Some(2),
            ProposalStatus::RevealOpen => Some(3),
            ProposalStatus::RevealClosed => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProposalStatus::Created => "created",
            ProposalStatus::CommitOpen => "commit_open",
            ProposalStatus::CommitClosed => "commit_closed",
            ProposalStatus::RevealOpen => "reveal_open",
            ProposalStatus::RevealClosed => "reveal_closed",
            ProposalStatus::Scored => "scored",
            ProposalStatus::Propagated => "propagated",
            ProposalStatus::Finalized => "finalized",
            ProposalStatus::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Bridge hand-off state of a propagated proposal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropagationState {
    /// Not yet finalized.
    #[default]
    NotReady,
    /// Ready; waiting for a successful bridge submission.
    Pending,
    /// Accepted by the bridge.
    Submitted {
        /// Message nonce
        nonce: u64,
        /// Bridge receipt
        receipt: String,
    },
}

/// A governance proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Monotonic per origin chain, starting at 1.
    pub id: ProposalId,
    /// Chain the proposal originated on.
    pub origin: ChainId,
    /// Governor address of the targeted protocol.
    pub protocol: Address,
    /// Creating miner.
    pub originator: Address,
    /// Hash of the proposal payload.
    pub payload_hash: Hash,
    /// Creation time.
    pub created_at: Timestamp,
    /// Lifecycle status.
    pub status: ProposalStatus,
    /// Round the status refers to.
    pub round: Round,
    /// Content hash resolved by the miner round.
    pub content: Option<Hash>,
    /// Validator round aggregate.
    pub score: Option<ScoreAggregate>,
    /// Bridge hand-off.
    pub propagation: PropagationState,
    /// Why the proposal was rejected.
    pub rejection: Option<String>,
}

impl Proposal {
    /// New proposal in `created`.
    pub fn new(
        id: ProposalId,
        origin: ChainId,
        protocol: Address,
        originator: Address,
        payload_hash: Hash,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            origin,
            protocol,
            originator,
            payload_hash,
            created_at,
            status: ProposalStatus::Created,
            round: Round::Miner,
            content: None,
            score: None,
            propagation: PropagationState::NotReady,
            rejection: None,
        }
    }

    /// Aggregated validator score, if scored.
    pub fn final_score(&self) -> Option<u64> {
        self.score.as_ref().and_then(|agg| agg.score())
    }
}

/// A proposal ready for the relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedProposal {
    /// Proposal snapshot.
    pub proposal: Proposal,
    /// Validator aggregate.
    pub aggregate: ScoreAggregate,
}

/// Proposal store configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalStoreConfig {
    /// Minimum valid validator reveals to finalize.
    pub min_valid_reveals: u32,
}

impl Default for ProposalStoreConfig {
    fn default() -> Self {
        Self {
            min_valid_reveals: 1,
        }
    }
}
