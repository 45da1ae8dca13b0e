//! # Domain Errors
//!
//! Protocol-phase errors. Rejected locally; the caller waits for the next
//! valid phase or stays excluded.

use shared_types::{Address, ErrorKind, Phase, ProposalId, Round};
use thiserror::Error;

/// Commit-reveal errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitRevealError {
    /// Window for `phase` is closed or not yet open.
    #[error("Phase {phase} not open for proposal {proposal}")]
    PhaseNotOpen {
        /// Proposal ID
        proposal: ProposalId,
        /// Phase the submission targeted
        phase: Phase,
    },

    /// Participant is outside the round snapshot or no longer eligible.
    #[error("Participant {} not eligible for {round} round of proposal {proposal}", hex::encode(participant))]
    NotEligible {
        /// Participant address
        participant: Address,
        /// Proposal ID
        proposal: ProposalId,
        /// Round
        round: Round,
    },

    /// Second commitment for the same (participant, proposal, phase).
    #[error("Duplicate commitment from {} in {phase} of proposal {proposal}", hex::encode(participant))]
    DuplicateCommitment {
        /// Participant address
        participant: Address,
        /// Proposal ID
        proposal: ProposalId,
        /// Commit phase
        phase: Phase,
    },

    /// Reveal with no prior commitment, or a second reveal.
    #[error("No matching commitment from {} in {phase} of proposal {proposal}", hex::encode(participant))]
    NoMatchingCommitment {
        /// Participant address
        participant: Address,
        /// Proposal ID
        proposal: ProposalId,
        /// Reveal phase
        phase: Phase,
    },

    /// hash(value ‖ salt) differs from the stored commitment.
    #[error("Hash mismatch for {} on proposal {proposal}", hex::encode(participant))]
    HashMismatch {
        /// Participant address
        participant: Address,
        /// Proposal ID
        proposal: ProposalId,
    },

    /// Round already exists.
    #[error("{round} round of proposal {proposal} already open")]
    RoundAlreadyOpen {
        /// Proposal ID
        proposal: ProposalId,
        /// Round
        round: Round,
    },

    /// Round was never opened.
    #[error("{round} round of proposal {proposal} not found")]
    RoundNotFound {
        /// Proposal ID
        proposal: ProposalId,
        /// Round
        round: Round,
    },

    /// Outcome requested before the reveal window closed.
    #[error("{round} round of proposal {proposal} still open")]
    RoundNotClosed {
        /// Proposal ID
        proposal: ProposalId,
        /// Round
        round: Round,
    },

    /// Revealed value is not a valid score word.
    #[error("Malformed value from {}: {reason}", hex::encode(participant))]
    MalformedValue {
        /// Participant address
        participant: Address,
        /// What is wrong with it
        reason: String,
    },
}

impl CommitRevealError {
    /// Shared error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PhaseNotOpen { .. } => ErrorKind::PhaseNotOpen,
            Self::NotEligible { .. } => ErrorKind::NotEligible,
            Self::DuplicateCommitment { .. } => ErrorKind::DuplicateCommitment,
            Self::NoMatchingCommitment { .. } => ErrorKind::NoMatchingCommitment,
            Self::HashMismatch { .. } => ErrorKind::HashMismatch,
            Self::RoundAlreadyOpen { .. } | Self::RoundNotClosed { .. } => {
                ErrorKind::InvalidTransition
            }
            Self::RoundNotFound { .. } => ErrorKind::NotFound,
            Self::MalformedValue { .. } => ErrorKind::Malformed,
        }
    }
}

/// Result type for commit-reveal operations.
pub type CommitRevealResult<T> = Result<T, CommitRevealError>;
