//! # Domain Errors

use shared_types::{Address, ErrorKind, ProposalId};
use thiserror::Error;

use super::entities::ProposalStatus;

/// Proposal store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposalError {
    /// Originator is not an active miner.
    #[error("Originator {} not eligible to create proposals", hex::encode(originator))]
    NotEligible {
        /// Originator address
        originator: Address,
    },

    /// Targeted protocol is not registered.
    #[error("Protocol {} not registered", hex::encode(protocol))]
    UnknownProtocol {
        /// Governor address
        protocol: Address,
    },

    /// Unknown proposal.
    #[error("Proposal {id} not found")]
    NotFound {
        /// Proposal ID
        id: ProposalId,
    },

    /// Lifecycle table forbids the transition.
    #[error("Proposal {id}: invalid transition {from} -> {to}")]
    InvalidTransition {
        /// Proposal ID
        id: ProposalId,
        /// Current status
        from: ProposalStatus,
        /// Requested status
        to: ProposalStatus,
    },

    /// Too few valid reveals.
    #[error("Proposal {id}: {valid_reveals} valid reveals, {required} required")]
    QuorumNotMet {
        /// Proposal ID
        id: ProposalId,
        /// Valid reveals in the validator round
        valid_reveals: u32,
        /// Configured minimum
        required: u32,
    },
}

impl ProposalError {
    /// Shared error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotEligible { .. } => ErrorKind::NotEligible,
            Self::UnknownProtocol { .. } => ErrorKind::NotRegistered,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::QuorumNotMet { .. } => ErrorKind::QuorumNotMet,
        }
    }
}

/// Result type for proposal store operations.
pub type ProposalResult<T> = Result<T, ProposalError>;
