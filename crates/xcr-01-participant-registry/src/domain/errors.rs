//! # Domain Errors
//!
//! Eligibility errors. All are rejected locally and never retried.

use shared_types::{Address, ErrorKind, Role, Stake};
use thiserror::Error;

/// Participant registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Participant lacks the required role or status.
    #[error("Participant {} not eligible: {reason}", hex::encode(participant))]
    NotEligible {
        /// Participant address
        participant: Address,
        /// Why the participant is not eligible
        reason: String,
    },

    /// Participant is unknown or already exited.
    #[error("Participant {} not registered", hex::encode(participant))]
    NotRegistered {
        /// Participant address
        participant: Address,
    },

    /// Participant already active.
    #[error("Participant {} already registered", hex::encode(participant))]
    AlreadyRegistered {
        /// Participant address
        participant: Address,
    },

    /// Protocol was never registered.
    #[error("Protocol {} not registered", hex::encode(protocol))]
    UnknownProtocol {
        /// Governor contract address
        protocol: Address,
    },

    /// Protocol already registered.
    #[error("Protocol {} already registered", hex::encode(protocol))]
    ProtocolAlreadyRegistered {
        /// Governor contract address
        protocol: Address,
    },

    /// Stake below the role minimum.
    #[error("Insufficient stake for {role}: {stake} < {minimum}")]
    InsufficientStake {
        /// Requested role
        role: Role,
        /// Offered stake
        stake: Stake,
        /// Required minimum
        minimum: Stake,
    },
}

impl RegistryError {
    /// Shared error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotEligible { .. } => ErrorKind::NotEligible,
            Self::NotRegistered { .. } | Self::UnknownProtocol { .. } => ErrorKind::NotRegistered,
            Self::AlreadyRegistered { .. } | Self::ProtocolAlreadyRegistered { .. } => {
                ErrorKind::AlreadyRegistered
            }
            Self::InsufficientStake { .. } => ErrorKind::InsufficientStake,
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
