//! # Error Types
//!
//! The error taxonomy shared by every component. Each component keeps its
//! own `thiserror` enum and maps it onto an [`ErrorKind`] so operators and
//! the CLI see one stable vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Rejected locally, never retried.
    Eligibility,
    /// Rejected locally; wait for the next valid phase or stay excluded.
    ProtocolPhase,
    /// Bridge and message-verification failures.
    CrossChain,
    /// Storage, encoding and lookup failures.
    Internal,
}

/// Stable error kind reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    // Eligibility
    /// Participant lacks the required role or status.
    NotEligible,
    /// Participant is unknown.
    NotRegistered,
    /// Participant is already active.
    AlreadyRegistered,
    /// Stake below the role minimum.
    InsufficientStake,

    // Protocol phase
    /// The commit or reveal window is not open.
    PhaseNotOpen,
    /// A commitment already exists for this participant and phase.
    DuplicateCommitment,
    /// Reveal without a prior commitment.
    NoMatchingCommitment,
    /// hash(value ‖ salt) differs from the stored commitment.
    HashMismatch,
    /// Illegal lifecycle transition.
    InvalidTransition,
    /// Too few valid reveals to finalize.
    QuorumNotMet,
    /// An orchestrator step ran before its predecessor completed.
    PrecedingStepIncomplete,

    // Cross-chain
    /// Message authentication failed.
    InvalidProof,
    /// Nonce already applied or outside the gap-free sequence.
    ReplayedNonce,
    /// Origin chain is not a counterparty.
    UnknownOrigin,
    /// Buffered message discarded while waiting for a gap.
    OrderingTimeout,
    /// Bridge submission failed after all retries.
    PropagationFailed,
    /// Message addressed to another chain.
    Misrouted,
    /// Out-of-order buffer is full.
    BufferFull,

    // Internal
    /// Referenced entity does not exist.
    NotFound,
    /// Input could not be decoded.
    Malformed,
    /// Ledger read/write failure.
    Storage,
}

impl ErrorKind {
    /// Category of this kind.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotEligible
            | Self::NotRegistered
            | Self::AlreadyRegistered
            | Self::InsufficientStake => ErrorCategory::Eligibility,
            Self::PhaseNotOpen
            | Self::DuplicateCommitment
            | Self::NoMatchingCommitment
            | Self::HashMismatch
            | Self::InvalidTransition
            | Self::QuorumNotMet
            | Self::PrecedingStepIncomplete => ErrorCategory::ProtocolPhase,
            Self::InvalidProof
            | Self::ReplayedNonce
            | Self::UnknownOrigin
            | Self::OrderingTimeout
            | Self::PropagationFailed
            | Self::Misrouted
            | Self::BufferFull => ErrorCategory::CrossChain,
            Self::NotFound | Self::Malformed | Self::Storage => ErrorCategory::Internal,
        }
    }

    /// Only bridge submission failures are retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PropagationFailed)
    }

    /// Cross-chain rejections that may indicate replay or forgery.
    pub fn is_security_relevant(&self) -> bool {
        self.category() == ErrorCategory::CrossChain && !self.is_retryable()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Errors parsing primitive values from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Not valid hex.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Wrong byte length.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Expected byte length
        expected: usize,
        /// Actual byte length
        actual: usize,
    },

    /// Unknown role name.
    #[error("Unknown role: {0}")]
    UnknownRole(String),
}
