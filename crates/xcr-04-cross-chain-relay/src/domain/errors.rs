//! # Domain Errors
//!
//! Cross-chain errors. Only `PropagationFailed` is retried; every other
//! rejection is security-relevant and dropped.

use shared_types::{ChainId, ErrorKind};
use thiserror::Error;

/// Relay errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// Message addressed to another chain.
    #[error("Message for {destination} delivered to {local}")]
    Misrouted {
        /// Destination in the message
        destination: ChainId,
        /// This chain
        local: ChainId,
    },

    /// Origin is not a counterparty.
    #[error("Unknown origin chain {origin}")]
    UnknownOrigin {
        /// Claimed origin
        origin: ChainId,
    },

    /// Destination is not a counterparty, or no key is shared with it.
    #[error("Unknown destination chain {destination}")]
    UnknownDestination {
        /// Requested destination
        destination: ChainId,
    },

    /// Authentication proof did not verify.
    #[error("Invalid proof on message {nonce} from {origin}")]
    InvalidProof {
        /// Origin chain
        origin: ChainId,
        /// Message nonce
        nonce: u64,
    },

    /// Nonce already applied, already buffered, or outside the window.
    #[error("Replayed nonce {nonce} from {origin} (last applied {last_applied})")]
    ReplayedNonce {
        /// Origin chain
        origin: ChainId,
        /// Offending nonce
        nonce: u64,
        /// Highest nonce applied so far
        last_applied: u64,
    },

    /// Out-of-order buffer is full.
    #[error("Ordering buffer for {origin} full ({capacity} messages)")]
    BufferFull {
        /// Origin chain
        origin: ChainId,
        /// Buffer capacity
        capacity: usize,
    },

    /// Buffered messages discarded after waiting too long for a gap.
    #[error("Ordering timeout for {origin}: discarded nonces {discarded:?}")]
    OrderingTimeout {
        /// Origin chain
        origin: ChainId,
        /// Discarded nonces
        discarded: Vec<u64>,
    },

    /// Bridge submission failed after every retry.
    #[error("Propagation of nonce {nonce} to {destination} failed after {attempts} attempts: {reason}")]
    PropagationFailed {
        /// Destination chain
        destination: ChainId,
        /// Reserved nonce, kept for resubmission
        nonce: u64,
        /// Attempts made
        attempts: u32,
        /// Last transport error
        reason: String,
    },

    /// Bytes could not be decoded.
    #[error("Malformed message: {0}")]
    Malformed(String),
}

impl RelayError {
    /// Shared error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Misrouted { .. } => ErrorKind::Misrouted,
            Self::UnknownOrigin { .. } | Self::UnknownDestination { .. } => {
                ErrorKind::UnknownOrigin
            }
            Self::InvalidProof { .. } => ErrorKind::InvalidProof,
            Self::ReplayedNonce { .. } => ErrorKind::ReplayedNonce,
            Self::BufferFull { .. } => ErrorKind::BufferFull,
            Self::OrderingTimeout { .. } => ErrorKind::OrderingTimeout,
            Self::PropagationFailed { .. } => ErrorKind::PropagationFailed,
            Self::Malformed(_) => ErrorKind::Malformed,
        }
    }

    /// True if the caller may retry.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
