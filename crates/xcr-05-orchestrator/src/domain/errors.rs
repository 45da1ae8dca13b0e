//! # Orchestrator Errors

use shared_types::ErrorKind;
use thiserror::Error;
use xcr_01_participant_registry::RegistryError;
use xcr_02_commit_reveal::CommitRevealError;
use xcr_03_proposal_store::ProposalError;
use xcr_04_cross_chain_relay::RelayError;

use crate::config::ConfigError;
use crate::ports::LedgerError;

/// Errors from any orchestrator step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    /// Participant registry rejected the step.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Commit-reveal engine rejected the step.
    #[error(transparent)]
    CommitReveal(#[from] CommitRevealError),

    /// Proposal store rejected the step.
    #[error(transparent)]
    Proposal(#[from] ProposalError),

    /// Relay rejected or failed the step.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// The step's predecessor has not reached its terminal state.
    #[error("{step} cannot run yet: {reason}")]
    PrecedingStepIncomplete {
        /// Step attempted
        step: &'static str,
        /// What is still missing
        reason: String,
    },

    /// Ledger read or write failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Snapshot could not be encoded or decoded.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Invalid node configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl OrchestratorError {
    /// Shared error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Registry(e) => e.kind(),
            Self::CommitReveal(e) => e.kind(),
            Self::Proposal(e) => e.kind(),
            Self::Relay(e) => e.kind(),
            Self::PrecedingStepIncomplete { .. } => ErrorKind::PrecedingStepIncomplete,
            Self::Ledger(_) | Self::Snapshot(_) => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Malformed,
        }
    }
}

/// Result type for orchestrator steps.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
