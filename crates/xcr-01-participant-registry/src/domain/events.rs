//! # Registry Events
//!
//! Emitted on every registry mutation. Validator events are mirrored to the
//! counter-chain because they change its view of the quorum.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Role, Stake, Timestamp};

/// Registry mutation event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// Participant registered.
    Registered {
        /// Participant address
        participant: Address,
        /// Role
        role: Role,
        /// Stake at registration
        stake: Stake,
        /// Registration time
        at: Timestamp,
    },
    /// Exit scheduled.
    ExitScheduled {
        /// Participant address
        participant: Address,
        /// Role
        role: Role,
        /// When the exit takes effect
        exit_at: Timestamp,
    },
    /// Stake changed.
    StakeChanged {
        /// Participant address
        participant: Address,
        /// Role
        role: Role,
        /// New total stake
        stake: Stake,
    },
    /// Participant slashed.
    Slashed {
        /// Participant address
        participant: Address,
        /// Role
        role: Role,
    },
}

impl RegistryEvent {
    /// Participant the event concerns.
    pub fn participant(&self) -> Address {
        match self {
            Self::Registered { participant, .. }
            | Self::ExitScheduled { participant, .. }
            | Self::StakeChanged { participant, .. }
            | Self::Slashed { participant, .. } => *participant,
        }
    }

    /// Role of the participant.
    pub fn role(&self) -> Role {
        match self {
            Self::Registered { role, .. }
            | Self::ExitScheduled { role, .. }
            | Self::StakeChanged { role, .. }
            | Self::Slashed { role, .. } => *role,
        }
    }

    /// Validator-set change to mirror, if this event affects the validator set.
    pub fn to_validator_change(&self) -> Option<ValidatorSetChange> {
        if self.role() != Role::Validator {
            return None;
        }
        let change = match self {
            Self::Registered {
                participant, stake, ..
            }
            | Self::StakeChanged {
                participant, stake, ..
            } => ValidatorSetChange::Upsert {
                validator: *participant,
                stake: *stake,
            },
            Self::ExitScheduled {
                participant,
                exit_at,
                ..
            } => ValidatorSetChange::Remove {
                validator: *participant,
                effective_at: *exit_at,
            },
            Self::Slashed { participant, .. } => ValidatorSetChange::Remove {
                validator: *participant,
                effective_at: 0,
            },
        };
        Some(change)
    }
}

/// Change to a mirrored validator set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidatorSetChange {
    /// Add a validator or update its stake.
    Upsert {
        /// Validator address
        validator: Address,
        /// Stake
        stake: Stake,
    },
    /// Remove a validator once `effective_at` is reached.
    Remove {
        /// Validator address
        validator: Address,
        /// When the removal takes effect (0 = immediately)
        effective_at: Timestamp,
    },
}
