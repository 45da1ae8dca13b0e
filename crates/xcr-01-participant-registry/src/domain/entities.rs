//! # Domain Entities
//!
//! Participants, governed protocols, and the registry configuration.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Role, Stake, Timestamp};

/// Participant lifecycle status.
///
/// State Machine:
/// ```text
/// [UNREGISTERED] ──register──→ [ACTIVE] ──deregister + cooldown──→ [EXITED]
///                                  │                                   │
///                                  └──slash──→ [SLASHED]               └──register──→ [ACTIVE]
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantStatus {
    /// Never registered.
    #[default]
    Unregistered,
    /// Registered and staked.
    Active,
    /// Penalized; permanently ineligible.
    Slashed,
    /// Exit cooldown elapsed.
    Exited,
}

impl ParticipantStatus {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: ParticipantStatus) -> bool {
        match (self, next) {
            (Self::Unregistered, Self::Active) => true,
            (Self::Active, Self::Slashed) => true,
            (Self::Active, Self::Exited) => true,
            (Self::Exited, Self::Active) => true, // Re-registration
            _ => false,
        }
    }
}

/// A registered participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Identity.
    pub address: Address,
    /// Role.
    pub role: Role,
    /// Current stake.
    pub stake: Stake,
    /// Stored status (`Active` or `Slashed`); exits are derived from `exit_at`.
    status: ParticipantStatus,
    /// Registration timestamp.
    pub registered_at: Timestamp,
    /// When a scheduled exit takes effect.
    pub exit_at: Option<Timestamp>,
}

impl Participant {
    /// Create an active participant.
    pub fn new(address: Address, role: Role, stake: Stake, registered_at: Timestamp) -> Self {
        Self {
            address,
            role,
            stake,
            status: ParticipantStatus::Active,
            registered_at,
            exit_at: None,
        }
    }

    /// Status as of `now`.
    pub fn status_at(&self, now: Timestamp) -> ParticipantStatus {
        if self.status == ParticipantStatus::Slashed {
            return ParticipantStatus::Slashed;
        }
        match self.exit_at {
            Some(exit_at) if now >= exit_at => ParticipantStatus::Exited,
            _ => self.status,
        }
    }

    /// True if active with `role` at `now`.
    pub fn is_eligible(&self, role: Role, now: Timestamp) -> bool {
        self.role == role && self.status_at(now) == ParticipantStatus::Active
    }

    /// True while an exit is scheduled but not yet effective.
    pub fn is_exit_pending(&self, now: Timestamp) -> bool {
        matches!(self.exit_at, Some(exit_at) if now < exit_at)
    }

    /// Mark slashed.
    pub(crate) fn mark_slashed(&mut self) {
        self.status = ParticipantStatus::Slashed;
    }
}

/// A governed protocol that proposals can target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocol {
    /// Governor contract address.
    pub address: Address,
    /// Registration time.
    pub registered_at: Timestamp,
}

/// Registry configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Minimum stake to register as a miner.
    pub min_miner_stake: Stake,
    /// Minimum stake to register as a validator.
    pub min_validator_stake: Stake,
    /// Delay between `deregister` and the exit taking effect.
    pub exit_cooldown_secs: u64,
}

impl RegistryConfig {
    /// Minimum stake for `role`.
    pub fn min_stake(&self, role: Role) -> Stake {
        match role {
            Role::Miner => self.min_miner_stake,
            Role::Validator => self.min_validator_stake,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            min_miner_stake: 100,
            min_validator_stake: 50,
            exit_cooldown_secs: 24 * 3600, // 1 day
        }
    }
}
