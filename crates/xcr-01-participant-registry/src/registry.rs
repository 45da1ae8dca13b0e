//! Participant Registry - core business logic

use serde::{Deserialize, Serialize};
use shared_types::{Address, ChainId, Role, Stake, Timestamp};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::domain::{
    Participant, ParticipantStatus, Protocol, RegistryConfig, RegistryError, RegistryEvent,
    RegistryResult, ValidatorSetChange,
};
use crate::ports::ParticipantRegistryApi;

/// Mirrored validator from a counter-chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct RemoteValidator {
    stake: Stake,
    removed_at: Option<Timestamp>,
}

/// The participant registry of one chain.
///
/// Local participants are owned here; the validator sets of counterparty
/// chains are held as read-only mirrors fed by the relay.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParticipantRegistry {
    config: RegistryConfig,
    participants: BTreeMap<Address, Participant>,
    protocols: BTreeMap<Address, Protocol>,
    remote_validators: BTreeMap<ChainId, BTreeMap<Address, RemoteValidator>>,
    pending_events: Vec<RegistryEvent>,
}

impl ParticipantRegistry {
    /// Create an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Take the events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Number of known participants (any status).
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// True if no participant was ever registered.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Apply a validator-set change received from `origin`.
    pub fn apply_remote_update(&mut self, origin: ChainId, change: &ValidatorSetChange) {
        let set = self.remote_validators.entry(origin).or_default();
        match change {
            ValidatorSetChange::Upsert { validator, stake } => {
                set.insert(
                    *validator,
                    RemoteValidator {
                        stake: *stake,
                        removed_at: None,
                    },
                );
            }
            ValidatorSetChange::Remove {
                validator,
                effective_at,
            } => {
                if let Some(entry) = set.get_mut(validator) {
                    entry.removed_at = Some(*effective_at);
                }
            }
        }
        debug!("[xcr-01] Applied remote validator change from {}: {:?}", origin, change);
    }

    /// Validator set of `origin` as mirrored locally.
    pub fn remote_validators(&self, origin: ChainId, as_of: Timestamp) -> BTreeMap<Address, Stake> {
        self.remote_validators
            .get(&origin)
            .map(|set| {
                set.iter()
                    .filter(|(_, v)| v.removed_at.map_or(true, |at| as_of < at))
                    .map(|(addr, v)| (*addr, v.stake))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn active_mut(
        &mut self,
        participant: &Address,
        now: Timestamp,
    ) -> RegistryResult<&mut Participant> {
        let entry = self
            .participants
            .get_mut(participant)
            .ok_or(RegistryError::NotRegistered {
                participant: *participant,
            })?;
        match entry.status_at(now) {
            ParticipantStatus::Active => Ok(entry),
            ParticipantStatus::Slashed => Err(RegistryError::NotEligible {
                participant: *participant,
                reason: "slashed".to_string(),
            }),
            ParticipantStatus::Exited | ParticipantStatus::Unregistered => {
                Err(RegistryError::NotRegistered {
                    participant: *participant,
                })
            }
        }
    }
}

impl ParticipantRegistryApi for ParticipantRegistry {
    fn register(
        &mut self,
        participant: Address,
        role: Role,
        stake: Stake,
        now: Timestamp,
    ) -> RegistryResult<Participant> {
        let minimum = self.config.min_stake(role);
        if stake < minimum {
            return Err(RegistryError::InsufficientStake {
                role,
                stake,
                minimum,
            });
        }

        if let Some(existing) = self.participants.get(&participant) {
            match existing.status_at(now) {
                ParticipantStatus::Active => {
                    return Err(RegistryError::AlreadyRegistered { participant })
                }
                ParticipantStatus::Slashed => {
                    return Err(RegistryError::NotEligible {
                        participant,
                        reason: "slashed identities cannot re-register".to_string(),
                    })
                }
                ParticipantStatus::Exited | ParticipantStatus::Unregistered => {}
            }
        }

        let record = Participant::new(participant, role, stake, now);
        self.participants.insert(participant, record.clone());
        self.pending_events.push(RegistryEvent::Registered {
            participant,
            role,
            stake,
            at: now,
        });

        info!(
            "[xcr-01] Registered {} {} with stake {}",
            role,
            hex::encode(participant),
            stake
        );
        Ok(record)
    }

    fn deregister(&mut self, participant: Address, now: Timestamp) -> RegistryResult<Timestamp> {
        let cooldown = self.config.exit_cooldown_secs;
        let entry = self.active_mut(&participant, now)?;

        if let Some(exit_at) = entry.exit_at {
            // Exit already pending
            return Ok(exit_at);
        }

        let exit_at = now.saturating_add(cooldown);
        entry.exit_at = Some(exit_at);
        let role = entry.role;
        self.pending_events.push(RegistryEvent::ExitScheduled {
            participant,
            role,
            exit_at,
        });

        info!(
            "[xcr-01] Exit scheduled for {} at {}",
            hex::encode(participant),
            exit_at
        );
        Ok(exit_at)
    }

    fn is_eligible(&self, participant: &Address, role: Role, as_of: Timestamp) -> bool {
        self.participants
            .get(participant)
            .map_or(false, |p| p.is_eligible(role, as_of))
    }

    fn add_stake(
        &mut self,
        participant: Address,
        amount: Stake,
        now: Timestamp,
    ) -> RegistryResult<Stake> {
        let entry = self.active_mut(&participant, now)?;
        entry.stake = entry.stake.saturating_add(amount);
        let (role, stake) = (entry.role, entry.stake);
        self.pending_events.push(RegistryEvent::StakeChanged {
            participant,
            role,
            stake,
        });
        debug!("[xcr-01] Stake of {} now {}", hex::encode(participant), stake);
        Ok(stake)
    }

    fn slash(&mut self, participant: Address, now: Timestamp, reason: &str) -> RegistryResult<()> {
        let entry = self
            .participants
            .get_mut(&participant)
            .ok_or(RegistryError::NotRegistered { participant })?;

        match entry.status_at(now) {
            ParticipantStatus::Slashed => return Ok(()),
            ParticipantStatus::Active => {}
            _ => return Err(RegistryError::NotRegistered { participant }),
        }

        entry.mark_slashed();
        let role = entry.role;
        self.pending_events
            .push(RegistryEvent::Slashed { participant, role });

        warn!(
            "[xcr-01] Slashed {} {}: {}",
            role,
            hex::encode(participant),
            reason
        );
        Ok(())
    }

    fn eligible_set(&self, role: Role, as_of: Timestamp) -> BTreeMap<Address, Stake> {
        self.participants
            .values()
            .filter(|p| p.is_eligible(role, as_of))
            .map(|p| (p.address, p.stake))
            .collect()
    }

    fn status_of(&self, participant: &Address, as_of: Timestamp) -> ParticipantStatus {
        self.participants
            .get(participant)
            .map_or(ParticipantStatus::Unregistered, |p| p.status_at(as_of))
    }

    fn get(&self, participant: &Address) -> Option<&Participant> {
        self.participants.get(participant)
    }

    fn register_protocol(&mut self, protocol: Address, now: Timestamp) -> RegistryResult<Protocol> {
        if self.protocols.contains_key(&protocol) {
            return Err(RegistryError::ProtocolAlreadyRegistered { protocol });
        }
        let record = Protocol {
            address: protocol,
            registered_at: now,
        };
        self.protocols.insert(protocol, record.clone());
        info!("[xcr-01] Registered protocol {}", hex::encode(protocol));
        Ok(record)
    }

    fn is_protocol_registered(&self, protocol: &Address) -> bool {
        self.protocols.contains_key(protocol)
    }

    fn protocols(&self) -> Vec<&Protocol> {
        self.protocols.values().collect()
    }
}
