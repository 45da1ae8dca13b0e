//! # Inbound Ports
//!
//! API trait defining what the Participant Registry can do.

use std::collections::BTreeMap;

use crate::domain::{Participant, ParticipantStatus, Protocol, RegistryResult};
use shared_types::{Address, Role, Stake, Timestamp};

/// Participant registry API - inbound port.
///
/// Every mutation takes the transaction timestamp explicitly so that
/// replaying the same transactions yields the same state.
pub trait ParticipantRegistryApi {
    /// Register a participant under `role` with `stake`.
    fn register(
        &mut self,
        participant: Address,
        role: Role,
        stake: Stake,
        now: Timestamp,
    ) -> RegistryResult<Participant>;

    /// Schedule an exit; returns when it takes effect.
    fn deregister(&mut self, participant: Address, now: Timestamp) -> RegistryResult<Timestamp>;

    /// Pure eligibility query.
    fn is_eligible(&self, participant: &Address, role: Role, as_of: Timestamp) -> bool;

    /// Increase the stake of an active participant; returns the new stake.
    fn add_stake(
        &mut self,
        participant: Address,
        amount: Stake,
        now: Timestamp,
    ) -> RegistryResult<Stake>;

    /// Mark an active participant slashed.
    fn slash(&mut self, participant: Address, now: Timestamp, reason: &str) -> RegistryResult<()>;

    /// Eligible participants of `role` with their stake, ordered by address.
    fn eligible_set(&self, role: Role, as_of: Timestamp) -> BTreeMap<Address, Stake>;

    /// Status of `participant` as of a timestamp.
    fn status_of(&self, participant: &Address, as_of: Timestamp) -> ParticipantStatus;

    /// Look up a participant.
    fn get(&self, participant: &Address) -> Option<&Participant>;

    /// Register a governed protocol by its governor address.
    fn register_protocol(&mut self, protocol: Address, now: Timestamp) -> RegistryResult<Protocol>;

    /// True if proposals may target `protocol`.
    fn is_protocol_registered(&self, protocol: &Address) -> bool;

    /// Registered protocols, ordered by address.
    fn protocols(&self) -> Vec<&Protocol>;
}
