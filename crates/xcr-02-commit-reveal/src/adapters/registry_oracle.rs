//! # Registry Oracle
//!
//! Eligibility answered by the Participant Registry.

use shared_types::{Address, Role, Timestamp};
use xcr_01_participant_registry::{ParticipantRegistry, ParticipantRegistryApi};

use crate::ports::EligibilityOracle;

impl EligibilityOracle for ParticipantRegistry {
    fn is_eligible(&self, participant: &Address, role: Role, as_of: Timestamp) -> bool {
        ParticipantRegistryApi::is_eligible(self, participant, role, as_of)
    }

    fn is_protocol_registered(&self, protocol: &Address) -> bool {
        ParticipantRegistryApi::is_protocol_registered(self, protocol)
    }
}

/// Oracle that defers entirely to the round snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysEligible;

impl EligibilityOracle for AlwaysEligible {
    fn is_eligible(&self, _participant: &Address, _role: Role, _as_of: Timestamp) -> bool {
        true
    }

    fn is_protocol_registered(&self, _protocol: &Address) -> bool {
        true
    }
}
