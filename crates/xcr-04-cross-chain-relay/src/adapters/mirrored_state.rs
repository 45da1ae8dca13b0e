//! Mirrored State Adapter
//!
//! Implements `MirrorSink` over the destination chain's Proposal Store and
//! Participant Registry.

use shared_types::ChainId;
use xcr_01_participant_registry::ParticipantRegistry;
use xcr_03_proposal_store::{ProposalStore, ProposalStoreApi};

use crate::domain::RelayPayload;
use crate::ports::MirrorSink;

/// Destination-side mirror.
pub struct MirroredState<'a> {
    proposals: &'a mut ProposalStore,
    registry: &'a mut ParticipantRegistry,
}

impl<'a> MirroredState<'a> {
    /// Borrow the stores to mirror into.
    pub fn new(proposals: &'a mut ProposalStore, registry: &'a mut ParticipantRegistry) -> Self {
        Self {
            proposals,
            registry,
        }
    }
}

impl MirrorSink for MirroredState<'_> {
    fn apply(&mut self, origin: ChainId, payload: RelayPayload) -> Result<bool, String> {
        match payload {
            RelayPayload::ProposalOutcome {
                proposal,
                aggregate,
            } => self
                .proposals
                .apply_mirrored(origin, proposal, aggregate)
                .map_err(|e| e.to_string()),
            RelayPayload::ValidatorSetUpdate { changes } => {
                for change in &changes {
                    self.registry.apply_remote_update(origin, change);
                }
                Ok(!changes.is_empty())
            }
        }
    }
}
