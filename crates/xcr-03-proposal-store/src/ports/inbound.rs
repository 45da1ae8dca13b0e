//! # Inbound Ports
//!
//! API trait defining what the Proposal Store can do.

use crate::domain::{FinalizedProposal, Proposal, ProposalResult, ProposalStatus};
use shared_types::{Address, ChainId, Hash, ProposalId, Round, Timestamp};
use xcr_02_commit_reveal::{EligibilityOracle, RoundPhase, ScoreAggregate};

/// Proposal store API - inbound port.
pub trait ProposalStoreApi {
    /// Create a proposal against a registered protocol; it opens straight
    /// into the miner commit phase.
    fn create(
        &mut self,
        oracle: &dyn EligibilityOracle,
        protocol: Address,
        originator: Address,
        payload_hash: Hash,
        now: Timestamp,
    ) -> ProposalResult<Proposal>;

    /// Sync the lifecycle with the engine's view of `round`.
    ///
    /// `aggregate` is the round's final aggregate once `phase` is `Closed`.
    fn advance(
        &mut self,
        id: ProposalId,
        round: Round,
        phase: RoundPhase,
        aggregate: Option<&ScoreAggregate>,
    ) -> ProposalResult<ProposalStatus>;

    /// Move a scored proposal to `propagated` and hand it off.
    fn finalize(&mut self, id: ProposalId) -> ProposalResult<FinalizedProposal>;

    /// Record a successful bridge submission.
    fn mark_submitted(&mut self, id: ProposalId, nonce: u64, receipt: String)
        -> ProposalResult<()>;

    /// Abandon a non-terminal proposal.
    fn reject(&mut self, id: ProposalId, reason: &str) -> ProposalResult<()>;

    /// Insert a read-only copy of a proposal finalized on `origin`.
    ///
    /// Returns false if the copy already exists.
    fn apply_mirrored(
        &mut self,
        origin: ChainId,
        proposal: Proposal,
        aggregate: ScoreAggregate,
    ) -> ProposalResult<bool>;

    /// Mirrored copy, if any.
    fn mirrored(&self, origin: ChainId, id: ProposalId) -> Option<&Proposal>;

    /// Local proposal.
    fn get(&self, id: ProposalId) -> ProposalResult<&Proposal>;

    /// All local proposals ordered by id.
    fn list(&self) -> Vec<&Proposal>;

    /// Non-terminal proposal by `originator` for `protocol` with `payload_hash`.
    fn find_open_by(
        &self,
        protocol: &Address,
        originator: &Address,
        payload_hash: &Hash,
    ) -> Option<&Proposal>;
}
