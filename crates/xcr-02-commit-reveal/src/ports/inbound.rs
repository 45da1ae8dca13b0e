//! # Inbound Ports
//!
//! API trait defining what the Commit-Reveal Engine can do.

use std::collections::BTreeMap;

use super::outbound::EligibilityOracle;
use crate::domain::{CommitRevealResult, RoundOutcome, RoundPhase, RoundState, ScoreAggregate};
use shared_types::{Address, Hash, ProposalId, RevealValue, Round, Stake, Timestamp};

/// Commit-reveal API - inbound port.
pub trait CommitRevealApi {
    /// Open `round` for `proposal` with a fixed eligible snapshot.
    fn open_round(
        &mut self,
        proposal: ProposalId,
        round: Round,
        eligible: BTreeMap<Address, Stake>,
        now: Timestamp,
    ) -> CommitRevealResult<()>;

    /// Submit hash(value ‖ salt) during the commit window.
    fn submit_commitment(
        &mut self,
        oracle: &dyn EligibilityOracle,
        participant: Address,
        proposal: ProposalId,
        round: Round,
        hash: Hash,
        now: Timestamp,
    ) -> CommitRevealResult<()>;

    /// Disclose a committed value during the reveal window.
    fn submit_reveal(
        &mut self,
        participant: Address,
        proposal: ProposalId,
        round: Round,
        value: RevealValue,
        salt: &[u8],
        now: Timestamp,
    ) -> CommitRevealResult<()>;

    /// Apply deadline closures due at `now` and return the phase.
    fn advance(
        &mut self,
        proposal: ProposalId,
        round: Round,
        now: Timestamp,
    ) -> CommitRevealResult<RoundPhase>;

    /// Round state, if opened.
    fn round(&self, proposal: ProposalId, round: Round) -> Option<&RoundState>;

    /// Running (or final) aggregate.
    fn aggregate(&self, proposal: ProposalId, round: Round) -> CommitRevealResult<&ScoreAggregate>;

    /// Outcome of a closed round.
    fn outcome(&self, proposal: ProposalId, round: Round) -> CommitRevealResult<RoundOutcome>;
}
