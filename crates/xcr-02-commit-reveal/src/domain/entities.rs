//! # Domain Entities
//!
//! Commitments, reveals and the per-(proposal, round) state machine.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash, Phase, ProposalId, RevealValue, Round, Stake, Timestamp};
use std::collections::BTreeMap;

use super::aggregate::ScoreAggregate;
use super::invariants::{quorum_threshold, window_elapsed};

/// A binding commitment to a hidden value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    /// Committer.
    pub participant: Address,
    /// Proposal ID.
    pub proposal: ProposalId,
    /// hash(value ‖ salt).
    pub hash: Hash,
    /// Commit phase.
    pub phase: Phase,
    /// Submission time.
    pub submitted_at: Timestamp,
}

/// A disclosed value matching a commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reveal {
    /// Revealer.
    pub participant: Address,
    /// Proposal ID.
    pub proposal: ProposalId,
    /// Revealed value.
    pub value: RevealValue,
    /// Salt used in the commitment.
    pub salt: Vec<u8>,
    /// Reveal time.
    pub revealed_at: Timestamp,
}

/// Where a round stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Accepting commitments.
    Commit,
    /// Accepting reveals.
    Reveal,
    /// Terminal; aggregate finalized.
    Closed,
}

/// State of one round of one proposal.
///
/// State Machine:
/// ```text
/// [COMMIT] ──deadline | quorum──→ [REVEAL] ──deadline | quorum | all revealed──→ [CLOSED]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    /// Proposal ID.
    pub proposal: ProposalId,
    /// Round.
    pub round: Round,
    /// Eligible participants and their stake when the round opened.
    pub eligible: BTreeMap<Address, Stake>,
    /// Opening time.
    pub opened_at: Timestamp,
    /// Commit window deadline (exclusive).
    pub commit_deadline: Timestamp,
    /// When the commit window actually closed.
    pub commit_closed_at: Option<Timestamp>,
    /// Reveal window deadline (exclusive), known once commit closes.
    pub reveal_deadline: Option<Timestamp>,
    /// When the reveal window closed.
    pub reveal_closed_at: Option<Timestamp>,
    /// One commitment per participant.
    pub commitments: BTreeMap<Address, Commitment>,
    /// At most one reveal per commitment.
    pub reveals: BTreeMap<Address, Reveal>,
    /// Running aggregate.
    pub aggregate: ScoreAggregate,
}

impl RoundState {
    /// Open a round at `now`.
    pub fn new(
        proposal: ProposalId,
        round: Round,
        eligible: BTreeMap<Address, Stake>,
        now: Timestamp,
        commit_window_secs: u64,
    ) -> Self {
        Self {
            proposal,
            round,
            eligible,
            opened_at: now,
            commit_deadline: now.saturating_add(commit_window_secs),
            commit_closed_at: None,
            reveal_deadline: None,
            reveal_closed_at: None,
            commitments: BTreeMap::new(),
            reveals: BTreeMap::new(),
            aggregate: ScoreAggregate::new(proposal, round),
        }
    }

    /// Current phase from the recorded closures.
    pub fn phase(&self) -> RoundPhase {
        if self.reveal_closed_at.is_some() {
            RoundPhase::Closed
        } else if self.commit_closed_at.is_some() {
            RoundPhase::Reveal
        } else {
            RoundPhase::Commit
        }
    }

    /// Protocol phase a submission would target right now.
    pub fn protocol_phase(&self) -> Phase {
        match self.phase() {
            RoundPhase::Commit => self.round.commit_phase(),
            _ => self.round.reveal_phase(),
        }
    }

    /// Early-close threshold.
    pub fn quorum(&self, quorum_bps: u32) -> usize {
        quorum_threshold(self.eligible.len(), quorum_bps)
    }

    /// True once every committer has revealed.
    pub fn all_revealed(&self) -> bool {
        self.reveals.len() == self.commitments.len()
    }

    /// Committers that never revealed, ordered by address.
    pub fn no_shows(&self) -> Vec<Address> {
        self.commitments
            .keys()
            .filter(|addr| !self.reveals.contains_key(*addr))
            .copied()
            .collect()
    }

    pub(crate) fn close_commit(&mut self, at: Timestamp, reveal_window_secs: u64) {
        self.commit_closed_at = Some(at);
        self.reveal_deadline = Some(at.saturating_add(reveal_window_secs));
        if self.commitments.is_empty() {
            // Nothing to reveal
            self.close_reveal(at);
        }
    }

    pub(crate) fn close_reveal(&mut self, at: Timestamp) {
        self.reveal_closed_at = Some(at);
        self.aggregate.finalize();
    }

    /// Apply any deadline closures due at `now`. Returns true if the phase changed.
    pub(crate) fn apply_deadlines(&mut self, now: Timestamp, reveal_window_secs: u64) -> bool {
        let before = self.phase();
        if self.phase() == RoundPhase::Commit && window_elapsed(now, self.commit_deadline) {
            self.close_commit(self.commit_deadline, reveal_window_secs);
        }
        if self.phase() == RoundPhase::Reveal {
            if let Some(deadline) = self.reveal_deadline {
                if window_elapsed(now, deadline) {
                    self.close_reveal(deadline);
                }
            }
        }
        before != self.phase()
    }
}

/// Result of a closed round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Finalized aggregate.
    pub aggregate: ScoreAggregate,
    /// Committers that never revealed.
    pub no_shows: Vec<Address>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round() -> RoundState {
        let mut eligible = BTreeMap::new();
        eligible.insert([1u8; 20], 100);
        RoundState::new(1, Round::Miner, eligible, 1000, 600)
    }

    #[test]
    fn test_new_round_in_commit() {
        let r = round();
        assert_eq!(r.phase(), RoundPhase::Commit);
        assert_eq!(r.commit_deadline, 1600);
        assert_eq!(r.protocol_phase(), Phase::MinerCommit);
    }

    #[test]
    fn test_deadline_with_no_commitments_closes_round() {
        let mut r = round();
        assert!(!r.apply_deadlines(1599, 600));
        assert!(r.apply_deadlines(1600, 600));
        assert_eq!(r.phase(), RoundPhase::Closed);
        assert!(r.aggregate.finalized);
    }

    #[test]
    fn test_reveal_deadline_follows_commit_close() {
        let mut r = round();
        r.commitments.insert(
            [1u8; 20],
            Commitment {
                participant: [1u8; 20],
                proposal: 1,
                hash: [0u8; 32],
                phase: Phase::MinerCommit,
                submitted_at: 1001,
            },
        );
        r.close_commit(1100, 600);
        assert_eq!(r.phase(), RoundPhase::Reveal);
        assert_eq!(r.reveal_deadline, Some(1700));
        assert_eq!(r.no_shows(), vec![[1u8; 20]]);

        r.apply_deadlines(1700, 600);
        assert_eq!(r.phase(), RoundPhase::Closed);
        assert_eq!(r.reveal_closed_at, Some(1700));
    }
}
