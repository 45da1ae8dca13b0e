//! Commit-Reveal Engine - core business logic

use serde::{Deserialize, Serialize};
use shared_types::{
    verify_commitment, Address, Hash, ProposalId, RevealValue, Round, Stake, Timestamp,
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::domain::{
    score_in_range, AggregationPolicy, CommitRevealConfig, CommitRevealError, CommitRevealResult,
    Commitment, Reveal, RoundOutcome, RoundPhase, RoundState, ScoreAggregate,
};
use crate::ports::{CommitRevealApi, EligibilityOracle};

/// Commit-reveal engine for one chain.
///
/// Holds every round keyed by (proposal, round). Deadlines are applied
/// lazily: each call first closes whatever windows have elapsed at `now`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CommitRevealEngine {
    config: CommitRevealConfig,
    rounds: BTreeMap<(ProposalId, Round), RoundState>,
}

impl CommitRevealEngine {
    /// Create an engine.
    pub fn new(config: CommitRevealConfig) -> Self {
        Self {
            config,
            rounds: BTreeMap::new(),
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &CommitRevealConfig {
        &self.config
    }

    /// Number of rounds ever opened.
    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    fn round_mut(
        &mut self,
        proposal: ProposalId,
        round: Round,
        now: Timestamp,
    ) -> CommitRevealResult<&mut RoundState> {
        let reveal_window = self.config.reveal_window_secs;
        let state = self
            .rounds
            .get_mut(&(proposal, round))
            .ok_or(CommitRevealError::RoundNotFound { proposal, round })?;
        if state.apply_deadlines(now, reveal_window) {
            info!(
                "[xcr-02] {} round of proposal {} moved to {:?} on deadline",
                round,
                proposal,
                state.phase()
            );
        }
        Ok(state)
    }
}

fn weight_of(policy: AggregationPolicy, state: &RoundState, participant: &Address) -> Stake {
    match policy {
        AggregationPolicy::StakeWeightedMean => {
            state.eligible.get(participant).copied().unwrap_or_default()
        }
        AggregationPolicy::UnweightedMean => 1,
    }
}

impl CommitRevealApi for CommitRevealEngine {
    fn open_round(
        &mut self,
        proposal: ProposalId,
        round: Round,
        eligible: BTreeMap<Address, Stake>,
        now: Timestamp,
    ) -> CommitRevealResult<()> {
        if self.rounds.contains_key(&(proposal, round)) {
            return Err(CommitRevealError::RoundAlreadyOpen { proposal, round });
        }

        let state = RoundState::new(
            proposal,
            round,
            eligible,
            now,
            self.config.commit_window_secs,
        );
        info!(
            "[xcr-02] Opened {} round of proposal {} ({} eligible, commit until {})",
            round,
            proposal,
            state.eligible.len(),
            state.commit_deadline
        );
        self.rounds.insert((proposal, round), state);
        Ok(())
    }

    fn submit_commitment(
        &mut self,
        oracle: &dyn EligibilityOracle,
        participant: Address,
        proposal: ProposalId,
        round: Round,
        hash: Hash,
        now: Timestamp,
    ) -> CommitRevealResult<()> {
        let reveal_window = self.config.reveal_window_secs;
        let quorum_bps = self.config.quorum_bps;
        let phase = round.commit_phase();
        let state = self.round_mut(proposal, round, now)?;

        // A committer stays a duplicate after the window closes.
        if state.commitments.contains_key(&participant) {
            return Err(CommitRevealError::DuplicateCommitment {
                participant,
                proposal,
                phase,
            });
        }
        if state.phase() != RoundPhase::Commit {
            return Err(CommitRevealError::PhaseNotOpen { proposal, phase });
        }
        if !state.eligible.contains_key(&participant)
            || !oracle.is_eligible(&participant, round.required_role(), now)
        {
            return Err(CommitRevealError::NotEligible {
                participant,
                proposal,
                round,
            });
        }

        state.commitments.insert(
            participant,
            Commitment {
                participant,
                proposal,
                hash,
                phase,
                submitted_at: now,
            },
        );
        debug!(
            "[xcr-02] Commitment from {} in {} of proposal {}",
            hex::encode(participant),
            phase,
            proposal
        );

        let quorum = state.quorum(quorum_bps);
        if state.commitments.len() >= quorum {
            state.close_commit(now, reveal_window);
            info!(
                "[xcr-02] Commit window of proposal {} ({}) closed by quorum {}",
                proposal, round, quorum
            );
        }
        Ok(())
    }

    fn submit_reveal(
        &mut self,
        participant: Address,
        proposal: ProposalId,
        round: Round,
        value: RevealValue,
        salt: &[u8],
        now: Timestamp,
    ) -> CommitRevealResult<()> {
        let quorum_bps = self.config.quorum_bps;
        let max_score = self.config.max_score;
        let policy = self.config.aggregation;
        let phase = round.reveal_phase();

        let state = self.round_mut(proposal, round, now)?;
        if state.phase() != RoundPhase::Reveal {
            return Err(CommitRevealError::PhaseNotOpen { proposal, phase });
        }
        let commitment = match state.commitments.get(&participant) {
            Some(c) if !state.reveals.contains_key(&participant) => c,
            _ => {
                return Err(CommitRevealError::NoMatchingCommitment {
                    participant,
                    proposal,
                    phase,
                })
            }
        };
        if !verify_commitment(&value, salt, &commitment.hash) {
            warn!(
                "[xcr-02] Hash mismatch from {} on proposal {}",
                hex::encode(participant),
                proposal
            );
            return Err(CommitRevealError::HashMismatch {
                participant,
                proposal,
            });
        }
        let score = match round {
            Round::Validator => Some(score_in_range(value.as_score(), max_score).ok_or_else(
                || CommitRevealError::MalformedValue {
                    participant,
                    reason: format!("score word outside 0..={}", max_score),
                },
            )?),
            Round::Miner => None,
        };

        let weight = weight_of(policy, state, &participant);
        match score {
            Some(score) => state.aggregate.record_score(score, weight),
            None => state.aggregate.record_content(value.0, weight),
        }
        state.reveals.insert(
            participant,
            Reveal {
                participant,
                proposal,
                value,
                salt: salt.to_vec(),
                revealed_at: now,
            },
        );
        debug!(
            "[xcr-02] Reveal from {} in {} of proposal {} (weight {})",
            hex::encode(participant),
            phase,
            proposal,
            weight
        );

        if state.reveals.len() >= state.quorum(quorum_bps) || state.all_revealed() {
            state.close_reveal(now);
            info!(
                "[xcr-02] {} round of proposal {} closed with {} reveals",
                round,
                proposal,
                state.aggregate.valid_reveals
            );
        }
        Ok(())
    }

    fn advance(
        &mut self,
        proposal: ProposalId,
        round: Round,
        now: Timestamp,
    ) -> CommitRevealResult<RoundPhase> {
        Ok(self.round_mut(proposal, round, now)?.phase())
    }

    fn round(&self, proposal: ProposalId, round: Round) -> Option<&RoundState> {
        self.rounds.get(&(proposal, round))
    }

    fn aggregate(
        &self,
        proposal: ProposalId,
        round: Round,
    ) -> CommitRevealResult<&ScoreAggregate> {
        self.rounds
            .get(&(proposal, round))
            .map(|state| &state.aggregate)
            .ok_or(CommitRevealError::RoundNotFound { proposal, round })
    }

    fn outcome(&self, proposal: ProposalId, round: Round) -> CommitRevealResult<RoundOutcome> {
        let state = self
            .rounds
            .get(&(proposal, round))
            .ok_or(CommitRevealError::RoundNotFound { proposal, round })?;
        if state.phase() != RoundPhase::Closed {
            return Err(CommitRevealError::RoundNotClosed { proposal, round });
        }
        Ok(RoundOutcome {
            aggregate: state.aggregate.clone(),
            no_shows: state.no_shows(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::AlwaysEligible;
    use crate::domain::NonRevealPolicy;
    use proptest::prelude::*;
    use shared_types::{commitment_hash, keccak256, Role};

    const V1: Address = [1u8; 20];
    const V2: Address = [2u8; 20];
    const V3: Address = [3u8; 20];

    fn config() -> CommitRevealConfig {
        CommitRevealConfig {
            commit_window_secs: 100,
            reveal_window_secs: 100,
            quorum_bps: 10_000,
            max_score: 100,
            aggregation: AggregationPolicy::StakeWeightedMean,
            non_reveal_policy: NonRevealPolicy::Exclude,
        }
    }

    fn snapshot(members: &[(Address, Stake)]) -> BTreeMap<Address, Stake> {
        members.iter().copied().collect()
    }

    fn engine_with(members: &[(Address, Stake)], round: Round) -> CommitRevealEngine {
        let mut engine = CommitRevealEngine::new(config());
        engine.open_round(1, round, snapshot(members), 1000).unwrap();
        engine
    }

    fn commit_score(engine: &mut CommitRevealEngine, who: Address, score: u64, now: Timestamp) {
        let hash = commitment_hash(&RevealValue::from_score(score), &who);
        engine
            .submit_commitment(&AlwaysEligible, who, 1, Round::Validator, hash, now)
            .unwrap();
    }

    fn reveal_score(
        engine: &mut CommitRevealEngine,
        who: Address,
        score: u64,
        now: Timestamp,
    ) -> CommitRevealResult<()> {
        engine.submit_reveal(who, 1, Round::Validator, RevealValue::from_score(score), &who, now)
    }

    struct Denied;

    impl EligibilityOracle for Denied {
        fn is_eligible(&self, _: &Address, _: Role, _: Timestamp) -> bool {
            false
        }

        fn is_protocol_registered(&self, _: &Address) -> bool {
            false
        }
    }

    #[test]
    fn test_full_validator_round() {
        let mut engine = engine_with(&[(V1, 50), (V2, 50)], Round::Validator);
        commit_score(&mut engine, V1, 80, 1001);
        assert_eq!(engine.advance(1, Round::Validator, 1001).unwrap(), RoundPhase::Commit);
        commit_score(&mut engine, V2, 90, 1002);

        // Quorum of all eligible closes commit immediately
        assert_eq!(engine.advance(1, Round::Validator, 1002).unwrap(), RoundPhase::Reveal);

        reveal_score(&mut engine, V1, 80, 1003).unwrap();
        reveal_score(&mut engine, V2, 90, 1004).unwrap();
        assert_eq!(engine.advance(1, Round::Validator, 1004).unwrap(), RoundPhase::Closed);

        let outcome = engine.outcome(1, Round::Validator).unwrap();
        assert_eq!(outcome.aggregate.score(), Some(85));
        assert_eq!(outcome.aggregate.valid_reveals, 2);
        assert!(outcome.aggregate.finalized);
        assert!(outcome.no_shows.is_empty());
    }

    #[test]
    fn test_miner_round_resolves_content() {
        let content = keccak256(b"contentA");
        let mut engine = engine_with(&[(V1, 100)], Round::Miner);
        let hash = commitment_hash(&RevealValue::from_hash(content), b"saltA");
        engine
            .submit_commitment(&AlwaysEligible, V1, 1, Round::Miner, hash, 1001)
            .unwrap();
        engine
            .submit_reveal(V1, 1, Round::Miner, RevealValue::from_hash(content), b"saltA", 1002)
            .unwrap();

        let outcome = engine.outcome(1, Round::Miner).unwrap();
        assert_eq!(outcome.aggregate.resolved_content(), Some(content));
    }

    #[test]
    fn test_open_round_twice_fails() {
        let mut engine = engine_with(&[(V1, 50)], Round::Validator);
        let err = engine
            .open_round(1, Round::Validator, BTreeMap::new(), 1000)
            .unwrap_err();
        assert_eq!(
            err,
            CommitRevealError::RoundAlreadyOpen {
                proposal: 1,
                round: Round::Validator
            }
        );
    }

    #[test]
    fn test_unknown_round() {
        let mut engine = CommitRevealEngine::new(config());
        assert!(matches!(
            engine.advance(9, Round::Miner, 0),
            Err(CommitRevealError::RoundNotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_commitment() {
        let mut engine = engine_with(&[(V1, 50), (V2, 50)], Round::Validator);
        commit_score(&mut engine, V1, 80, 1001);
        let err = engine
            .submit_commitment(&AlwaysEligible, V1, 1, Round::Validator, [7u8; 32], 1002)
            .unwrap_err();
        assert!(matches!(err, CommitRevealError::DuplicateCommitment { .. }));
    }

    #[test]
    fn test_commit_outside_snapshot_not_eligible() {
        let mut engine = engine_with(&[(V1, 50)], Round::Validator);
        let err = engine
            .submit_commitment(&AlwaysEligible, V3, 1, Round::Validator, [0u8; 32], 1001)
            .unwrap_err();
        assert!(matches!(err, CommitRevealError::NotEligible { .. }));
    }

    #[test]
    fn test_commit_rejected_by_oracle() {
        let mut engine = engine_with(&[(V1, 50)], Round::Validator);
        let err = engine
            .submit_commitment(&Denied, V1, 1, Round::Validator, [0u8; 32], 1001)
            .unwrap_err();
        assert!(matches!(err, CommitRevealError::NotEligible { .. }));
    }

    #[test]
    fn test_commit_after_deadline_phase_not_open() {
        let mut engine = engine_with(&[(V1, 50), (V2, 50)], Round::Validator);
        commit_score(&mut engine, V1, 80, 1001);
        let err = engine
            .submit_commitment(&AlwaysEligible, V2, 1, Round::Validator, [0u8; 32], 1100)
            .unwrap_err();
        assert!(matches!(err, CommitRevealError::PhaseNotOpen { .. }));
    }

    #[test]
    fn test_reveal_during_commit_phase_not_open() {
        let mut engine = engine_with(&[(V1, 50), (V2, 50)], Round::Validator);
        commit_score(&mut engine, V1, 80, 1001);
        assert!(matches!(
            reveal_score(&mut engine, V1, 80, 1002),
            Err(CommitRevealError::PhaseNotOpen { .. })
        ));
    }

    #[test]
    fn test_late_reveal_phase_not_open_even_with_matching_hash() {
        let mut engine = engine_with(&[(V1, 50), (V2, 50)], Round::Validator);
        commit_score(&mut engine, V1, 80, 1001);
        commit_score(&mut engine, V2, 90, 1002);
        // Commit closed at 1002, reveal deadline 1102
        reveal_score(&mut engine, V1, 80, 1050).unwrap();
        let err = reveal_score(&mut engine, V2, 90, 1102).unwrap_err();
        assert!(matches!(err, CommitRevealError::PhaseNotOpen { .. }));

        let outcome = engine.outcome(1, Round::Validator).unwrap();
        assert_eq!(outcome.aggregate.score(), Some(80));
        assert_eq!(outcome.no_shows, vec![V2]);
    }

    #[test]
    fn test_reveal_without_commitment() {
        let mut engine = engine_with(&[(V1, 50), (V2, 50)], Round::Validator);
        commit_score(&mut engine, V1, 80, 1001);
        engine.advance(1, Round::Validator, 1100).unwrap();
        assert!(matches!(
            reveal_score(&mut engine, V2, 90, 1101),
            Err(CommitRevealError::NoMatchingCommitment { .. })
        ));
    }

    #[test]
    fn test_hash_mismatch_leaves_commitment_open() {
        let mut engine = engine_with(&[(V1, 50)], Round::Validator);
        commit_score(&mut engine, V1, 80, 1001);
        assert!(matches!(
            reveal_score(&mut engine, V1, 81, 1002),
            Err(CommitRevealError::HashMismatch { .. })
        ));
        reveal_score(&mut engine, V1, 80, 1003).unwrap();
    }

    #[test]
    fn test_second_reveal_rejected() {
        let mut engine = engine_with(&[(V1, 50), (V2, 50), (V3, 50)], Round::Validator);
        commit_score(&mut engine, V1, 80, 1001);
        commit_score(&mut engine, V2, 80, 1001);
        engine.advance(1, Round::Validator, 1100).unwrap();
        reveal_score(&mut engine, V1, 80, 1101).unwrap();
        assert!(matches!(
            reveal_score(&mut engine, V1, 80, 1102),
            Err(CommitRevealError::NoMatchingCommitment { .. })
        ));
    }

    #[test]
    fn test_malformed_score() {
        let mut engine = engine_with(&[(V1, 50)], Round::Validator);
        commit_score(&mut engine, V1, 101, 1001);
        let err = reveal_score(&mut engine, V1, 101, 1002).unwrap_err();
        assert!(matches!(err, CommitRevealError::MalformedValue { .. }));
    }

    #[test]
    fn test_partial_quorum_closes_early() {
        let mut engine = CommitRevealEngine::new(CommitRevealConfig {
            quorum_bps: 5_000,
            ..config()
        });
        engine
            .open_round(1, Round::Validator, snapshot(&[(V1, 50), (V2, 50), (V3, 50)]), 1000)
            .unwrap();
        commit_score(&mut engine, V1, 70, 1001);
        assert_eq!(engine.advance(1, Round::Validator, 1001).unwrap(), RoundPhase::Commit);
        commit_score(&mut engine, V2, 90, 1002);
        assert_eq!(engine.advance(1, Round::Validator, 1002).unwrap(), RoundPhase::Reveal);
    }

    #[test]
    fn test_unweighted_mean() {
        let mut engine = CommitRevealEngine::new(CommitRevealConfig {
            aggregation: AggregationPolicy::UnweightedMean,
            ..config()
        });
        engine
            .open_round(1, Round::Validator, snapshot(&[(V1, 300), (V2, 100)]), 1000)
            .unwrap();
        commit_score(&mut engine, V1, 100, 1001);
        commit_score(&mut engine, V2, 50, 1001);
        reveal_score(&mut engine, V1, 100, 1002).unwrap();
        reveal_score(&mut engine, V2, 50, 1002).unwrap();
        assert_eq!(engine.outcome(1, Round::Validator).unwrap().aggregate.score(), Some(75));
    }

    #[test]
    fn test_outcome_before_close() {
        let engine = engine_with(&[(V1, 50)], Round::Validator);
        assert!(matches!(
            engine.outcome(1, Round::Validator),
            Err(CommitRevealError::RoundNotClosed { .. })
        ));
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut engine = engine_with(&[(V1, 50), (V2, 50)], Round::Validator);
        commit_score(&mut engine, V1, 80, 1001);
        let bytes = bincode::serialize(&engine).unwrap();
        let mut restored: CommitRevealEngine = bincode::deserialize(&bytes).unwrap();
        assert!(matches!(
            restored.submit_commitment(&AlwaysEligible, V1, 1, Round::Validator, [0u8; 32], 1002),
            Err(CommitRevealError::DuplicateCommitment { .. })
        ));
    }

    fn members_and_order() -> impl Strategy<Value = (Vec<(u128, u64)>, Vec<usize>)> {
        prop::collection::vec((1u128..1_000, 0u64..=100), 1..8).prop_flat_map(|members| {
            let order: Vec<usize> = (0..members.len()).collect();
            (Just(members), Just(order).prop_shuffle())
        })
    }

    fn run_round(members: &[(u128, u64)], order: &[usize]) -> ScoreAggregate {
        let addrs: Vec<Address> = (0..members.len()).map(|i| [i as u8 + 1; 20]).collect();
        let eligible = addrs
            .iter()
            .zip(members)
            .map(|(a, (stake, _))| (*a, *stake))
            .collect();
        let mut engine = CommitRevealEngine::new(config());
        engine.open_round(1, Round::Validator, eligible, 1000).unwrap();
        for &i in order {
            commit_score(&mut engine, addrs[i], members[i].1, 1001);
        }
        for &i in order {
            reveal_score(&mut engine, addrs[i], members[i].1, 1002).unwrap();
        }
        engine.outcome(1, Round::Validator).unwrap().aggregate
    }

    proptest! {
        #[test]
        fn prop_aggregate_invariant_under_reveal_order((members, order) in members_and_order()) {
            let natural: Vec<usize> = (0..members.len()).collect();
            prop_assert_eq!(run_round(&members, &natural), run_round(&members, &order));
        }

        #[test]
        fn prop_duplicate_commitment_always_rejected(
            first in any::<[u8; 32]>(),
            second in any::<[u8; 32]>(),
            other_first in any::<bool>(),
            other_after in any::<bool>(),
            members in 2usize..=3,
        ) {
            let all = [(V1, 50), (V2, 50), (V3, 50)];
            let mut engine = engine_with(&all[..members], Round::Validator);
            if other_first {
                engine.submit_commitment(&AlwaysEligible, V2, 1, Round::Validator, second, 1001).unwrap();
            }
            engine.submit_commitment(&AlwaysEligible, V1, 1, Round::Validator, first, 1001).unwrap();
            if other_after && !other_first {
                // With two members this closes the commit window by quorum.
                engine.submit_commitment(&AlwaysEligible, V2, 1, Round::Validator, second, 1001).unwrap();
            }
            let err = engine
                .submit_commitment(&AlwaysEligible, V1, 1, Round::Validator, second, 1002)
                .unwrap_err();
            prop_assert!(
                matches!(err, CommitRevealError::DuplicateCommitment { .. }),
                "expected DuplicateCommitment, got {:?}",
                err
            );
        }
    }

    #[test]
    fn test_duplicate_after_quorum_close_is_duplicate() {
        let mut engine = engine_with(&[(V1, 50), (V2, 50)], Round::Validator);
        commit_score(&mut engine, V1, 80, 1001);
        commit_score(&mut engine, V2, 90, 1002);
        assert_eq!(engine.advance(1, Round::Validator, 1003).unwrap(), RoundPhase::Reveal);

        let again = commitment_hash(&RevealValue::from_score(70), &V1);
        let err = engine
            .submit_commitment(&AlwaysEligible, V1, 1, Round::Validator, again, 1003)
            .unwrap_err();
        assert!(matches!(err, CommitRevealError::DuplicateCommitment { .. }));

        let late = engine
            .submit_commitment(&AlwaysEligible, V3, 1, Round::Validator, again, 1003)
            .unwrap_err();
        assert!(matches!(late, CommitRevealError::PhaseNotOpen { .. }));
    }
}
