//! # Score Aggregate
//!
//! Running aggregate of a round, updated once per valid reveal.
//!
//! Every update is a commutative addition so the aggregate is a function
//! of the set of reveals, never of their arrival order.

use serde::{Deserialize, Serialize};
use shared_types::{Hash, ProposalId, Round};
use std::collections::BTreeMap;

/// Aggregate over the valid reveals of one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreAggregate {
    /// Proposal ID.
    pub proposal: ProposalId,
    /// Round.
    pub round: Round,
    /// Number of valid reveals.
    pub valid_reveals: u32,
    /// Σ wᵢ·scoreᵢ (validator round).
    pub weighted_sum: u128,
    /// Σ wᵢ.
    pub total_weight: u128,
    /// Summed weight per revealed content hash (miner round).
    pub content_tally: BTreeMap<Hash, u128>,
    /// Set when the reveal window closes.
    pub finalized: bool,
}

impl ScoreAggregate {
    /// Empty aggregate.
    pub fn new(proposal: ProposalId, round: Round) -> Self {
        Self {
            proposal,
            round,
            valid_reveals: 0,
            weighted_sum: 0,
            total_weight: 0,
            content_tally: BTreeMap::new(),
            finalized: false,
        }
    }

    /// Record a validator score.
    pub fn record_score(&mut self, score: u64, weight: u128) {
        self.valid_reveals += 1;
        self.weighted_sum = self
            .weighted_sum
            .saturating_add(weight.saturating_mul(score as u128));
        self.total_weight = self.total_weight.saturating_add(weight);
    }

    /// Record a miner content hash.
    pub fn record_content(&mut self, content: Hash, weight: u128) {
        self.valid_reveals += 1;
        let entry = self.content_tally.entry(content).or_insert(0);
        *entry = entry.saturating_add(weight);
        self.total_weight = self.total_weight.saturating_add(weight);
    }

    /// Weighted mean score, floored. `None` without reveals.
    pub fn score(&self) -> Option<u64> {
        if self.total_weight == 0 || self.round != Round::Validator {
            return None;
        }
        Some((self.weighted_sum / self.total_weight) as u64)
    }

    /// Content hash with the greatest summed weight.
    ///
    /// Ties go to the lexicographically smallest hash.
    pub fn resolved_content(&self) -> Option<Hash> {
        let mut best: Option<(&Hash, u128)> = None;
        // Ascending hash order; only a strictly greater weight replaces the leader
        for (hash, weight) in &self.content_tally {
            match best {
                Some((_, w)) if *weight <= w => {}
                _ => best = Some((hash, *weight)),
            }
        }
        best.map(|(hash, _)| *hash)
    }

    pub(crate) fn finalize(&mut self) {
        self.finalized = true;
    }
}
