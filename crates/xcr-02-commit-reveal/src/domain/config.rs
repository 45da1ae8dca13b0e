//! # Engine Configuration

use serde::{Deserialize, Serialize};

/// How revealed values are weighted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationPolicy {
    /// Weight each reveal by the participant's snapshot stake.
    #[default]
    StakeWeightedMean,
    /// Every reveal weighs 1.
    UnweightedMean,
}

/// What happens to participants who commit but never reveal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonRevealPolicy {
    /// Exclude from the aggregate only.
    #[default]
    Exclude,
    /// Exclude and slash.
    Slash,
}

/// Commit-reveal configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRevealConfig {
    /// Commit window length in seconds.
    pub commit_window_secs: u64,
    /// Reveal window length in seconds.
    pub reveal_window_secs: u64,
    /// Early-close quorum in basis points of the eligible set.
    pub quorum_bps: u32,
    /// Highest score a validator may reveal.
    pub max_score: u64,
    /// Aggregation weighting.
    pub aggregation: AggregationPolicy,
    /// Treatment of committers who never reveal.
    pub non_reveal_policy: NonRevealPolicy,
}

impl Default for CommitRevealConfig {
    fn default() -> Self {
        Self {
            commit_window_secs: 600,
            reveal_window_secs: 600,
            quorum_bps: 10_000,
            max_score: 100,
            aggregation: AggregationPolicy::default(),
            non_reveal_policy: NonRevealPolicy::default(),
        }
    }
}
