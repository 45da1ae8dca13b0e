//! # Domain Invariants
//!
//! Window and quorum rules shared by every round.

use shared_types::Timestamp;

/// Basis-point denominator.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Number of participants needed to close a window early.
///
/// `ceil(eligible * quorum_bps / 10_000)`, never below 1.
pub fn quorum_threshold(eligible: usize, quorum_bps: u32) -> usize {
    let needed = (eligible as u64 * quorum_bps as u64).div_ceil(BPS_DENOMINATOR);
    (needed as usize).max(1)
}

/// Windows are half-open: `[opened, deadline)`.
pub fn window_elapsed(now: Timestamp, deadline: Timestamp) -> bool {
    now >= deadline
}

/// Score words must decode to an integer no larger than `max_score`.
pub fn score_in_range(score: Option<u64>, max_score: u64) -> Option<u64> {
    score.filter(|s| *s <= max_score)
}
