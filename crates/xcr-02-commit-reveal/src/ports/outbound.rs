//! # Outbound Ports
//!
//! Dependencies of the Commit-Reveal Engine.

use shared_types::{Address, Role, Timestamp};

/// Live eligibility lookup - outbound port.
///
/// Checked on every commitment in addition to the round snapshot, so a
/// participant slashed or exited mid-round cannot commit.
pub trait EligibilityOracle {
    /// True if `participant` holds `role` and is active at `as_of`.
    fn is_eligible(&self, participant: &Address, role: Role, as_of: Timestamp) -> bool;

    /// True if proposals may target the governed `protocol`.
    fn is_protocol_registered(&self, protocol: &Address) -> bool;
}
