//! # Core Domain Entities
//!
//! Primitive identifiers and the tagged role/round/phase variants used
//! throughout the registry.
//!
//! ## Clusters
//!
//! - **Identity**: `Address`, `ChainId`, `ProposalId`
//! - **Roles & Rounds**: `Role`, `Round`, `Phase`
//! - **Values**: `RevealValue`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ParseError;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte hash (Keccak-256 for commitments).
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style participant address.
pub type Address = [u8; 20];

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Stake amount held by a participant.
pub type Stake = u128;

/// Proposal identifier, monotonic per origin chain.
pub type ProposalId = u64;

/// Numeric chain identifier as carried on the wire.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Create a chain id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw numeric value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain-{}", self.0)
    }
}

/// Encode a proposal id as a right-aligned big-endian 32-byte word.
pub fn proposal_id_to_word(id: ProposalId) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&id.to_be_bytes());
    word
}

/// Decode a proposal id word. Returns `None` if the upper 24 bytes are set.
pub fn proposal_id_from_word(word: &[u8; 32]) -> Option<ProposalId> {
    if word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[24..]);
    Some(u64::from_be_bytes(buf))
}

/// Parse a hex address (with or without `0x`).
pub fn parse_address(s: &str) -> Result<Address, ParseError> {
    let bytes = hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| ParseError::InvalidHex(e.to_string()))?;
    if bytes.len() != 20 {
        return Err(ParseError::InvalidLength {
            expected: 20,
            actual: bytes.len(),
        });
    }
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&bytes);
    Ok(addr)
}

/// Parse a hex 32-byte hash (with or without `0x`).
pub fn parse_hash(s: &str) -> Result<Hash, ParseError> {
    let bytes = hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| ParseError::InvalidHex(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(ParseError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        });
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes);
    Ok(hash)
}

// =============================================================================
// CLUSTER B: ROLES & ROUNDS
// =============================================================================

/// Participant role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Originates proposal content.
    Miner,
    /// Scores proposal content.
    Validator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Miner => f.write_str("miner"),
            Role::Validator => f.write_str("validator"),
        }
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "miner" => Ok(Role::Miner),
            "validator" => Ok(Role::Validator),
            other => Err(ParseError::UnknownRole(other.to_string())),
        }
    }
}

/// A commit-reveal round of a proposal.
///
/// The miner round resolves proposal content; the validator round scores it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Round {
    /// `miner_commit` → `miner_reveal`.
    Miner,
    /// `validator_score_commit` → `validator_score_reveal`.
    Validator,
}

impl Round {
    /// Role allowed to take part in this round.
    pub fn required_role(&self) -> Role {
        match self {
            Round::Miner => Role::Miner,
            Round::Validator => Role::Validator,
        }
    }

    /// Commit phase of this round.
    pub fn commit_phase(&self) -> Phase {
        match self {
            Round::Miner => Phase::MinerCommit,
            Round::Validator => Phase::ValidatorScoreCommit,
        }
    }

    /// Reveal phase of this round.
    pub fn reveal_phase(&self) -> Phase {
        match self {
            Round::Miner => Phase::MinerReveal,
            Round::Validator => Phase::ValidatorScoreReveal,
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Round::Miner => f.write_str("miner"),
            Round::Validator => f.write_str("validator"),
        }
    }
}

/// One of the four commit-reveal phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Miners commit to content.
    MinerCommit,
    /// Miners reveal content.
    MinerReveal,
    /// Validators commit to scores.
    ValidatorScoreCommit,
    /// Validators reveal scores.
    ValidatorScoreReveal,
}

impl Phase {
    /// Round this phase belongs to.
    pub fn round(&self) -> Round {
        match self {
            Phase::MinerCommit | Phase::MinerReveal => Round::Miner,
            Phase::ValidatorScoreCommit | Phase::ValidatorScoreReveal => Round::Validator,
        }
    }

    /// True for the two commit phases.
    pub fn is_commit(&self) -> bool {
        matches!(self, Phase::MinerCommit | Phase::ValidatorScoreCommit)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::MinerCommit => "miner_commit",
            Phase::MinerReveal => "miner_reveal",
            Phase::ValidatorScoreCommit => "validator_score_commit",
            Phase::ValidatorScoreReveal => "validator_score_reveal",
        };
        f.write_str(name)
    }
}

// =============================================================================
// CLUSTER C: VALUES
// =============================================================================

/// A revealed 32-byte word.
///
/// Miners reveal a content hash; validators reveal a score stored as a
/// big-endian unsigned integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RevealValue(pub [u8; 32]);

impl RevealValue {
    /// Wrap a content hash.
    pub fn from_hash(hash: Hash) -> Self {
        Self(hash)
    }

    /// Encode a score as a uint256-style word.
    pub fn from_score(score: u64) -> Self {
        Self(proposal_id_to_word(score))
    }

    /// Decode the word as a score. `None` if it does not fit in a `u64`.
    pub fn as_score(&self) -> Option<u64> {
        proposal_id_from_word(&self.0)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposal_id_word_is_right_aligned() {
        let word = proposal_id_to_word(1);
        assert_eq!(word[31], 1);
        assert!(word[..31].iter().all(|b| *b == 0));
        assert_eq!(proposal_id_from_word(&word), Some(1));
    }

    #[test]
    fn test_proposal_id_word_rejects_high_bytes() {
        let mut word = proposal_id_to_word(7);
        word[0] = 1;
        assert_eq!(proposal_id_from_word(&word), None);
    }

    #[test]
    fn test_round_phases() {
        assert_eq!(Round::Miner.commit_phase(), Phase::MinerCommit);
        assert_eq!(Round::Validator.reveal_phase(), Phase::ValidatorScoreReveal);
        assert_eq!(Phase::ValidatorScoreCommit.round(), Round::Validator);
        assert!(Phase::MinerCommit.is_commit());
        assert!(!Phase::MinerReveal.is_commit());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Miner".parse::<Role>().unwrap(), Role::Miner);
        assert_eq!("validator".parse::<Role>().unwrap(), Role::Validator);
        assert!("relayer".parse::<Role>().is_err());
    }

    #[test]
    fn test_score_word() {
        let value = RevealValue::from_score(85);
        assert_eq!(value.as_score(), Some(85));
        assert_eq!(RevealValue::from_hash([0xFF; 32]).as_score(), None);
    }

    #[test]
    fn test_parse_address() {
        let addr = parse_address("0x0101010101010101010101010101010101010101").unwrap();
        assert_eq!(addr, [1u8; 20]);
        assert!(parse_address("0x01").is_err());
    }
}
