//! # Commitment Hashing
//!
//! Keccak-256 over `value ‖ salt`. The value is always a fixed 32-byte
//! word, so the concatenation is unambiguous for any salt length.

use rand::RngCore;
use sha3::{Digest, Keccak256};

use crate::entities::{Hash, RevealValue};

/// One-shot Keccak-256.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Commitment hash = keccak256(value ‖ salt).
pub fn commitment_hash(value: &RevealValue, salt: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(value.as_bytes());
    hasher.update(salt);
    hasher.finalize().into()
}

/// Check a reveal against a stored commitment.
pub fn verify_commitment(value: &RevealValue, salt: &[u8], expected: &Hash) -> bool {
    commitment_hash(value, salt) == *expected
}

/// Generate a random 32-byte salt.
pub fn generate_salt() -> [u8; 32] {
    let mut salt = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
