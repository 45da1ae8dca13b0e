//! # Cross-Chain Message Security
//!
//! HMAC-SHA256 authentication for messages crossing the bridge.
//!
//! ## Security Properties
//!
//! - **HMAC-SHA256 Proofs**: every message is signed with the key shared by
//!   its (origin, destination) pair
//! - **Constant-Time Verification**: proofs are compared with `verify_slice`
//! - **Zeroized Keys**: key material is wiped from memory on drop

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::entities::ChainId;
use crate::errors::ParseError;

type HmacSha256 = Hmac<Sha256>;

/// Length of an HMAC-SHA256 proof in bytes.
pub const HMAC_PROOF_LEN: usize = 32;

// =============================================================================
// SHARED SECRET
// =============================================================================

/// Pre-shared bridge key that zeroizes on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret {
    inner: Vec<u8>,
}

impl SharedSecret {
    /// Wrap raw key bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: bytes.into(),
        }
    }

    /// Parse a hex-encoded key.
    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| ParseError::InvalidHex(e.to_string()))?;
        Ok(Self::new(bytes))
    }

    /// Key bytes (use immediately and let go).
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// True if the key is empty or all zero.
    pub fn is_zero(&self) -> bool {
        self.inner.iter().all(|b| *b == 0)
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the key
        f.write_str("SharedSecret(***)")
    }
}

// =============================================================================
// HMAC
// =============================================================================

/// Signs canonical message bytes with HMAC-SHA256.
pub fn sign_message(message_bytes: &[u8], secret: &SharedSecret) -> [u8; HMAC_PROOF_LEN] {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message_bytes);
    mac.finalize().into_bytes().into()
}

/// Validates an HMAC-SHA256 proof over canonical message bytes.
///
/// Uses constant-time comparison to prevent timing attacks.
pub fn validate_hmac_signature(message_bytes: &[u8], proof: &[u8], secret: &SharedSecret) -> bool {
    if proof.len() != HMAC_PROOF_LEN {
        return false;
    }

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(message_bytes);
    mac.verify_slice(proof).is_ok()
}

// =============================================================================
// KEY PROVIDER
// =============================================================================

/// Source of bridge keys per (origin, destination) pair.
pub trait KeyProvider: Send + Sync {
    /// Returns the shared secret for the pair, or `None` if unknown.
    fn shared_secret(&self, origin: ChainId, destination: ChainId) -> Option<SharedSecret>;
}

/// Key provider backed by a static table.
#[derive(Debug, Clone, Default)]
pub struct StaticKeyProvider {
    keys: HashMap<(ChainId, ChainId), SharedSecret>,
}

impl StaticKeyProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one secret for both directions of a chain pair.
    pub fn with_pair(mut self, a: ChainId, b: ChainId, secret: SharedSecret) -> Self {
        self.keys.insert((a, b), secret.clone());
        self.keys.insert((b, a), secret);
        self
    }
}

impl KeyProvider for StaticKeyProvider {
    fn shared_secret(&self, origin: ChainId, destination: ChainId) -> Option<SharedSecret> {
        self.keys.get(&(origin, destination)).cloned()
    }
}

// =============================================================================
// TIME
// =============================================================================

/// Returns the current Unix timestamp.
///
/// If the system clock is before UNIX_EPOCH it returns 0.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
