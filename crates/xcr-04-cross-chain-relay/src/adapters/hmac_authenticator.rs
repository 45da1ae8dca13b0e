//! HMAC Authenticator Adapter
//!
//! Implements `MessageAuthenticator` with HMAC-SHA256 keyed per
//! (origin, destination) pair.

use shared_types::{sign_message, validate_hmac_signature, KeyProvider};
use std::sync::Arc;

use crate::domain::CrossChainMessage;
use crate::ports::MessageAuthenticator;

/// HMAC-SHA256 message authenticator.
#[derive(Clone)]
pub struct HmacAuthenticator {
    keys: Arc<dyn KeyProvider>,
}

impl HmacAuthenticator {
    /// Create an authenticator over a key provider.
    pub fn new(keys: impl KeyProvider + 'static) -> Self {
        Self {
            keys: Arc::new(keys),
        }
    }
}

impl std::fmt::Debug for HmacAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacAuthenticator").finish_non_exhaustive()
    }
}

impl MessageAuthenticator for HmacAuthenticator {
    fn sign(&self, message: &CrossChainMessage) -> Option<Vec<u8>> {
        let secret = self
            .keys
            .shared_secret(message.origin, message.destination)?;
        Some(sign_message(&message.signing_bytes(), &secret).to_vec())
    }

    fn verify(&self, message: &CrossChainMessage) -> bool {
        match self.keys.shared_secret(message.origin, message.destination) {
            Some(secret) => {
                validate_hmac_signature(&message.signing_bytes(), &message.proof, &secret)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{ChainId, SharedSecret, StaticKeyProvider};

    fn authenticator() -> HmacAuthenticator {
        HmacAuthenticator::new(StaticKeyProvider::new().with_pair(
            ChainId::new(10),
            ChainId::new(1),
            SharedSecret::new(vec![0x42; 32]),
        ))
    }

    fn message() -> CrossChainMessage {
        CrossChainMessage {
            origin: ChainId::new(10),
            destination: ChainId::new(1),
            nonce: 1,
            proposal_id: [0u8; 32],
            payload: b"payload".to_vec(),
            proof: Vec::new(),
        }
    }

    #[test]
    fn test_sign_then_verify() {
        let auth = authenticator();
        let mut msg = message();
        msg.proof = auth.sign(&msg).unwrap();
        assert_eq!(msg.proof.len(), 32);
        assert!(auth.verify(&msg));
    }

    #[test]
    fn test_tampered_field_fails() {
        let auth = authenticator();
        let mut msg = message();
        msg.proof = auth.sign(&msg).unwrap();
        msg.nonce = 2;
        assert!(!auth.verify(&msg));
    }

    #[test]
    fn test_unknown_pair_has_no_key() {
        let auth = authenticator();
        let mut msg = message();
        msg.destination = ChainId::new(99);
        assert!(auth.sign(&msg).is_none());
        assert!(!auth.verify(&msg));
    }
}
