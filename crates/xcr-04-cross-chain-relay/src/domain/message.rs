//! # Cross-Chain Message
//!
//! Wire layout (big-endian):
//!
//! ```text
//! origin u64 | destination u64 | nonce u64 | proposal_id [32] |
//! payload_len u32 | payload | proof_len u32 | proof
//! ```
//!
//! The proof covers every field before `proof_len`.

use serde::{Deserialize, Serialize};
use shared_types::{proposal_id_from_word, ChainId, ProposalId};

use super::errors::{RelayError, RelayResult};

/// Fixed header: origin, destination, nonce, proposal id.
const HEADER_LEN: usize = 8 + 8 + 8 + 32;

/// A message between chains.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainMessage {
    /// Sending chain.
    pub origin: ChainId,
    /// Receiving chain.
    pub destination: ChainId,
    /// Strictly increasing per (origin, destination).
    pub nonce: u64,
    /// Proposal id word (zero for validator-set updates).
    pub proposal_id: [u8; 32],
    /// Serialized payload.
    pub payload: Vec<u8>,
    /// Authentication proof.
    pub proof: Vec<u8>,
}

impl CrossChainMessage {
    /// Bytes the proof is computed over.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + 4 + self.payload.len());
        out.extend_from_slice(&self.origin.as_u64().to_be_bytes());
        out.extend_from_slice(&self.destination.as_u64().to_be_bytes());
        out.extend_from_slice(&self.nonce.to_be_bytes());
        out.extend_from_slice(&self.proposal_id);
        out.extend_from_slice(&(self.payload.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Full wire encoding.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.signing_bytes();
        out.extend_from_slice(&(self.proof.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.proof);
        out
    }

    /// Decode the wire encoding. Rejects truncated input and trailing bytes.
    pub fn decode(bytes: &[u8]) -> RelayResult<Self> {
        let mut reader = Reader { bytes, pos: 0 };
        let origin = ChainId::new(reader.u64()?);
        let destination = ChainId::new(reader.u64()?);
        let nonce = reader.u64()?;
        let mut proposal_id = [0u8; 32];
        proposal_id.copy_from_slice(reader.take(32)?);
        let payload_len = reader.u32()? as usize;
        let payload = reader.take(payload_len)?.to_vec();
        let proof_len = reader.u32()? as usize;
        let proof = reader.take(proof_len)?.to_vec();

        if reader.pos != bytes.len() {
            return Err(RelayError::Malformed(format!(
                "{} trailing bytes",
                bytes.len() - reader.pos
            )));
        }

        Ok(Self {
            origin,
            destination,
            nonce,
            proposal_id,
            payload,
            proof,
        })
    }

    /// Proposal id, if the word holds one.
    pub fn proposal(&self) -> Option<ProposalId> {
        proposal_id_from_word(&self.proposal_id).filter(|id| *id != 0)
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> RelayResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                RelayError::Malformed(format!(
                    "truncated: need {} bytes at offset {}, have {}",
                    len,
                    self.pos,
                    self.bytes.len()
                ))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u64(&mut self) -> RelayResult<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(buf))
    }

    fn u32(&mut self) -> RelayResult<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::proposal_id_to_word;

    fn message() -> CrossChainMessage {
        CrossChainMessage {
            origin: ChainId::new(10),
            destination: ChainId::new(1),
            nonce: 1,
            proposal_id: proposal_id_to_word(7),
            payload: vec![1, 2, 3],
            proof: vec![9; 32],
        }
    }

    #[test]
    fn test_layout_is_big_endian() {
        let bytes = message().encode();
        assert_eq!(&bytes[0..8], &10u64.to_be_bytes());
        assert_eq!(&bytes[8..16], &1u64.to_be_bytes());
        assert_eq!(&bytes[16..24], &1u64.to_be_bytes());
        assert_eq!(bytes[55], 7);
        assert_eq!(&bytes[56..60], &3u32.to_be_bytes());
        assert_eq!(&bytes[60..63], &[1, 2, 3]);
        assert_eq!(&bytes[63..67], &32u32.to_be_bytes());
        assert_eq!(bytes.len(), 67 + 32);
    }

    #[test]
    fn test_decode_inverts_encode() {
        let msg = message();
        assert_eq!(CrossChainMessage::decode(&msg.encode()).unwrap(), msg);
        assert_eq!(msg.proposal(), Some(7));
    }

    #[test]
    fn test_signing_bytes_exclude_proof() {
        let mut a = message();
        let sig = a.signing_bytes();
        a.proof = vec![0; 4];
        assert_eq!(a.signing_bytes(), sig);
    }

    #[test]
    fn test_truncated_rejected() {
        let bytes = message().encode();
        for cut in [0, 10, 55, 60, bytes.len() - 1] {
            assert!(matches!(
                CrossChainMessage::decode(&bytes[..cut]),
                Err(RelayError::Malformed(_))
            ));
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = message().encode();
        bytes.push(0);
        assert!(matches!(
            CrossChainMessage::decode(&bytes),
            Err(RelayError::Malformed(_))
        ));
    }

    #[test]
    fn test_huge_length_prefix_rejected() {
        let mut bytes = message().encode();
        bytes[56..60].copy_from_slice(&u32::MAX.to_be_bytes());
        assert!(CrossChainMessage::decode(&bytes).is_err());
    }

    #[test]
    fn test_zero_word_has_no_proposal() {
        let mut msg = message();
        msg.proposal_id = [0u8; 32];
        assert_eq!(msg.proposal(), None);
    }
}
