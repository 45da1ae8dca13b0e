//! Shared fixtures: an L2 origin node paired with an L1 destination node
//! over one in-memory bridge.

use shared_types::{commitment_hash, keccak256, Address, ChainId, Hash, RevealValue, Role};
use std::sync::Arc;
use xcr_04_cross_chain_relay::{InMemoryBridge, RetryPolicy};
use xcr_05_orchestrator::{ChainNode, InMemoryLedger, Ledger, NodeConfig};

/// Settlement chain.
pub const L1: ChainId = ChainId::new(1);
/// Validator/miner network.
pub const L2: ChainId = ChainId::new(2);
/// Bridge secret shared by both fixtures.
pub const SECRET: [u8; 32] = [0x5A; 32];

/// Governor of the governed protocol.
pub const GOV: Address = [0x90; 20];
/// Miner with stake 100.
pub const M: Address = [0x11; 20];
/// Validator with stake 50.
pub const V1: Address = [0x21; 20];
/// Validator with stake 50.
pub const V2: Address = [0x22; 20];

/// Node config with fast retries.
pub fn node_config(chain: ChainId, counterparty: ChainId) -> NodeConfig {
    let mut config = NodeConfig::for_pair(chain, counterparty, SECRET);
    config.relay.retry = RetryPolicy {
        max_attempts: 3,
        initial_backoff_ms: 1,
        max_backoff_ms: 2,
        multiplier: 2,
    };
    config
}

/// Node on `chain` over `ledger`.
pub fn node_on<L: Ledger>(
    chain: ChainId,
    counterparty: ChainId,
    ledger: L,
    bridge: &Arc<InMemoryBridge>,
) -> ChainNode<L> {
    ChainNode::new(node_config(chain, counterparty), ledger, bridge.clone())
        .expect("fixture config is valid")
}

/// L2 origin and L1 destination sharing one bridge.
pub struct Pair {
    pub bridge: Arc<InMemoryBridge>,
    pub l2: ChainNode<InMemoryLedger>,
    pub l1: ChainNode<InMemoryLedger>,
}

impl Pair {
    pub fn new() -> Self {
        let bridge = Arc::new(InMemoryBridge::new());
        Self {
            l2: node_on(L2, L1, InMemoryLedger::new(), &bridge),
            l1: node_on(L1, L2, InMemoryLedger::new(), &bridge),
            bridge,
        }
    }

    /// Register the GOV protocol plus M, V1 and V2 on L2.
    pub fn register_participants(&mut self) {
        self.l2.register_protocol(GOV, 1_000).unwrap();
        self.l2.register(M, Role::Miner, 100, 1_000).unwrap();
        self.l2.register(V1, Role::Validator, 50, 1_000).unwrap();
        self.l2.register(V2, Role::Validator, 50, 1_000).unwrap();
    }

    /// Deliver everything queued for L1.
    pub fn deliver_to_l1(&mut self, now: u64) {
        for message in self.bridge.take_delivered(L1) {
            self.l1.receive(message, now).unwrap();
        }
    }
}

impl Default for Pair {
    fn default() -> Self {
        Self::new()
    }
}

/// h("contentA").
pub fn content_a() -> Hash {
    keccak256(b"contentA")
}

/// Commitment to content under `salt`.
pub fn content_commitment(content: Hash, salt: &[u8]) -> Hash {
    commitment_hash(&RevealValue::from_hash(content), salt)
}

/// Commitment to a score under `salt`.
pub fn score_commitment(score: u64, salt: &[u8]) -> Hash {
    commitment_hash(&RevealValue::from_score(score), salt)
}
