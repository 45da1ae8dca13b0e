//! Node configuration.
//!
//! Loaded from a JSON file, then overridden from `XCR_*` environment
//! variables, then validated.

use serde::{Deserialize, Serialize};
use shared_types::{ChainId, SharedSecret};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};
use xcr_01_participant_registry::RegistryConfig;
use xcr_02_commit_reveal::CommitRevealConfig;
use xcr_03_proposal_store::ProposalStoreConfig;
use xcr_04_cross_chain_relay::RelayConfig;

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// This chain.
    pub chain_id: ChainId,
    /// The chain outcomes are propagated to and received from.
    pub counterparty: ChainId,
    /// Hex-encoded 32-byte bridge secret shared with the counterparty.
    pub bridge_secret: String,
    /// Participant registry.
    pub registry: RegistryConfig,
    /// Commit-reveal rounds.
    pub commit_reveal: CommitRevealConfig,
    /// Proposal store.
    pub proposals: ProposalStoreConfig,
    /// Relay tuning. `local_chain` and `counterparties` are derived from
    /// `chain_id` and `counterparty`.
    pub relay: RelayConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            chain_id: ChainId::new(2),
            counterparty: ChainId::new(1),
            bridge_secret: hex::encode([0u8; 32]),
            registry: RegistryConfig::default(),
            commit_reveal: CommitRevealConfig::default(),
            proposals: ProposalStoreConfig::default(),
            relay: RelayConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Config for `chain_id` paired with `counterparty` under `secret`.
    pub fn for_pair(chain_id: ChainId, counterparty: ChainId, secret: [u8; 32]) -> Self {
        Self {
            chain_id,
            counterparty,
            bridge_secret: hex::encode(secret),
            ..Default::default()
        }
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from a JSON file, apply environment overrides and validate.
    ///
    /// Without a path the defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
                info!("[xcr-05] Loaded config from {}", path.display());
                Self::from_json(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `XCR_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`. Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("XCR_CHAIN_ID") {
            if let Ok(id) = v.parse::<u64>() {
                self.chain_id = ChainId::new(id);
                info!("[xcr-05] Chain ID from env: {}", id);
            } else {
                warn!("[xcr-05] Ignoring invalid XCR_CHAIN_ID: {}", v);
            }
        }
        if let Some(v) = lookup("XCR_BRIDGE_SECRET") {
            self.bridge_secret = v;
            info!("[xcr-05] Bridge secret from env");
        }
        if let Some(v) = lookup("XCR_COMMIT_WINDOW_SECS") {
            if let Ok(secs) = v.parse() {
                self.commit_reveal.commit_window_secs = secs;
            }
        }
        if let Some(v) = lookup("XCR_REVEAL_WINDOW_SECS") {
            if let Ok(secs) = v.parse() {
                self.commit_reveal.reveal_window_secs = secs;
            }
        }
        if let Some(v) = lookup("XCR_QUORUM_BPS") {
            if let Ok(bps) = v.parse() {
                self.commit_reveal.quorum_bps = bps;
            }
        }
    }

    /// Decoded bridge secret.
    pub fn shared_secret(&self) -> Result<SharedSecret, ConfigError> {
        let secret = SharedSecret::from_hex(&self.bridge_secret)
            .map_err(|e| ConfigError::InvalidSecret(e.to_string()))?;
        if secret.as_bytes().len() != 32 {
            return Err(ConfigError::InvalidSecret(format!(
                "expected 32 bytes, got {}",
                secret.as_bytes().len()
            )));
        }
        Ok(secret)
    }

    /// Relay config with the chain pair filled in.
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            local_chain: self.chain_id,
            counterparties: [self.counterparty].into_iter().collect(),
            ..self.relay.clone()
        }
    }

    /// Reject configurations the node must not start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id == self.counterparty {
            return Err(ConfigError::SameChain(self.chain_id));
        }
        if self.shared_secret()?.is_zero() {
            return Err(ConfigError::InsecureBridgeSecret);
        }
        if self.commit_reveal.quorum_bps == 0 || self.commit_reveal.quorum_bps > 10_000 {
            return Err(ConfigError::InvalidQuorum(self.commit_reveal.quorum_bps));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("Config I/O error: {0}")]
    Io(String),
    /// JSON did not parse.
    #[error("Config parse error: {0}")]
    Parse(String),
    /// Secret is not 32 hex-encoded bytes.
    #[error("Invalid bridge secret: {0}")]
    InvalidSecret(String),
    /// All-zero bridge secret.
    #[error("Bridge secret is all zeros; set XCR_BRIDGE_SECRET")]
    InsecureBridgeSecret,
    /// Quorum outside 1..=10000 basis points.
    #[error("Quorum must be 1..=10000 bps, got {0}")]
    InvalidQuorum(u32),
    /// Counterparty equals the local chain.
    #[error("Counterparty must differ from local chain {0}")]
    SameChain(ChainId),
}
