//! Chain node - drives one chain's registry flow end to end.
//!
//! The node is the single writer for its chain. Each step validates the
//! preceding step's terminal state, applies the change through the owning
//! component and persists the node snapshot to the ledger in one batch.

use serde::{Deserialize, Serialize};
use shared_types::{
    Address, ChainId, Hash, ProposalId, RevealValue, Role, Round, Stake, StaticKeyProvider,
    Timestamp,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use xcr_01_participant_registry::{
    ParticipantRegistry, ParticipantRegistryApi, ParticipantStatus, ValidatorSetChange,
};
use xcr_02_commit_reveal::{
    CommitRevealApi, CommitRevealEngine, NonRevealPolicy, RoundPhase, RoundState,
};
use xcr_03_proposal_store::{
    FinalizedProposal, PropagationState, Proposal, ProposalStatus, ProposalStore,
    ProposalStoreApi,
};
use xcr_04_cross_chain_relay::{
    AppliedMessage, BridgeTransport, CrossChainMessage, CrossChainRelay, HmacAuthenticator,
    InMemoryBridge, MirroredState, RelayApi, RelayError, RelayState, Resubmission, SendReceipt,
};

use crate::config::NodeConfig;
use crate::domain::{
    NodeStatus, OrchestratorError, OrchestratorResult, ProposalSummary, StepOutcome,
};
use crate::ports::{BatchOperation, Ledger};

const SNAPSHOT_KEY: &[u8] = b"xcr/node/snapshot";
const CHAIN_KEY: &[u8] = b"xcr/node/chain";

#[derive(Serialize)]
struct SnapshotRef<'a> {
    registry: &'a ParticipantRegistry,
    engine: &'a CommitRevealEngine,
    proposals: &'a ProposalStore,
    relay: &'a RelayState,
    pending_changes: &'a [ValidatorSetChange],
}

#[derive(Deserialize)]
struct Snapshot {
    registry: ParticipantRegistry,
    engine: CommitRevealEngine,
    proposals: ProposalStore,
    relay: RelayState,
    pending_changes: Vec<ValidatorSetChange>,
}

/// One chain's registry node.
pub struct ChainNode<L: Ledger, T: BridgeTransport = InMemoryBridge> {
    config: NodeConfig,
    registry: ParticipantRegistry,
    engine: CommitRevealEngine,
    proposals: ProposalStore,
    relay: CrossChainRelay<T, HmacAuthenticator>,
    pending_changes: Vec<ValidatorSetChange>,
    ledger: L,
}

impl<L: Ledger, T: BridgeTransport> ChainNode<L, T> {
    /// Create a node with empty state.
    pub fn new(config: NodeConfig, ledger: L, transport: Arc<T>) -> OrchestratorResult<Self> {
        Self::build(config, ledger, transport, None)
    }

    /// Rebuild a node from the snapshot in `ledger`.
    ///
    /// An empty ledger yields a fresh node.
    pub fn restore(config: NodeConfig, ledger: L, transport: Arc<T>) -> OrchestratorResult<Self> {
        if let Some(raw) = ledger.read_state(CHAIN_KEY)? {
            let stored = <[u8; 8]>::try_from(raw.as_slice())
                .map(u64::from_be_bytes)
                .map_err(|_| OrchestratorError::Snapshot("chain id is not 8 bytes".into()))?;
            if stored != config.chain_id.as_u64() {
                return Err(OrchestratorError::Snapshot(format!(
                    "ledger belongs to {}, node configured for {}",
                    ChainId::new(stored),
                    config.chain_id
                )));
            }
        }

        let snapshot = match ledger.read_state(SNAPSHOT_KEY)? {
            Some(bytes) => Some(
                bincode::deserialize::<Snapshot>(&bytes)
                    .map_err(|e| OrchestratorError::Snapshot(e.to_string()))?,
            ),
            None => None,
        };
        Self::build(config, ledger, transport, snapshot)
    }

    fn build(
        config: NodeConfig,
        ledger: L,
        transport: Arc<T>,
        snapshot: Option<Snapshot>,
    ) -> OrchestratorResult<Self> {
        config.validate()?;
        let keys = StaticKeyProvider::new().with_pair(
            config.chain_id,
            config.counterparty,
            config.shared_secret()?,
        );
        let relay = CrossChainRelay::new(
            config.relay_config(),
            transport,
            HmacAuthenticator::new(keys),
        );

        let node = match snapshot {
            Some(snapshot) => {
                info!(
                    "[xcr-05] Restored {} ({} participants, {} proposals)",
                    config.chain_id,
                    snapshot.registry.len(),
                    snapshot.proposals.list().len()
                );
                Self {
                    registry: snapshot.registry,
                    engine: snapshot.engine,
                    proposals: snapshot.proposals,
                    relay: relay.with_state(snapshot.relay),
                    pending_changes: snapshot.pending_changes,
                    ledger,
                    config,
                }
            }
            None => Self {
                registry: ParticipantRegistry::new(config.registry.clone()),
                engine: CommitRevealEngine::new(config.commit_reveal.clone()),
                proposals: ProposalStore::new(config.chain_id, config.proposals.clone()),
                relay,
                pending_changes: Vec::new(),
                ledger,
                config,
            },
        };
        Ok(node)
    }

    /// Node configuration.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Participant registry.
    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    /// Commit-reveal engine.
    pub fn engine(&self) -> &CommitRevealEngine {
        &self.engine
    }

    /// Proposal store.
    pub fn proposals(&self) -> &ProposalStore {
        &self.proposals
    }

    /// Relay state.
    pub fn relay_state(&self) -> &RelayState {
        self.relay.state()
    }

    /// Bridge transport.
    pub fn transport(&self) -> &Arc<T> {
        self.relay.transport()
    }

    /// Backing ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Validator-set changes waiting for `propagate_validator_set`.
    pub fn pending_validator_changes(&self) -> &[ValidatorSetChange] {
        &self.pending_changes
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register the governed protocol whose governor is `protocol`.
    pub fn register_protocol(
        &mut self,
        protocol: Address,
        now: Timestamp,
    ) -> OrchestratorResult<StepOutcome> {
        if self.registry.is_protocol_registered(&protocol) {
            return Ok(StepOutcome::AlreadyApplied);
        }
        self.registry.register_protocol(protocol, now)?;
        self.persist()?;
        Ok(StepOutcome::Applied)
    }

    /// Register `participant` under `role` with `stake`.
    pub fn register(
        &mut self,
        participant: Address,
        role: Role,
        stake: Stake,
        now: Timestamp,
    ) -> OrchestratorResult<StepOutcome> {
        if let Some(existing) = self.registry.get(&participant) {
            if existing.role == role
                && existing.stake == stake
                && existing.status_at(now) == ParticipantStatus::Active
                && !existing.is_exit_pending(now)
            {
                debug!("[xcr-05] {} already registered", hex::encode(participant));
                return Ok(StepOutcome::AlreadyApplied);
            }
        }

        self.registry.register(participant, role, stake, now)?;
        self.collect_registry_events();
        self.persist()?;
        Ok(StepOutcome::Applied)
    }

    /// Schedule `participant`'s exit.
    pub fn deregister(
        &mut self,
        participant: Address,
        now: Timestamp,
    ) -> OrchestratorResult<StepOutcome> {
        if let Some(existing) = self.registry.get(&participant) {
            if existing.is_exit_pending(now) {
                return Ok(StepOutcome::AlreadyApplied);
            }
        }

        self.registry.deregister(participant, now)?;
        self.collect_registry_events();
        self.persist()?;
        Ok(StepOutcome::Applied)
    }

    // =========================================================================
    // Proposal lifecycle
    // =========================================================================

    /// Create a proposal against `protocol` and open its miner round.
    pub fn create_proposal(
        &mut self,
        protocol: Address,
        originator: Address,
        payload_hash: Hash,
        now: Timestamp,
    ) -> OrchestratorResult<(ProposalId, StepOutcome)> {
        if let Some(existing) = self
            .proposals
            .find_open_by(&protocol, &originator, &payload_hash)
        {
            return Ok((existing.id, StepOutcome::AlreadyApplied));
        }

        let proposal =
            self.proposals
                .create(&self.registry, protocol, originator, payload_hash, now)?;
        let eligible = self.registry.eligible_set(Role::Miner, now);
        self.engine
            .open_round(proposal.id, Round::Miner, eligible, now)?;
        self.persist()?;
        Ok((proposal.id, StepOutcome::Applied))
    }

    /// Miner content commitment.
    pub fn commit(
        &mut self,
        miner: Address,
        proposal: ProposalId,
        hash: Hash,
        now: Timestamp,
    ) -> OrchestratorResult<StepOutcome> {
        self.submit_commitment("commit", Round::Miner, miner, proposal, hash, now)
    }

    /// Miner content reveal.
    pub fn reveal(
        &mut self,
        miner: Address,
        proposal: ProposalId,
        content: Hash,
        salt: &[u8],
        now: Timestamp,
    ) -> OrchestratorResult<StepOutcome> {
        let value = RevealValue::from_hash(content);
        self.submit_reveal("reveal", Round::Miner, miner, proposal, value, salt, now)
    }

    /// Validator score commitment.
    pub fn score_commit(
        &mut self,
        validator: Address,
        proposal: ProposalId,
        hash: Hash,
        now: Timestamp,
    ) -> OrchestratorResult<StepOutcome> {
        self.submit_commitment("score_commit", Round::Validator, validator, proposal, hash, now)
    }

    /// Validator score reveal.
    pub fn score_reveal(
        &mut self,
        validator: Address,
        proposal: ProposalId,
        score: u64,
        salt: &[u8],
        now: Timestamp,
    ) -> OrchestratorResult<StepOutcome> {
        let value = RevealValue::from_score(score);
        self.submit_reveal(
            "score_reveal",
            Round::Validator,
            validator,
            proposal,
            value,
            salt,
            now,
        )
    }

    /// Hand a scored proposal to the relay.
    pub fn finalize(&mut self, id: ProposalId, now: Timestamp) -> OrchestratorResult<StepOutcome> {
        self.sync_proposal(id, now)?;
        match self.proposals.get(id)?.status {
            ProposalStatus::Scored => {}
            ProposalStatus::Propagated | ProposalStatus::Finalized => {
                return Ok(StepOutcome::AlreadyApplied)
            }
            status => {
                return Err(OrchestratorError::PrecedingStepIncomplete {
                    step: "finalize",
                    reason: format!("proposal {} is {}, not scored", id, status),
                })
            }
        }

        self.proposals.finalize(id)?;
        self.persist()?;
        Ok(StepOutcome::Applied)
    }

    /// Send a finalized proposal to the counterparty.
    ///
    /// A failed send keeps its reserved nonce; calling again resubmits it.
    pub async fn propagate(&mut self, id: ProposalId) -> OrchestratorResult<StepOutcome> {
        let proposal = self.proposals.get(id)?;
        if matches!(proposal.propagation, PropagationState::Submitted { .. }) {
            return Ok(StepOutcome::AlreadyApplied);
        }
        let aggregate = match (proposal.status, &proposal.score) {
            (ProposalStatus::Propagated, Some(aggregate)) => aggregate.clone(),
            (status, _) => {
                return Err(OrchestratorError::PrecedingStepIncomplete {
                    step: "propagate",
                    reason: format!("proposal {} is {}, not finalized", id, status),
                })
            }
        };
        let finalized = FinalizedProposal {
            proposal: proposal.clone(),
            aggregate,
        };

        let queued = self
            .relay
            .state()
            .outbox()
            .iter()
            .any(|message| message.proposal() == Some(id));
        let outcome = if queued {
            info!("[xcr-05] Resubmitting queued messages for proposal {}", id);
            self.relay.resubmit_pending().await
        } else {
            match self.relay.send(self.config.counterparty, &finalized).await {
                Ok(receipt) => Resubmission {
                    receipts: vec![receipt],
                    failure: None,
                },
                Err(err) => Resubmission {
                    receipts: Vec::new(),
                    failure: Some(err),
                },
            }
        };

        self.settle(outcome).map(|_| StepOutcome::Applied)
    }

    /// Send accumulated validator-set changes to the counterparty.
    pub async fn propagate_validator_set(&mut self) -> OrchestratorResult<StepOutcome> {
        if self.pending_changes.is_empty() {
            return Ok(StepOutcome::AlreadyApplied);
        }

        let changes = self.pending_changes.clone();
        let count = changes.len();
        match self
            .relay
            .send_validator_set(self.config.counterparty, changes)
            .await
        {
            Ok(receipt) => {
                info!(
                    "[xcr-05] Propagated {} validator-set changes with nonce {}",
                    count, receipt.nonce
                );
                self.pending_changes.clear();
                self.persist()?;
                Ok(StepOutcome::Applied)
            }
            Err(err) => {
                // Queued in the outbox under its reserved nonce
                if matches!(err, RelayError::PropagationFailed { .. }) {
                    self.pending_changes.clear();
                }
                self.persist_after_failed_send(err)
            }
        }
    }

    /// Retry every queued message.
    pub async fn resubmit_pending(&mut self) -> OrchestratorResult<Vec<SendReceipt>> {
        let outcome = self.relay.resubmit_pending().await;
        self.settle(outcome)
    }

    /// Ingest a message from the counterparty.
    pub fn receive(
        &mut self,
        message: CrossChainMessage,
        now: Timestamp,
    ) -> OrchestratorResult<Vec<AppliedMessage>> {
        let mut sink = MirroredState::new(&mut self.proposals, &mut self.registry);
        let applied = self.relay.receive(message, &mut sink, now)?;
        self.collect_registry_events();
        self.persist()?;
        Ok(applied)
    }

    /// Ingest a wire-encoded message.
    pub fn receive_encoded(
        &mut self,
        bytes: &[u8],
        now: Timestamp,
    ) -> OrchestratorResult<Vec<AppliedMessage>> {
        let message = CrossChainMessage::decode(bytes)?;
        self.receive(message, now)
    }

    /// Apply elapsed deadlines to every open proposal and expire stale
    /// out-of-order messages.
    ///
    /// Returns the ordering timeouts raised.
    pub fn tick(&mut self, now: Timestamp) -> OrchestratorResult<Vec<RelayError>> {
        let open: Vec<ProposalId> = self
            .proposals
            .list()
            .into_iter()
            .filter(|p| !is_resolved(p))
            .map(|p| p.id)
            .collect();
        for id in open {
            self.sync_proposal(id, now)?;
        }

        let expired = self.relay.expire_stale(now);
        self.persist()?;
        Ok(expired)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Local proposal.
    pub fn proposal(&self, id: ProposalId) -> OrchestratorResult<&Proposal> {
        Ok(self.proposals.get(id)?)
    }

    /// Mirrored copy of a counterparty proposal.
    pub fn mirrored(&self, origin: ChainId, id: ProposalId) -> Option<&Proposal> {
        self.proposals.mirrored(origin, id)
    }

    /// Operator view of the node.
    pub fn status(&self) -> NodeStatus {
        let counterparty = self.config.counterparty;
        NodeStatus {
            chain: self.config.chain_id,
            counterparty,
            participants: self.registry.len(),
            protocols: self.registry.protocols().len(),
            proposals: self
                .proposals
                .list()
                .into_iter()
                .map(ProposalSummary::from)
                .collect(),
            mirrored: self
                .proposals
                .list_mirrored()
                .into_iter()
                .map(ProposalSummary::from)
                .collect(),
            last_sent: self.relay.state().last_sent(counterparty),
            last_applied: self.relay.state().last_applied(counterparty),
            outbox: self.relay.state().outbox().len(),
            buffered: self.relay.state().buffered(counterparty),
            pending_validator_changes: self.pending_changes.len(),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn round_state(
        &self,
        step: &'static str,
        id: ProposalId,
        round: Round,
    ) -> OrchestratorResult<&RoundState> {
        self.proposals.get(id)?;
        self.engine
            .round(id, round)
            .ok_or_else(|| OrchestratorError::PrecedingStepIncomplete {
                step,
                reason: format!("{} round of proposal {} is not open", round, id),
            })
    }

    fn submit_commitment(
        &mut self,
        step: &'static str,
        round: Round,
        participant: Address,
        id: ProposalId,
        hash: Hash,
        now: Timestamp,
    ) -> OrchestratorResult<StepOutcome> {
        self.sync_proposal(id, now)?;
        let already = self
            .round_state(step, id, round)?
            .commitments
            .get(&participant)
            .is_some_and(|c| c.hash == hash);
        if already {
            return Ok(StepOutcome::AlreadyApplied);
        }

        self.engine
            .submit_commitment(&self.registry, participant, id, round, hash, now)?;
        self.sync_proposal(id, now)?;
        self.persist()?;
        Ok(StepOutcome::Applied)
    }

    #[allow(clippy::too_many_arguments)]
    fn submit_reveal(
        &mut self,
        step: &'static str,
        round: Round,
        participant: Address,
        id: ProposalId,
        value: RevealValue,
        salt: &[u8],
        now: Timestamp,
    ) -> OrchestratorResult<StepOutcome> {
        self.sync_proposal(id, now)?;
        let already = self
            .round_state(step, id, round)?
            .reveals
            .get(&participant)
            .is_some_and(|r| r.value == value && r.salt == salt);
        if already {
            return Ok(StepOutcome::AlreadyApplied);
        }

        self.engine
            .submit_reveal(participant, id, round, value, salt, now)?;
        self.sync_proposal(id, now)?;
        self.persist()?;
        Ok(StepOutcome::Applied)
    }

    /// Bring the proposal's status in line with its current round.
    ///
    /// Opens the validator round once the miner round resolves content.
    fn sync_proposal(&mut self, id: ProposalId, now: Timestamp) -> OrchestratorResult<()> {
        let proposal = self.proposals.get(id)?;
        if is_resolved(proposal) {
            return Ok(());
        }
        let round = proposal.round;

        let phase = self.engine.advance(id, round, now)?;
        let outcome = if phase == RoundPhase::Closed {
            Some(self.engine.outcome(id, round)?)
        } else {
            None
        };
        self.proposals
            .advance(id, round, phase, outcome.as_ref().map(|o| &o.aggregate))?;

        if let Some(outcome) = outcome {
            self.apply_non_reveal_policy(id, round, &outcome.no_shows, now);
        }

        let content_resolved = round == Round::Miner
            && self.proposals.get(id)?.round == Round::Validator
            && self.engine.round(id, Round::Validator).is_none();
        if content_resolved {
            let eligible = self.registry.eligible_set(Role::Validator, now);
            self.engine
                .open_round(id, Round::Validator, eligible, now)?;
        }
        Ok(())
    }

    fn apply_non_reveal_policy(
        &mut self,
        id: ProposalId,
        round: Round,
        no_shows: &[Address],
        now: Timestamp,
    ) {
        if no_shows.is_empty() {
            return;
        }
        match self.engine.config().non_reveal_policy {
            NonRevealPolicy::Exclude => {
                info!(
                    "[xcr-05] {} no-shows excluded from {} round of proposal {}",
                    no_shows.len(),
                    round,
                    id
                );
            }
            NonRevealPolicy::Slash => {
                for participant in no_shows {
                    match self
                        .registry
                        .slash(*participant, now, "committed without revealing")
                    {
                        Ok(()) => warn!(
                            "[xcr-05] Slashed {} for not revealing in {} round of proposal {}",
                            hex::encode(participant),
                            round,
                            id
                        ),
                        Err(e) => debug!("[xcr-05] Skipped slashing: {}", e),
                    }
                }
                self.collect_registry_events();
            }
        }
    }

    fn collect_registry_events(&mut self) {
        for event in self.registry.drain_events() {
            if let Some(change) = event.to_validator_change() {
                self.pending_changes.push(change);
            }
        }
    }

    /// Record accepted submissions, persist, then surface any failure.
    fn settle(&mut self, outcome: Resubmission) -> OrchestratorResult<Vec<SendReceipt>> {
        self.record_receipts(&outcome.receipts)?;
        match outcome.failure {
            Some(err) => self.persist_after_failed_send(err),
            None => {
                self.persist()?;
                Ok(outcome.receipts)
            }
        }
    }

    fn record_receipts(&mut self, receipts: &[SendReceipt]) -> OrchestratorResult<()> {
        for receipt in receipts {
            if let Some(id) = receipt.proposal {
                self.proposals
                    .mark_submitted(id, receipt.nonce, receipt.receipt.id.clone())?;
            }
        }
        Ok(())
    }

    fn persist_after_failed_send<R>(&mut self, err: RelayError) -> OrchestratorResult<R> {
        self.persist()?;
        Err(err.into())
    }

    fn persist(&mut self) -> OrchestratorResult<()> {
        let snapshot = SnapshotRef {
            registry: &self.registry,
            engine: &self.engine,
            proposals: &self.proposals,
            relay: self.relay.state(),
            pending_changes: &self.pending_changes,
        };
        let bytes =
            bincode::serialize(&snapshot).map_err(|e| OrchestratorError::Snapshot(e.to_string()))?;
        let size = bytes.len();

        self.ledger.write_batch(vec![
            BatchOperation::put(CHAIN_KEY, self.config.chain_id.as_u64().to_be_bytes()),
            BatchOperation::put(SNAPSHOT_KEY, bytes),
        ])?;
        debug!("[xcr-05] Persisted {} byte snapshot", size);
        Ok(())
    }
}

/// Past the rounds: scored, handed off or terminal.
fn is_resolved(proposal: &Proposal) -> bool {
    matches!(
        proposal.status,
        ProposalStatus::Scored
            | ProposalStatus::Propagated
            | ProposalStatus::Finalized
            | ProposalStatus::Rejected
    )
}
