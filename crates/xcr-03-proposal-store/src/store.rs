//! Proposal Store - core business logic

use serde::{Deserialize, Serialize};
use shared_types::{Address, ChainId, Hash, ProposalId, Role, Round, Timestamp};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use xcr_02_commit_reveal::{EligibilityOracle, RoundPhase, ScoreAggregate};

use crate::domain::{
    FinalizedProposal, PropagationState, Proposal, ProposalError, ProposalResult, ProposalStatus,
    ProposalStoreConfig,
};
use crate::ports::ProposalStoreApi;

/// Proposals originated on this chain plus mirrors of counter-chain ones.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposalStore {
    config: ProposalStoreConfig,
    chain: ChainId,
    next_id: ProposalId,
    proposals: BTreeMap<ProposalId, Proposal>,
    mirrored: BTreeMap<(ChainId, ProposalId), Proposal>,
}

impl ProposalStore {
    /// Empty store for `chain`.
    pub fn new(chain: ChainId, config: ProposalStoreConfig) -> Self {
        Self {
            config,
            chain,
            next_id: 1,
            proposals: BTreeMap::new(),
            mirrored: BTreeMap::new(),
        }
    }

    /// Chain this store belongs to.
    pub fn chain(&self) -> ChainId {
        self.chain
    }

    /// All mirrored copies.
    pub fn list_mirrored(&self) -> Vec<&Proposal> {
        self.mirrored.values().collect()
    }

    fn get_mut(&mut self, id: ProposalId) -> ProposalResult<&mut Proposal> {
        self.proposals
            .get_mut(&id)
            .ok_or(ProposalError::NotFound { id })
    }
}

fn transition(proposal: &mut Proposal, to: ProposalStatus) -> ProposalResult<()> {
    if !proposal.status.can_transition_to(to, proposal.round) {
        return Err(ProposalError::InvalidTransition {
            id: proposal.id,
            from: proposal.status,
            to,
        });
    }
    debug!(
        "[xcr-03] Proposal {} {} -> {} ({} round)",
        proposal.id, proposal.status, to, proposal.round
    );
    proposal.status = to;
    Ok(())
}

fn status_at_rank(rank: u8) -> ProposalStatus {
    match rank {
        0 => ProposalStatus::Created,
        1 => ProposalStatus::CommitOpen,
        2 => ProposalStatus::CommitClosed,
        3 => ProposalStatus::RevealOpen,
        _ => ProposalStatus::RevealClosed,
    }
}

fn phase_rank(phase: RoundPhase) -> u8 {
    match phase {
        RoundPhase::Commit => 1,
        RoundPhase::Reveal => 3,
        RoundPhase::Closed => 4,
    }
}

impl ProposalStoreApi for ProposalStore {
    fn create(
        &mut self,
        oracle: &dyn EligibilityOracle,
        protocol: Address,
        originator: Address,
        payload_hash: Hash,
        now: Timestamp,
    ) -> ProposalResult<Proposal> {
        if !oracle.is_protocol_registered(&protocol) {
            return Err(ProposalError::UnknownProtocol { protocol });
        }
        if !oracle.is_eligible(&originator, Role::Miner, now) {
            return Err(ProposalError::NotEligible { originator });
        }

        let id = self.next_id;
        let mut proposal = Proposal::new(id, self.chain, protocol, originator, payload_hash, now);
        transition(&mut proposal, ProposalStatus::CommitOpen)?;
        self.next_id += 1;
        self.proposals.insert(id, proposal.clone());

        info!(
            "[xcr-03] Created proposal {} for protocol {} by {} (payload {})",
            id,
            hex::encode(protocol),
            hex::encode(originator),
            hex::encode(payload_hash)
        );
        Ok(proposal)
    }

    fn advance(
        &mut self,
        id: ProposalId,
        round: Round,
        phase: RoundPhase,
        aggregate: Option<&ScoreAggregate>,
    ) -> ProposalResult<ProposalStatus> {
        let proposal = self.get_mut(id)?;
        let target = status_at_rank(phase_rank(phase));

        if proposal.status.is_terminal() {
            return Err(ProposalError::InvalidTransition {
                id,
                from: proposal.status,
                to: target,
            });
        }
        if round != proposal.round {
            // Stale miner-round observation after the validator round opened
            if round == Round::Miner && proposal.round == Round::Validator {
                return Ok(proposal.status);
            }
            return Err(ProposalError::InvalidTransition {
                id,
                from: proposal.status,
                to: target,
            });
        }

        let Some(current) = proposal.status.round_rank() else {
            // Scored or propagated: the validator round is already resolved
            return if phase == RoundPhase::Closed {
                Ok(proposal.status)
            } else {
                Err(ProposalError::InvalidTransition {
                    id,
                    from: proposal.status,
                    to: target,
                })
            };
        };

        let wanted = phase_rank(phase);
        if wanted < current {
            return Err(ProposalError::InvalidTransition {
                id,
                from: proposal.status,
                to: target,
            });
        }
        for rank in current + 1..=wanted {
            transition(proposal, status_at_rank(rank))?;
        }

        if phase == RoundPhase::Closed {
            if let Some(aggregate) = aggregate {
                match round {
                    Round::Miner => match aggregate.resolved_content() {
                        Some(content) => {
                            transition(proposal, ProposalStatus::CommitOpen)?;
                            proposal.content = Some(content);
                            proposal.round = Round::Validator;
                            info!(
                                "[xcr-03] Proposal {} content resolved to {}",
                                id,
                                hex::encode(content)
                            );
                        }
                        None => {
                            transition(proposal, ProposalStatus::Rejected)?;
                            proposal.rejection = Some("no valid miner reveals".to_string());
                            warn!("[xcr-03] Proposal {} rejected: no valid miner reveals", id);
                        }
                    },
                    Round::Validator => {
                        transition(proposal, ProposalStatus::Scored)?;
                        proposal.score = Some(aggregate.clone());
                        info!(
                            "[xcr-03] Proposal {} scored {:?} from {} reveals",
                            id,
                            aggregate.score(),
                            aggregate.valid_reveals
                        );
                    }
                }
            }
        }
        Ok(proposal.status)
    }

    fn finalize(&mut self, id: ProposalId) -> ProposalResult<FinalizedProposal> {
        let required = self.config.min_valid_reveals;
        let proposal = self.get_mut(id)?;

        if proposal.status != ProposalStatus::Scored {
            return Err(ProposalError::InvalidTransition {
                id,
                from: proposal.status,
                to: ProposalStatus::Propagated,
            });
        }
        let aggregate = match &proposal.score {
            Some(agg) if agg.valid_reveals >= required => agg.clone(),
            other => {
                return Err(ProposalError::QuorumNotMet {
                    id,
                    valid_reveals: other.as_ref().map_or(0, |agg| agg.valid_reveals),
                    required,
                })
            }
        };

        transition(proposal, ProposalStatus::Propagated)?;
        proposal.propagation = PropagationState::Pending;
        info!("[xcr-03] Proposal {} finalized, pending propagation", id);

        Ok(FinalizedProposal {
            proposal: proposal.clone(),
            aggregate,
        })
    }

    fn mark_submitted(
        &mut self,
        id: ProposalId,
        nonce: u64,
        receipt: String,
    ) -> ProposalResult<()> {
        let proposal = self.get_mut(id)?;
        if proposal.status != ProposalStatus::Propagated {
            return Err(ProposalError::InvalidTransition {
                id,
                from: proposal.status,
                to: ProposalStatus::Propagated,
            });
        }
        debug!("[xcr-03] Proposal {} submitted with nonce {}", id, nonce);
        proposal.propagation = PropagationState::Submitted { nonce, receipt };
        Ok(())
    }

    fn reject(&mut self, id: ProposalId, reason: &str) -> ProposalResult<()> {
        let proposal = self.get_mut(id)?;
        transition(proposal, ProposalStatus::Rejected)?;
        proposal.rejection = Some(reason.to_string());
        warn!("[xcr-03] Proposal {} rejected: {}", id, reason);
        Ok(())
    }

    fn apply_mirrored(
        &mut self,
        origin: ChainId,
        mut proposal: Proposal,
        aggregate: ScoreAggregate,
    ) -> ProposalResult<bool> {
        let key = (origin, proposal.id);
        if self.mirrored.contains_key(&key) {
            return Ok(false);
        }

        transition(&mut proposal, ProposalStatus::Finalized)?;
        proposal.origin = origin;
        proposal.score = Some(aggregate);
        info!(
            "[xcr-03] Mirrored proposal {} from {} finalized with score {:?}",
            proposal.id,
            origin,
            proposal.final_score()
        );
        self.mirrored.insert(key, proposal);
        Ok(true)
    }

    fn mirrored(&self, origin: ChainId, id: ProposalId) -> Option<&Proposal> {
        self.mirrored.get(&(origin, id))
    }

    fn get(&self, id: ProposalId) -> ProposalResult<&Proposal> {
        self.proposals
            .get(&id)
            .ok_or(ProposalError::NotFound { id })
    }

    fn list(&self) -> Vec<&Proposal> {
        self.proposals.values().collect()
    }

    fn find_open_by(
        &self,
        protocol: &Address,
        originator: &Address,
        payload_hash: &Hash,
    ) -> Option<&Proposal> {
        self.proposals.values().find(|p| {
            !p.status.is_terminal()
                && p.protocol == *protocol
                && p.originator == *originator
                && p.payload_hash == *payload_hash
        })
    }
}
