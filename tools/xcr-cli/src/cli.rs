//! Command-line arguments.

use clap::{Parser, Subcommand};
use shared_types::{parse_address, parse_hash, Address, Hash, ProposalId, Role, Stake};
use std::path::PathBuf;

/// xcr: drive one chain of the cross-chain registry
#[derive(Parser, Debug)]
#[command(name = "xcr")]
#[command(about = "Operator CLI for the cross-chain commit-reveal registry")]
pub struct Cli {
    /// Node config (JSON); XCR_* environment variables override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Ledger file holding this chain's state
    #[arg(short, long, default_value = "xcr-ledger.json")]
    pub ledger: PathBuf,

    /// File propagated messages are appended to, one hex message per line
    #[arg(short, long, default_value = "xcr-outbox.txt")]
    pub outbox: PathBuf,

    /// Override the current time (unix seconds)
    #[arg(long)]
    pub now: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a governed protocol by its governor address
    RegisterProtocol {
        #[arg(value_parser = parse_address)]
        protocol: Address,
    },
    /// Register a miner or validator
    Register {
        #[arg(value_parser = parse_address)]
        address: Address,
        /// miner | validator
        role: Role,
        stake: Stake,
    },
    /// Schedule a participant's exit
    Deregister {
        #[arg(value_parser = parse_address)]
        address: Address,
    },
    /// Create a proposal against a registered protocol and open its miner round
    CreateProposal {
        #[arg(value_parser = parse_address)]
        protocol: Address,
        #[arg(value_parser = parse_address)]
        originator: Address,
        #[arg(value_parser = parse_hash)]
        payload_hash: Hash,
    },
    /// Commit to proposal content (miner round)
    Commit {
        #[arg(value_parser = parse_address)]
        miner: Address,
        proposal: ProposalId,
        #[arg(value_parser = parse_hash)]
        commitment: Hash,
    },
    /// Reveal proposal content (miner round)
    Reveal {
        #[arg(value_parser = parse_address)]
        miner: Address,
        proposal: ProposalId,
        #[arg(value_parser = parse_hash)]
        content: Hash,
        /// Salt used in the commitment (hex)
        salt: String,
    },
    /// Commit to a score (validator round)
    ScoreCommit {
        #[arg(value_parser = parse_address)]
        validator: Address,
        proposal: ProposalId,
        #[arg(value_parser = parse_hash)]
        commitment: Hash,
    },
    /// Reveal a score (validator round)
    ScoreReveal {
        #[arg(value_parser = parse_address)]
        validator: Address,
        proposal: ProposalId,
        score: u64,
        /// Salt used in the commitment (hex)
        salt: String,
    },
    /// Finalize a scored proposal and send it to the counterparty
    Propagate { proposal: ProposalId },
    /// Send pending validator-set changes to the counterparty
    PropagateValidators,
    /// Ingest hex-encoded messages from the counterparty
    Receive {
        /// Hex-encoded messages
        messages: Vec<String>,
        /// File with one hex message per line
        #[arg(long)]
        inbox: Option<PathBuf>,
    },
    /// Apply elapsed deadlines
    Tick,
    /// Show node state
    Status,
    /// Compute a commitment hash, generating a salt if none is given
    Hash {
        /// Content hash to commit to
        #[arg(long, value_parser = parse_hash, conflicts_with = "score")]
        content: Option<Hash>,
        /// Score to commit to
        #[arg(long)]
        score: Option<u64>,
        /// Salt (hex)
        #[arg(long)]
        salt: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOVERNOR: &str = "0x9090909090909090909090909090909090909090";
    const MINER: &str = "1111111111111111111111111111111111111111";

    #[test]
    fn test_parse_register_protocol() {
        let cli = Cli::try_parse_from(["xcr", "register-protocol", GOVERNOR]).unwrap();
        match cli.command {
            Command::RegisterProtocol { protocol } => assert_eq!(protocol, [0x90; 20]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_create_proposal_names_protocol() {
        let payload = "aa".repeat(32);
        let cli = Cli::try_parse_from(["xcr", "create-proposal", GOVERNOR, MINER, payload.as_str()])
            .unwrap();
        match cli.command {
            Command::CreateProposal {
                protocol,
                originator,
                payload_hash,
            } => {
                assert_eq!(protocol, [0x90; 20]);
                assert_eq!(originator, [0x11; 20]);
                assert_eq!(payload_hash, [0xAA; 32]);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        // The protocol is required
        assert!(Cli::try_parse_from(["xcr", "create-proposal", MINER, payload.as_str()]).is_err());
    }
}
