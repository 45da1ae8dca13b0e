//! xcr: operator CLI for one chain of the cross-chain registry.
//!
//! Each invocation restores the node from its ledger file, runs one step
//! and persists. Messages propagated to the counterparty are appended to
//! the outbox file; the counterparty's operator feeds them to `receive`.

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::{json, Value};
use shared_types::{
    commitment_hash, current_timestamp, generate_salt, ChainId, Hash, RevealValue, Timestamp,
};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use xcr_04_cross_chain_relay::InMemoryBridge;
use xcr_05_orchestrator::{ChainNode, FileLedger, NodeConfig, OrchestratorError, StepOutcome};

use crate::cli::{Cli, Command};

type Node = ChainNode<FileLedger>;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        match err.downcast_ref::<OrchestratorError>() {
            Some(e) => eprintln!("error[{:?}]: {}", e.kind(), e),
            None => eprintln!("error: {:#}", err),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let output = match cli.command {
        Command::Hash {
            content,
            score,
            salt,
        } => commitment(content, score, salt.as_deref())?,
        command => {
            let config = NodeConfig::load(cli.config.as_deref())?;
            let counterparty = config.counterparty;
            let ledger = FileLedger::open(&cli.ledger)
                .with_context(|| format!("opening ledger {}", cli.ledger.display()))?;
            let bridge = Arc::new(InMemoryBridge::new());
            let mut node: Node = ChainNode::restore(config, ledger, bridge.clone())?;
            let now = cli.now.unwrap_or_else(current_timestamp);

            let result = execute(&mut node, command, now).await;
            flush_outbox(&bridge, counterparty, &cli.outbox)?;
            result?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn execute(node: &mut Node, command: Command, now: Timestamp) -> Result<Value> {
    let value = match command {
        Command::RegisterProtocol { protocol } => step(node.register_protocol(protocol, now)?),
        Command::Register {
            address,
            role,
            stake,
        } => step(node.register(address, role, stake, now)?),
        Command::Deregister { address } => step(node.deregister(address, now)?),
        Command::CreateProposal {
            protocol,
            originator,
            payload_hash,
        } => {
            let (id, outcome) = node.create_proposal(protocol, originator, payload_hash, now)?;
            json!({ "proposal": id, "outcome": outcome })
        }
        Command::Commit {
            miner,
            proposal,
            commitment,
        } => step(node.commit(miner, proposal, commitment, now)?),
        Command::Reveal {
            miner,
            proposal,
            content,
            salt,
        } => step(node.reveal(miner, proposal, content, &decode_salt(&salt)?, now)?),
        Command::ScoreCommit {
            validator,
            proposal,
            commitment,
        } => step(node.score_commit(validator, proposal, commitment, now)?),
        Command::ScoreReveal {
            validator,
            proposal,
            score,
            salt,
        } => step(node.score_reveal(validator, proposal, score, &decode_salt(&salt)?, now)?),
        Command::Propagate { proposal } => {
            node.finalize(proposal, now)?;
            step(node.propagate(proposal).await?)
        }
        Command::PropagateValidators => step(node.propagate_validator_set().await?),
        Command::Receive { messages, inbox } => {
            let mut encoded = messages;
            if let Some(path) = inbox {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("reading inbox {}", path.display()))?;
                encoded.extend(
                    raw.lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(String::from),
                );
            }

            let mut applied = Vec::new();
            for line in encoded {
                let bytes = hex::decode(line.trim()).context("message is not hex")?;
                applied.extend(node.receive_encoded(&bytes, now)?);
            }
            json!({ "applied": applied })
        }
        Command::Tick => {
            let expired: Vec<String> = node.tick(now)?.iter().map(|e| e.to_string()).collect();
            json!({ "expired": expired })
        }
        Command::Status => serde_json::to_value(node.status())?,
        Command::Hash { .. } => bail!("hash does not touch node state"),
    };
    Ok(value)
}

fn step(outcome: StepOutcome) -> Value {
    json!({ "outcome": outcome })
}

fn decode_salt(salt: &str) -> Result<Vec<u8>> {
    hex::decode(salt.trim_start_matches("0x")).context("salt is not hex")
}

fn commitment(content: Option<Hash>, score: Option<u64>, salt: Option<&str>) -> Result<Value> {
    let value = match (content, score) {
        (Some(content), None) => RevealValue::from_hash(content),
        (None, Some(score)) => RevealValue::from_score(score),
        _ => bail!("pass exactly one of --content or --score"),
    };
    let salt = match salt {
        Some(salt) => decode_salt(salt)?,
        None => generate_salt().to_vec(),
    };
    Ok(json!({
        "commitment": hex::encode(commitment_hash(&value, &salt)),
        "salt": hex::encode(&salt),
    }))
}

/// Append everything the bridge accepted to the outbox file.
fn flush_outbox(bridge: &InMemoryBridge, destination: ChainId, path: &Path) -> Result<()> {
    let delivered = bridge.take_delivered(destination);
    if delivered.is_empty() {
        return Ok(());
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening outbox {}", path.display()))?;
    for message in &delivered {
        writeln!(file, "{}", hex::encode(message.encode()))?;
    }
    info!(
        "[xcr] Wrote {} messages for {} to {}",
        delivered.len(),
        destination,
        path.display()
    );
    Ok(())
}
