//! Replay binary: ingest an ordered NDJSON event log and report aggregates
//! or compute a user's claim.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;

use floorledger::adapter::{JsonMetadataDecoder, RpcTokenMetadataSource, StaticTokenMetadataSource};
use floorledger::app::{prepare_claim, Ledger};
use floorledger::config::Config;
use floorledger::domain::{
    EventEnvelope, PaymentToken, TransferRecord, User, UserId, VirtualFloor, VirtualFloorId,
};
use floorledger::port::TokenMetadataSource;

#[derive(Parser)]
#[command(name = "floorledger", version, about = "Virtual-floor ledger replay")]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay an event log and print aggregate totals.
    Ingest {
        /// Newline-delimited JSON event envelopes, in strict order.
        #[arg(long)]
        events: PathBuf,

        /// Preloaded ERC-20 metadata (JSON map keyed by token address).
        /// When omitted, metadata is read over JSON-RPC per `[rpc]` config.
        #[arg(long)]
        tokens: Option<PathBuf>,
    },
    /// Replay an event log, then compute one user's claim on one floor.
    Claim {
        #[arg(long)]
        events: PathBuf,

        #[arg(long)]
        tokens: Option<PathBuf>,

        /// Virtual-floor id.
        #[arg(long)]
        virtual_floor: String,

        /// User address.
        #[arg(long)]
        user: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    config.logging.init();

    match cli.command {
        Command::Ingest { events, tokens } => {
            let mut ledger = build_ledger(&config, tokens.as_deref())?;
            let applied = replay(&mut ledger, &events)?;

            let store = ledger.snapshot();
            println!("events applied: {applied}");
            println!("payment tokens: {}", store.count::<PaymentToken>());
            println!("virtual floors: {}", store.count::<VirtualFloor>());
            println!("users: {}", store.count::<User>());
            println!("transfer records: {}", store.count::<TransferRecord>());
        }
        Command::Claim {
            events,
            tokens,
            virtual_floor,
            user,
        } => {
            let mut ledger = build_ledger(&config, tokens.as_deref())?;
            replay(&mut ledger, &events)?;

            let store = ledger.snapshot();
            let claim = prepare_claim(
                &store,
                &VirtualFloorId::from(virtual_floor),
                &UserId::from(user),
            )?;
            match claim {
                Some(claim) => println!("{}", serde_json::to_string_pretty(&claim)?),
                None => println!("no claim: virtual floor is still active"),
            }
        }
    }

    Ok(())
}

fn build_ledger(
    config: &Config,
    tokens: Option<&Path>,
) -> anyhow::Result<Ledger<JsonMetadataDecoder, Box<dyn TokenMetadataSource>>> {
    let source: Box<dyn TokenMetadataSource> = match tokens {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading token metadata from {}", path.display()))?;
            Box::new(StaticTokenMetadataSource::from_json(&json)?)
        }
        None => Box::new(RpcTokenMetadataSource::new(config.rpc.url.clone())),
    };
    Ok(Ledger::new(
        JsonMetadataDecoder::new(),
        source,
        config.windows.clone(),
    ))
}

fn replay(
    ledger: &mut Ledger<JsonMetadataDecoder, Box<dyn TokenMetadataSource>>,
    events: &Path,
) -> anyhow::Result<usize> {
    let file =
        File::open(events).with_context(|| format!("opening event log {}", events.display()))?;

    let mut applied = 0usize;
    for (line_index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let envelope: EventEnvelope = serde_json::from_str(&line)
            .with_context(|| format!("parsing event at line {}", line_index + 1))?;
        apply_with_retry(ledger, &envelope)?;
        applied += 1;
    }
    Ok(applied)
}

/// Transient failures (token-metadata reads) are retried against the same
/// event with backoff; any other failure halts the replay at its position.
fn apply_with_retry(
    ledger: &mut Ledger<JsonMetadataDecoder, Box<dyn TokenMetadataSource>>,
    envelope: &EventEnvelope,
) -> anyhow::Result<()> {
    const MAX_ATTEMPTS: u32 = 4;

    let mut attempt = 1;
    loop {
        match ledger.apply(envelope) {
            Ok(()) => return Ok(()),
            Err(error) if error.is_transient() && attempt < MAX_ATTEMPTS => {
                warn!(position = %envelope.position(), attempt, %error, "transient failure, retrying");
                std::thread::sleep(Duration::from_secs(1 << attempt));
                attempt += 1;
            }
            Err(error) => {
                return Err(anyhow::Error::from(error)
                    .context(format!("ingestion halted at {}", envelope.position())));
            }
        }
    }
}
