//! Civic ledger daemon: command-line entry point.

mod inspect;
mod script;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use civic_node::{CivicLedger, Collaborators, LedgerConfig};
use civic_nullables::{NullClock, NullIdentityProvider, NullRegistry, NullRewardLedger};
use civic_types::{ProtocolParams, Timestamp, TokenAmount};
use civic_utils::LogFormat;
use clap::Parser;
use serde_json::json;

use crate::script::{Replay, StepOutcome};

#[derive(Parser)]
#[command(name = "civic-daemon", about = "Civic action ledger daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "CIVIC_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the ledger snapshot.
    #[arg(long, env = "CIVIC_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CIVIC_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CIVIC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Collect Prometheus metrics and print them after a replay.
    #[arg(long, env = "CIVIC_ENABLE_METRICS")]
    metrics: bool,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the bootstrap parameter set as TOML.
    Params,
    /// Replay a JSON operation script against an in-memory ledger.
    Replay {
        /// Path to the script (a JSON array of steps).
        script: PathBuf,
        /// Starting clock time in Unix seconds (defaults to now).
        #[arg(long)]
        start: Option<u64>,
        /// Reward treasury size in whole tokens.
        #[arg(long, default_value_t = 1_000_000)]
        treasury: u128,
        /// Do not write the resulting snapshot.
        #[arg(long)]
        no_save: bool,
    },
    /// Summarize the snapshot stored under the data directory.
    Inspect {
        /// Snapshot file to read instead of the one under `data_dir`.
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<LedgerConfig> {
    let mut config = match &cli.config {
        Some(path) => LedgerConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => LedgerConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config.enable_metrics |= cli.metrics;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    civic_utils::init_logging(config.log_format, &config.log_level)
        .context("installing the log subscriber")?;
    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "loaded config");
    }

    match cli.command {
        Command::Params => {
            print!("{}", toml::to_string_pretty(&ProtocolParams::civic_defaults())?);
            Ok(())
        }
        Command::Replay {
            script,
            start,
            treasury,
            no_save,
        } => replay(config, &script, start, treasury, no_save),
        Command::Inspect { path } => {
            let path = path.unwrap_or_else(|| config.snapshot_path());
            let snapshot = civic_node::load_snapshot(&path)
                .with_context(|| format!("reading snapshot {}", path.display()))?;
            print!("{}", inspect::summarize(&snapshot));
            Ok(())
        }
    }
}

fn replay(
    config: LedgerConfig,
    script_path: &std::path::Path,
    start: Option<u64>,
    treasury: u128,
    no_save: bool,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(script_path)
        .with_context(|| format!("reading script {}", script_path.display()))?;
    let steps = script::parse(&text)?;

    let clock = Arc::new(NullClock::new(
        start.unwrap_or_else(|| Timestamp::now().as_secs()),
    ));
    let identity = Arc::new(NullIdentityProvider::new());
    let collaborators = Collaborators {
        clock: clock.clone(),
        identity: identity.clone(),
        registry: Arc::new(NullRegistry::new()),
        rewards: Arc::new(NullRewardLedger::new(TokenAmount::from_tokens(treasury))),
    };
    let snapshot_path = config.snapshot_path();
    let ledger = CivicLedger::new(config, collaborators)?;
    let mut replay = Replay {
        ledger,
        clock,
        identity,
        bindings: script::Bindings::default(),
    };

    tracing::info!(steps = steps.len(), "replaying script");
    let mut rejected = 0usize;
    for (i, step) in steps.into_iter().enumerate() {
        let op = step.name();
        let line = match replay
            .run(step)
            .with_context(|| format!("step {i} ({op})"))?
        {
            StepOutcome::Ok(value) => json!({ "step": i, "op": op, "ok": value }),
            StepOutcome::Rejected(e) => {
                rejected += 1;
                json!({ "step": i, "op": op, "error": e.code(), "message": e.to_string() })
            }
        };
        println!("{line}");
    }

    for entry in replay.ledger.audit_log().entries() {
        println!("{}", serde_json::to_string(entry)?);
    }
    if let Some(metrics) = replay.ledger.metrics() {
        print!("{}", metrics.encode()?);
    }
    if !no_save {
        replay.ledger.save_snapshot(&snapshot_path)?;
        tracing::info!(path = %snapshot_path.display(), rejected, "snapshot written");
    }
    Ok(())
}
