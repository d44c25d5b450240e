//! lapse: command line front end for the expiring balance ledger.

mod script;

use anyhow::Context;
use clap::Parser;
use lapse_ledger::{ExpiringBalanceLedger, LedgerConfig, TransferPolicy};
use lapse_types::Tick;
use lapse_utils::{format_duration_ms, LogFormat};
use lapse_window::{SystemTicker, TickSource, WindowClock};
use std::path::PathBuf;

use crate::script::Script;

#[derive(Parser)]
#[command(name = "lapse", about = "Expiring balance ledger tools")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings are
    /// used as the base; CLI flags and env vars override them.
    #[arg(long, env = "LAPSE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "LAPSE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "LAPSE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Milliseconds per tick.
    #[arg(long, env = "LAPSE_TICK_DURATION_MS")]
    tick_duration_ms: Option<u64>,

    /// Slots per era.
    #[arg(long, env = "LAPSE_SLOTS_PER_ERA")]
    slots_per_era: Option<u32>,

    /// Frame size in slots.
    #[arg(long, env = "LAPSE_FRAME_SIZE")]
    frame_size: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Show where a tick falls on the window clock.
    Window {
        /// Tick to inspect. Defaults to the wall-clock tick.
        #[arg(long)]
        tick: Option<u64>,
    },
    /// Run an operation script against a fresh ledger, one JSON line per op.
    Replay {
        script: PathBuf,

        /// Transfer policy, overriding the config file.
        #[arg(long, value_parser = parse_policy)]
        policy: Option<TransferPolicy>,

        /// Stop at the first refused operation.
        #[arg(long)]
        fail_fast: bool,
    },
}

fn parse_policy(s: &str) -> Result<TransferPolicy, String> {
    match s {
        "preserve_origin" | "preserve-origin" => Ok(TransferPolicy::PreserveOrigin),
        "remint" => Ok(TransferPolicy::Remint),
        other => Err(format!("unknown transfer policy: {other}")),
    }
}

impl Cli {
    /// Config file (or defaults) with command line overrides applied.
    fn load_config(&self) -> anyhow::Result<LedgerConfig> {
        let mut config = match &self.config {
            Some(path) => LedgerConfig::from_toml_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => LedgerConfig::default(),
        };
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(ms) = self.tick_duration_ms {
            config.window.tick_duration_ms = ms;
        }
        if let Some(slots) = self.slots_per_era {
            config.window.slots_per_era = slots;
        }
        if let Some(frame) = self.frame_size {
            config.window.frame_size = frame;
        }
        config
            .window
            .validate()
            .context("invalid window parameters")?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    lapse_utils::init_logging(config.log_format, &config.log_level);

    if let Some(path) = &cli.config {
        tracing::info!(config = %path.display(), "loaded configuration");
    }

    match cli.command {
        Command::Window { tick } => {
            let clock = config.clock()?;
            let tick = tick
                .map(Tick::new)
                .unwrap_or_else(|| SystemTicker::new(&config.window).current_tick());
            print_window(&clock, tick);
        }
        Command::Replay {
            script,
            policy,
            fail_fast,
        } => {
            let script = Script::from_toml_file(&script)?;
            let mut ledger = ExpiringBalanceLedger::from_config(&config, SystemTicker::new(&config.window))?;
            if let Some(policy) = policy {
                ledger = ledger.with_policy(policy);
            }
            tracing::info!(ops = script.ops.len(), policy = ?ledger.policy(), "replaying script");

            for outcome in script.replay(&mut ledger)? {
                println!("{}", serde_json::to_string(&outcome)?);
                if fail_fast && !outcome.ok {
                    anyhow::bail!(
                        "op {} ({}) refused: {}",
                        outcome.index,
                        outcome.op,
                        outcome.error.unwrap_or_default()
                    );
                }
            }
        }
    }

    Ok(())
}

fn print_window(clock: &WindowClock, tick: Tick) {
    let params = clock.params();
    let coordinate = clock.coordinate_of(tick);
    println!("tick          {tick}");
    println!("coordinate    {coordinate}");
    println!("frame         {}", clock.frame(tick));
    println!("safe frame    {}", clock.safe_frame(tick));
    match clock.expires_at(coordinate) {
        Some(expiry) => {
            let remaining_ms = tick
                .elapsed_since(expiry)
                .saturating_mul(params.tick_duration_ms);
            println!(
                "expires at    {expiry} (in {})",
                format_duration_ms(remaining_ms)
            );
        }
        None => println!("expires at    never (past the end of the clock)"),
    }
    println!(
        "slot length   {} ticks ({})",
        clock.ticks_per_slot(),
        format_duration_ms(clock.ticks_per_slot().saturating_mul(params.tick_duration_ms))
    );
    println!("retention     {}", format_duration_ms(clock.retention_ms()));
    println!(
        "fast path     {}",
        if clock.uses_fast_path() { "yes" } else { "no" }
    );
}
