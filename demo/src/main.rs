//! e2totp: demonstration driver for beacon-bound time-based OTPs.
//!
//! Derives the client's OTP from the drand beacon's latest round, and the
//! server's candidate window over recent rounds, at the current time.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use e2totp_beacon::BeaconClient;
use e2totp_crypto::format_code;
use e2totp_deriver::{DeriveError, Derivation, E2TotpConfig, E2TotpDeriver};
use e2totp_types::{SharedKey, Timestamp};
use e2totp_utils::{format_duration, init_logging, LogFormat};

/// Key used by the demonstration when none is supplied.
const DEMO_KEY: &str = "supersecretsharedkey";

#[derive(Parser)]
#[command(name = "e2totp", about = "Beacon-bound time-based one-time passwords")]
struct Cli {
    /// Shared secret as UTF-8 text.
    #[arg(long, default_value = DEMO_KEY, env = "E2TOTP_KEY", hide_env_values = true)]
    key: String,

    /// Shared secret as hex; takes precedence over --key.
    #[arg(long, env = "E2TOTP_KEY_HEX", hide_env_values = true)]
    key_hex: Option<String>,

    /// Reference epoch T0 in Unix seconds.
    #[arg(long, env = "E2TOTP_EPOCH")]
    epoch: Option<u64>,

    /// Seconds per time step.
    #[arg(long, env = "E2TOTP_STEP")]
    step: Option<u64>,

    /// Server skew tolerance in seconds.
    #[arg(long, env = "E2TOTP_TOLERANCE")]
    tolerance: Option<u64>,

    /// Digits per code (1-10).
    #[arg(long, env = "E2TOTP_DIGITS")]
    digits: Option<u32>,

    /// drand relay base URL.
    #[arg(long, env = "E2TOTP_BEACON_URL")]
    beacon_url: Option<String>,

    /// drand chain hash.
    #[arg(long, env = "E2TOTP_CHAIN_HASH")]
    chain_hash: Option<String>,

    /// Per-fetch beacon timeout in milliseconds.
    #[arg(long, env = "E2TOTP_FETCH_TIMEOUT_MS")]
    fetch_timeout_ms: Option<u64>,

    /// Derive at this Unix time instead of the system clock.
    #[arg(long)]
    now: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "E2TOTP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "E2TOTP_LOG_FORMAT")]
    log_format: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Subcommand (defaults to `demo`).
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the client OTP bound to the latest beacon round.
    Client,
    /// Print the server's candidate window.
    Server,
    /// Check a code against the server's candidate window.
    Verify {
        /// The code as displayed, leading zeros allowed.
        code: String,
    },
    /// Client OTP followed by the server window.
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = load_config(cli.config.as_deref())?;
    let config = E2TotpConfig {
        epoch: cli.epoch.unwrap_or(base.epoch),
        step_secs: cli.step.unwrap_or(base.step_secs),
        tolerance_secs: cli.tolerance.unwrap_or(base.tolerance_secs),
        digits: cli.digits.unwrap_or(base.digits),
        fetch_timeout_ms: cli.fetch_timeout_ms.unwrap_or(base.fetch_timeout_ms),
        beacon_url: cli.beacon_url.unwrap_or(base.beacon_url),
        chain_hash: cli.chain_hash.or(base.chain_hash),
        log_level: cli.log_level.unwrap_or(base.log_level),
        log_format: cli.log_format.unwrap_or(base.log_format),
        ..base
    };

    let log_format: LogFormat = config.log_format.parse()?;
    init_logging(log_format, &config.log_level)?;

    if let Some(path) = cli.config.as_ref() {
        tracing::info!("Loaded config from {}", path.display());
    }

    let key = match cli.key_hex {
        Some(ref hex) => SharedKey::from_hex(hex).context("decoding --key-hex")?,
        None => SharedKey::from(cli.key.as_str()),
    };
    let params = config.to_params()?;
    let now = cli.now.map(Timestamp::new).unwrap_or_else(Timestamp::now);

    tracing::info!(
        "Using beacon {} (epoch {}, step {}s, tolerance {}s, {} digits)",
        config.beacon_url,
        config.epoch,
        config.step_secs,
        config.tolerance_secs,
        config.digits,
    );

    let deriver = E2TotpDeriver::new(config.beacon_client(), key, params)?;

    match cli.command.unwrap_or(Command::Demo) {
        Command::Client => print_client(&deriver, &config, now).await?,
        Command::Server => print_server(&deriver, &config, now).await?,
        Command::Verify { code } => {
            let code: u32 = code
                .trim()
                .parse()
                .with_context(|| format!("{code:?} is not a numeric code"))?;
            let verification = deriver.verify(code, now).await?;
            print_window(&verification.derivation, config.digits);
            match verification.matched {
                Some(candidate) => println!(
                    "\nVALID: {} matches round {}",
                    format_code(code, config.digits),
                    candidate.source_round
                ),
                None => anyhow::bail!(
                    "INVALID: {} matches no candidate",
                    format_code(code, config.digits)
                ),
            }
        }
        Command::Demo => {
            print_client(&deriver, &config, now).await?;
            println!();
            print_server(&deriver, &config, now).await?;
        }
    }

    Ok(())
}

async fn print_client<B: BeaconClient>(
    deriver: &E2TotpDeriver<B>,
    config: &E2TotpConfig,
    now: Timestamp,
) -> anyhow::Result<()> {
    let candidate = deriver.derive_client(now).await?;
    let step = deriver.time_step(now)?;
    let remaining = step.seconds_remaining(deriver.params().epoch, now, config.step_secs);

    println!("CLIENT E2TOTP (step {step}):");
    println!(
        "  round {:>10}  code {}  (step ends in {})",
        candidate.source_round,
        format_code(candidate.code, config.digits),
        format_duration(Duration::from_secs(remaining)),
    );
    Ok(())
}

async fn print_server<B: BeaconClient>(
    deriver: &E2TotpDeriver<B>,
    config: &E2TotpConfig,
    now: Timestamp,
) -> anyhow::Result<()> {
    let window = deriver
        .derive_server_until(now, interrupted(tokio::signal::ctrl_c()))
        .await?;
    print_window(&window, config.digits);
    Ok(())
}

/// Config from `--config`, or the defaults when no file is named. A named file
/// that cannot be read or parsed is an error: codes derived from the wrong
/// epoch or step would never match.
fn load_config(path: Option<&Path>) -> Result<E2TotpConfig, DeriveError> {
    match path {
        Some(path) => E2TotpConfig::from_toml_file(path),
        None => Ok(E2TotpConfig::default()),
    }
}

/// Resolves once `signal` fires. If the signal cannot be listened for, never
/// resolves, so the window runs to completion instead of being abandoned.
async fn interrupted<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!("Interrupted, returning partial window"),
        Err(e) => {
            tracing::warn!("Cannot listen for Ctrl-C ({e}), window will not be interruptible");
            std::future::pending::<()>().await
        }
    }
}

fn print_window(window: &Derivation, digits: u32) {
    println!(
        "SERVER E2TOTP candidates (step {}, latest round {}):",
        window.time_step, window.latest_round
    );
    for candidate in window.candidates() {
        println!(
            "  round {:>10}  code {}",
            candidate.source_round,
            format_code(candidate.code, digits)
        );
    }
    for failure in &window.failures {
        println!("  round {:>10}  skipped: {}", failure.round, failure.error);
    }
    for round in &window.abandoned {
        println!("  round {:>10}  abandoned", round);
    }
    println!(
        "  {} of {} rounds succeeded, {} failed{}",
        window.succeeded(),
        window.requested,
        window.failure_count(),
        if window.genesis_reached {
            ", window reached genesis"
        } else {
            ""
        }
    );
}
