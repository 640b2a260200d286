// # hddnsd - Hetzner DNS record updater
//
// Thin integration layer over hddns-core. All planning, polling and retry
// logic lives in the library; this binary only:
// 1. Parses the command line and environment
// 2. Initializes logging and the runtime
// 3. Loads the YAML configuration and builds the provider and IP source
// 4. Runs the one-shot runner or the sync engine
//
// ## Commands
//
// - `hddnsd apply`: change one record once, then exit
// - `hddnsd daemon`: keep one record pointed at the public IP until stopped
//
// ## Environment
//
// - `HDDNS_CONFIG`: path of the YAML configuration (default `config.yaml`)
// - `HDDNS_LOG_LEVEL`: trace, debug, info, warn or error (default `info`)
// - `HDDNS_DRY_RUN`: resolve and plan, but never send the PUT
//
// ## Example
//
// ```bash
// export HDDNS_CONFIG=/etc/hddns/daemon.yaml
// hddnsd daemon
// ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hddns_core::{ApplyConfig, DaemonConfig, EngineEvent, OneShotRunner, SyncEngine, SyncSettings};
use hddns_ip_http::HttpIpSource;
use hddns_provider_hetzner::HetznerProvider;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (resolution, IP lookup or update failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Debug, Parser)]
#[command(name = "hddnsd", version, about = "Keep a Hetzner DNS record in sync with your public IP")]
struct Cli {
    /// Path of the YAML configuration file
    #[arg(short, long, env = "HDDNS_CONFIG", default_value = "config.yaml", global = true)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "HDDNS_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Resolve and plan, but skip the record update
    #[arg(long, env = "HDDNS_DRY_RUN", global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Change one record once and print the provider's response
    Apply,
    /// Poll the public IP and update the record whenever it changes
    Daemon,
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "HDDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Configuration problems exit with 1, everything else with 2
fn exit_code_for(err: &anyhow::Error) -> DdnsExitCode {
    match err.downcast_ref::<hddns_core::Error>() {
        Some(e) if e.is_config() => DdnsExitCode::ConfigError,
        _ => DdnsExitCode::RuntimeError,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match parse_log_level(&cli.log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let outcome = match cli.command {
            Command::Apply => run_apply(&cli.config, cli.dry_run).await,
            Command::Daemon => run_daemon(&cli.config, cli.dry_run).await,
        };

        match outcome {
            Ok(()) => DdnsExitCode::CleanShutdown,
            Err(e) => {
                error!("{:#}", e);
                exit_code_for(&e)
            }
        }
    });

    result.into()
}

/// Run the one-shot pipeline: print the planned change, write it, print the response
async fn run_apply(config_path: &Path, dry_run: bool) -> Result<()> {
    let config = ApplyConfig::from_file(config_path)
        .with_context(|| format!("Loading {}", config_path.display()))?;

    let provider = HetznerProvider::new(config.token.clone(), config.api_url.clone(), dry_run)?;
    let ip_source = HttpIpSource::new(config.ip_service_url.clone())?;

    let runner = OneShotRunner::new(Box::new(ip_source), Box::new(provider), &config)?;

    let prepared = runner.prepare().await?;
    println!("{}", prepared);
    if prepared.is_noop() {
        info!("Record already matches the requested change, writing anyway");
    }

    let updated = runner.execute(&prepared).await?;
    println!("{}", updated.raw_body);

    Ok(())
}

/// Run the sync engine until a fatal error or SIGINT/SIGTERM
async fn run_daemon(config_path: &Path, dry_run: bool) -> Result<()> {
    let config = DaemonConfig::from_file(config_path)
        .with_context(|| format!("Loading {}", config_path.display()))?;

    let provider = HetznerProvider::new(config.token.clone(), config.api_url.clone(), dry_run)?;
    let ip_source = HttpIpSource::new(config.ip_service_url.clone())?;

    if dry_run {
        warn!("Dry-run mode: records will not be modified");
    }

    info!(
        "Starting hddnsd daemon for {} ({}) in {}, polling every {} minute(s)",
        config.record_name, config.record_type, config.zone_name, config.minutes
    );

    let (engine, event_rx) = SyncEngine::new(
        Box::new(ip_source),
        Box::new(provider),
        SyncSettings::from(&config),
    );

    tokio::spawn(log_events(event_rx));

    engine.run().await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Forward engine events to the debug log
async fn log_events(mut event_rx: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = event_rx.recv().await {
        debug!("Engine event: {:?}", event);
    }
}
