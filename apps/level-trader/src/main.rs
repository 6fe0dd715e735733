//! Level Trader Binary
//!
//! Runs the level-crossing trading loop against the paper venue until the
//! session closes, shutdown is requested or a fatal error occurs.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin level-trader -- --config level-trader.yaml --verbose
//! ```
//!
//! # Environment Variables
//!
//! - `LEVEL_TRADER_CONFIG`: Config file (default: `level-trader.yaml` when present)
//! - `LEVEL_TRADER_INSTRUCTIONS`: Instruction file, overrides `instructions.path`
//! - `LEVEL_TRADER_ACCOUNT`: Account, overrides `account`
//! - `RUST_LOG`: Replaces the console and session log filters

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use level_trader::application::services::{Supervisor, SupervisorExit, TradingSession};
use level_trader::config::{Config, DEFAULT_CONFIG_PATH, load_config, validate_config};
use level_trader::error::ErrorKind;
use level_trader::infrastructure::{
    PaperMarket, PaperVenue, TradingHoursCalendar, YamlInstructionSource,
};
use level_trader::telemetry::init_tracing;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Level-crossing bracket order trading client.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Configuration file.
    #[arg(long, env = "LEVEL_TRADER_CONFIG")]
    config: Option<String>,

    /// Instruction file.
    #[arg(long, env = "LEVEL_TRADER_INSTRUCTIONS")]
    instructions: Option<String>,

    /// Account to trade; "0" selects the first managed account.
    #[arg(long, env = "LEVEL_TRADER_ACCOUNT")]
    account: Option<String>,

    /// Stop on the first recoverable failure.
    #[arg(long)]
    fail_fast: bool,

    /// Debug level in the session log.
    #[arg(long)]
    debug: bool,

    /// Info level on the console.
    #[arg(long)]
    verbose: bool,

    /// Open a short session a few seconds from now.
    #[arg(long)]
    test_right_now: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(instructions) = &self.instructions {
            config.instructions.path.clone_from(instructions);
        }
        if let Some(account) = &self.account {
            config.account.clone_from(account);
        }
        if self.fail_fast {
            config.supervisor.fail_fast = true;
        }
        if self.debug {
            config.logging.trading_level = "debug".to_string();
        }
        if self.verbose {
            config.logging.console_level = "info".to_string();
        }
        if self.test_right_now {
            config.session.test_right_now = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    load_dotenv();
    let cli = Cli::parse();

    let config = build_config(&cli)?;
    let started = chrono::Local::now();
    let log_path = init_tracing(&config.logging, &config.trading.app_name, &started)?;

    tracing::info!(log = %log_path.display(), "Starting level trader");
    log_config(&config);

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let mut supervisor = create_supervisor(&config, started.fixed_offset()).await?;
    match supervisor.run(shutdown).await {
        Ok(SupervisorExit::SessionDone) => {
            tracing::info!("Session complete");
            Ok(ExitCode::SUCCESS)
        }
        Ok(SupervisorExit::MarketClosed) => {
            tracing::warn!("Market closed today, nothing to trade");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.kind() == ErrorKind::Shutdown => Ok(ExitCode::SUCCESS),
        Err(e) => Err(e).context("level trader stopped"),
    }
}

/// Config file, then command line flags.
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match cli.config.as_deref() {
        Some(path) => load_config(Some(path))?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config(None)?,
        None => Config::default(),
    };
    cli.apply(&mut config);
    validate_config(&config)?;
    Ok(config)
}

fn log_config(config: &Config) {
    tracing::info!(
        host = %config.venue.host,
        port = config.venue.port,
        client_id = config.venue.client_id,
        "Paper venue standing in for gateway"
    );
    tracing::info!(
        account = %config.account,
        instructions = %config.instructions.path,
        bar_size_secs = config.trading.bar_size_secs,
        test_right_now = config.session.test_right_now,
        fail_fast = config.supervisor.fail_fast,
        "Configuration loaded"
    );
}

type PaperSupervisor =
    Supervisor<PaperVenue, TradingHoursCalendar<PaperVenue>, YamlInstructionSource>;

async fn create_supervisor(
    config: &Config,
    now: chrono::DateTime<chrono::FixedOffset>,
) -> Result<PaperSupervisor> {
    let market = match &config.paper.market {
        Some(path) => PaperMarket::load(Path::new(path))
            .await
            .with_context(|| format!("failed to load paper market {path}"))?,
        None => PaperMarket::default(),
    };
    tracing::info!(
        listings = market.listings.len(),
        steps = market.steps.len(),
        "Paper market loaded"
    );

    let venue = Arc::new(PaperVenue::with_market(
        config.paper_venue_config(now)?,
        &market,
    ));
    let calendar = Arc::new(TradingHoursCalendar::new(Arc::clone(&venue)));
    let source = Arc::new(YamlInstructionSource::new(&config.instructions.path));
    let session = TradingSession::new(
        Arc::clone(&venue),
        calendar,
        source,
        config.session_settings()?,
    );

    Ok(Supervisor::new(
        venue,
        session,
        config.supervisor_policy(),
        config.reconnect_pause(),
        config.account.clone(),
    ))
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::warn!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            tracing::warn!("Received SIGTERM, shutting down");
        }
    }

    shutdown.cancel();
}
