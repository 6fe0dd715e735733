//! Tracing Setup
//!
//! Installs a console layer and a session log file layer.
//!
//! - Console: this crate at `logging.console_level`
//! - Session file: this crate at `logging.trading_level`, written to
//!   `<logging.dir>/<app_name>_<YYYYmmdd_HHMMSS>.log`
//! - Every other crate at `logging.library_level` on both
//!
//! `RUST_LOG`, when set, replaces both filters.
//!
//! # Usage
//!
//! ```rust,ignore
//! use level_trader::telemetry::init_tracing;
//!
//! let path = init_tracing(&config.logging, &config.trading.app_name, chrono::Local::now())?;
//! ```

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Target of this crate's events.
const CRATE_TARGET: &str = "level_trader";

/// Session log file for a run started at `started`.
#[must_use]
pub fn session_log_path<Tz: TimeZone>(dir: &Path, app_name: &str, started: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    dir.join(format!("{app_name}_{}.log", started.format("%Y%m%d_%H%M%S")))
}

/// Filter directives: `library` for everything, `level` for this crate.
#[must_use]
pub fn filter_directives(level: &str, library: &str) -> String {
    format!("{library},{CRATE_TARGET}={level}")
}

fn filter(level: &str, library: &str) -> EnvFilter {
    match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(filter_directives(level, library)),
    }
}

/// Install the global tracing subscriber.
///
/// Returns the session log file path.
///
/// # Errors
///
/// Fails if the log directory or file cannot be created, or a global
/// subscriber is already installed.
pub fn init_tracing<Tz: TimeZone>(
    logging: &LoggingConfig,
    app_name: &str,
    started: &DateTime<Tz>,
) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let dir = Path::new(&logging.dir);
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let path = session_log_path(dir, app_name, started);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let _ = FILE_GUARD.set(guard);

    let console_layer = fmt::layer()
        .with_target(false)
        .with_filter(filter(&logging.console_level, &logging.library_level));
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(writer)
        .with_filter(filter(&logging.trading_level, &logging.library_level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_log_path_stamped() {
        let started = DateTime::parse_from_rfc3339("2024-03-15T09:25:07-04:00").unwrap();
        let path = session_log_path(Path::new("logs"), "level_trader", &started);
        assert_eq!(path, Path::new("logs/level_trader_20240315_092507.log"));
    }

    #[test]
    fn filter_directives_scoped_to_crate() {
        assert_eq!(filter_directives("debug", "warn"), "warn,level_trader=debug");
    }
}
