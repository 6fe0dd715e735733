//! Configuration for the level trader.
//!
//! Loads a YAML file with environment variable interpolation, fills every
//! missing field with its default and validates the result. Command line
//! flags are applied on top by the binary.
//!
//! # Usage
//!
//! ```rust,ignore
//! use level_trader::config::{Config, load_config};
//!
//! // Load from default path (level-trader.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("config/paper.yaml"))?;
//!
//! println!("instructions: {}", config.instructions.path);
//! ```
//!
//! # Layout
//!
//! ```yaml
//! venue:
//!   host: ${VENUE_HOST:-127.0.0.1}
//!   port: 7497
//!   client_id: 0
//!   connect_timeout_secs: 10
//! account: "0"
//! instructions:
//!   path: instructions.yaml
//! trading:
//!   app_name: level_trader
//!   routing_exchange: SMART
//!   bar_size_secs: 60
//!   derivative_quote_wait_ms: 500
//! session:
//!   reference_symbol: AAPL
//!   reference_currency: USD
//!   default_open: "09:30"
//!   default_close: "16:00"
//!   test_right_now: false
//! supervisor:
//!   fail_fast: false
//!   max_recoverable_failures: 100
//!   loop_interval_ms: 100
//!   reconnect_initial_ms: 1000
//!   reconnect_max_ms: 60000
//!   reconnect_multiplier: 2.0
//!   entry_fill_poll_ms: 1
//!   entry_fill_timeout_secs: 30
//!   log_accounts: false
//! logging:
//!   dir: logs
//!   trading_level: info
//!   console_level: warn
//!   library_level: warn
//! paper:
//!   market: paper-market.yaml
//!   start: "2024-03-15T09:25:00-04:00"
//!   accounts: [DU0000001]
//!   commission_per_unit: "0.65"
//!   duplicate_notifications: false
//!   realtime: true
//! ```

use std::time::Duration;

use chrono::{DateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::services::{ReconnectPause, SessionSettings, SupervisorPolicy};
use crate::domain::market::{BarSize, ContractSpec};
use crate::domain::session::SessionDefaults;
use crate::domain::shared::{Symbol, VenueTime};
use crate::infrastructure::venue::PaperVenueConfig;

/// Default configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "level-trader.yaml";

/// Log levels accepted by the logging section.
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Venue endpoint.
    #[serde(default)]
    pub venue: VenueConfig,
    /// Account to trade; `"0"` selects the first managed account.
    #[serde(default = "default_account")]
    pub account: String,
    /// Instruction file.
    #[serde(default)]
    pub instructions: InstructionsConfig,
    /// Order composition and market data.
    #[serde(default)]
    pub trading: TradingConfig,
    /// Market session.
    #[serde(default)]
    pub session: SessionConfig,
    /// Reconnection supervisor.
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    /// Session log and console output.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Paper venue.
    #[serde(default)]
    pub paper: PaperConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            venue: VenueConfig::default(),
            account: default_account(),
            instructions: InstructionsConfig::default(),
            trading: TradingConfig::default(),
            session: SessionConfig::default(),
            supervisor: SupervisorConfig::default(),
            logging: LoggingConfig::default(),
            paper: PaperConfig::default(),
        }
    }
}

fn default_account() -> String {
    "0".to_string()
}

/// Venue endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueConfig {
    /// Gateway host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Gateway port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Client id of this connection.
    #[serde(default)]
    pub client_id: i32,
    /// Bound on a single connection attempt.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_id: 0,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    7497
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

/// Instruction file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionsConfig {
    /// Path of the YAML instruction file.
    #[serde(default = "default_instructions_path")]
    pub path: String,
}

impl Default for InstructionsConfig {
    fn default() -> Self {
        Self {
            path: default_instructions_path(),
        }
    }
}

fn default_instructions_path() -> String {
    "instructions.yaml".to_string()
}

/// Order composition and market data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Name stamped into order references and the session log file name.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Routing exchange for every contract.
    #[serde(default = "default_routing_exchange")]
    pub routing_exchange: String,
    /// Intraday bar size in seconds.
    #[serde(default = "default_bar_size_secs")]
    pub bar_size_secs: u32,
    /// Time given to a freshly subscribed derivative quote.
    #[serde(default = "default_derivative_quote_wait_ms")]
    pub derivative_quote_wait_ms: u64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            routing_exchange: default_routing_exchange(),
            bar_size_secs: default_bar_size_secs(),
            derivative_quote_wait_ms: default_derivative_quote_wait_ms(),
        }
    }
}

fn default_app_name() -> String {
    "level_trader".to_string()
}

fn default_routing_exchange() -> String {
    "SMART".to_string()
}

const fn default_bar_size_secs() -> u32 {
    60
}

const fn default_derivative_quote_wait_ms() -> u64 {
    500
}

/// Market session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Contract whose trading hours define the session.
    #[serde(default = "default_reference_symbol")]
    pub reference_symbol: String,
    /// Currency of the reference contract.
    #[serde(default = "default_reference_currency")]
    pub reference_currency: String,
    /// Open used when the calendar has none, `HH:MM` venue local.
    #[serde(default = "default_open")]
    pub default_open: String,
    /// Close used when the calendar has none, `HH:MM` venue local.
    #[serde(default = "default_close")]
    pub default_close: String,
    /// Open a short session a few seconds from now.
    #[serde(default)]
    pub test_right_now: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reference_symbol: default_reference_symbol(),
            reference_currency: default_reference_currency(),
            default_open: default_open(),
            default_close: default_close(),
            test_right_now: false,
        }
    }
}

fn default_reference_symbol() -> String {
    "AAPL".to_string()
}

fn default_reference_currency() -> String {
    "USD".to_string()
}

fn default_open() -> String {
    "09:30".to_string()
}

fn default_close() -> String {
    "16:00".to_string()
}

/// Reconnection supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Escalate the first recoverable failure.
    #[serde(default)]
    pub fail_fast: bool,
    /// Recoverable failures tolerated before giving up.
    #[serde(default = "default_max_recoverable_failures")]
    pub max_recoverable_failures: u32,
    /// Time each yield point pumps venue traffic.
    #[serde(default = "default_loop_interval_ms")]
    pub loop_interval_ms: u64,
    /// First reconnect pause.
    #[serde(default = "default_reconnect_initial_ms")]
    pub reconnect_initial_ms: u64,
    /// Longest reconnect pause.
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
    /// Growth of the reconnect pause per attempt.
    #[serde(default = "default_reconnect_multiplier")]
    pub reconnect_multiplier: f64,
    /// Poll interval while waiting for an entry fill.
    #[serde(default = "default_entry_fill_poll_ms")]
    pub entry_fill_poll_ms: u64,
    /// Bound on the entry fill wait.
    #[serde(default = "default_entry_fill_timeout_secs")]
    pub entry_fill_timeout_secs: u64,
    /// Log the managed accounts on every connection.
    #[serde(default)]
    pub log_accounts: bool,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            max_recoverable_failures: default_max_recoverable_failures(),
            loop_interval_ms: default_loop_interval_ms(),
            reconnect_initial_ms: default_reconnect_initial_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
            reconnect_multiplier: default_reconnect_multiplier(),
            entry_fill_poll_ms: default_entry_fill_poll_ms(),
            entry_fill_timeout_secs: default_entry_fill_timeout_secs(),
            log_accounts: false,
        }
    }
}

const fn default_max_recoverable_failures() -> u32 {
    100
}

const fn default_loop_interval_ms() -> u64 {
    100
}

const fn default_reconnect_initial_ms() -> u64 {
    1_000
}

const fn default_reconnect_max_ms() -> u64 {
    60_000
}

const fn default_reconnect_multiplier() -> f64 {
    2.0
}

const fn default_entry_fill_poll_ms() -> u64 {
    1
}

const fn default_entry_fill_timeout_secs() -> u64 {
    30
}

/// Session log and console output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory of the session log files.
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Level of this crate's events in the session log.
    #[serde(default = "default_trading_level")]
    pub trading_level: String,
    /// Level of this crate's events on the console.
    #[serde(default = "default_console_level")]
    pub console_level: String,
    /// Level of every other crate's events.
    #[serde(default = "default_library_level")]
    pub library_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            trading_level: default_trading_level(),
            console_level: default_console_level(),
            library_level: default_library_level(),
        }
    }
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_trading_level() -> String {
    "info".to_string()
}

fn default_console_level() -> String {
    "warn".to_string()
}

fn default_library_level() -> String {
    "warn".to_string()
}

/// Paper venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperConfig {
    /// Paper market document; an empty market when absent.
    #[serde(default)]
    pub market: Option<String>,
    /// Simulated clock start, RFC 3339; the wall clock when absent.
    #[serde(default)]
    pub start: Option<String>,
    /// Managed accounts.
    #[serde(default = "default_paper_accounts")]
    pub accounts: Vec<String>,
    /// Commission charged per filled unit.
    #[serde(default = "default_commission_per_unit")]
    pub commission_per_unit: Decimal,
    /// Deliver every fill and commission notification twice.
    #[serde(default)]
    pub duplicate_notifications: bool,
    /// Advance the simulated clock with wall time.
    #[serde(default = "default_true")]
    pub realtime: bool,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            market: None,
            start: None,
            accounts: default_paper_accounts(),
            commission_per_unit: default_commission_per_unit(),
            duplicate_notifications: false,
            realtime: true,
        }
    }
}

fn default_paper_accounts() -> Vec<String> {
    vec!["DU0000001".to_string()]
}

const fn default_commission_per_unit() -> Decimal {
    Decimal::from_parts(65, 0, 0, false, 2)
}

const fn default_true() -> bool {
    true
}

// ============================================
// Derived settings
// ============================================

impl Config {
    /// Settings of the trading session.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an unsupported bar size or a malformed
    /// default open or close.
    pub fn session_settings(&self) -> Result<SessionSettings, ConfigError> {
        let intraday_bar = BarSize::from_seconds(self.trading.bar_size_secs)
            .map_err(|e| ConfigError::ValidationError(format!("trading.bar_size_secs: {e}")))?;

        Ok(SessionSettings {
            app_name: self.trading.app_name.clone(),
            routing_exchange: self.trading.routing_exchange.clone(),
            reference: ContractSpec::stock(
                Symbol::new(self.session.reference_symbol.as_str()),
                self.session.reference_currency.clone(),
                self.trading.routing_exchange.clone(),
            ),
            defaults: SessionDefaults {
                open: parse_time("session.default_open", &self.session.default_open)?,
                close: parse_time("session.default_close", &self.session.default_close)?,
                test_right_now: self.session.test_right_now,
            },
            intraday_bar,
            pump_interval: Duration::from_millis(self.supervisor.loop_interval_ms),
            derivative_quote_wait: Duration::from_millis(self.trading.derivative_quote_wait_ms),
            entry_fill_poll: Duration::from_millis(self.supervisor.entry_fill_poll_ms),
            entry_fill_timeout: Duration::from_secs(self.supervisor.entry_fill_timeout_secs),
        })
    }

    /// Failure handling of the supervisor.
    #[must_use]
    pub const fn supervisor_policy(&self) -> SupervisorPolicy {
        SupervisorPolicy {
            fail_fast: self.supervisor.fail_fast,
            max_recoverable_failures: self.supervisor.max_recoverable_failures,
            log_accounts: self.supervisor.log_accounts,
            connect_timeout: Duration::from_secs(self.venue.connect_timeout_secs),
        }
    }

    /// Reconnect pause schedule.
    #[must_use]
    pub const fn reconnect_pause(&self) -> ReconnectPause {
        ReconnectPause::with_params(
            Duration::from_millis(self.supervisor.reconnect_initial_ms),
            Duration::from_millis(self.supervisor.reconnect_max_ms),
            self.supervisor.reconnect_multiplier,
        )
    }

    /// Paper venue settings, starting at `now` unless a start is configured.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a malformed start.
    pub fn paper_venue_config(&self, now: VenueTime) -> Result<PaperVenueConfig, ConfigError> {
        let start = match &self.paper.start {
            Some(start) => DateTime::parse_from_rfc3339(start).map_err(|e| {
                ConfigError::ValidationError(format!("paper.start '{start}': {e}"))
            })?,
            None => now,
        };

        Ok(PaperVenueConfig {
            exchange: self.trading.routing_exchange.clone(),
            accounts: self.paper.accounts.clone(),
            commission_per_unit: self.paper.commission_per_unit,
            duplicate_notifications: self.paper.duplicate_notifications,
            realtime: self.paper.realtime,
            ..PaperVenueConfig::starting_at(start)
        })
    }
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| ConfigError::ValidationError(format!("{field} '{value}': {e}")))
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to [`DEFAULT_CONFIG_PATH`].
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map(|m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

/// Validate configuration values.
///
/// # Errors
///
/// Returns `ValidationError` naming the first invalid field.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.account.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "account must not be empty (use \"0\" for the first managed account)".to_string(),
        ));
    }

    if config.instructions.path.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "instructions.path must not be empty".to_string(),
        ));
    }

    if config.trading.app_name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "trading.app_name must not be empty".to_string(),
        ));
    }

    let settings = config.session_settings()?;
    if settings.defaults.open >= settings.defaults.close {
        return Err(ConfigError::ValidationError(
            "session.default_open must be before session.default_close".to_string(),
        ));
    }

    let supervisor = &config.supervisor;
    if supervisor.loop_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "supervisor.loop_interval_ms must be positive".to_string(),
        ));
    }

    if supervisor.reconnect_initial_ms > supervisor.reconnect_max_ms {
        return Err(ConfigError::ValidationError(
            "supervisor.reconnect_initial_ms must not exceed reconnect_max_ms".to_string(),
        ));
    }

    if !supervisor.reconnect_multiplier.is_finite() || supervisor.reconnect_multiplier < 1.0 {
        return Err(ConfigError::ValidationError(
            "supervisor.reconnect_multiplier must be at least 1.0".to_string(),
        ));
    }

    if supervisor.entry_fill_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "supervisor.entry_fill_timeout_secs must be positive".to_string(),
        ));
    }

    let logging = &config.logging;
    for (field, level) in [
        ("trading_level", &logging.trading_level),
        ("console_level", &logging.console_level),
        ("library_level", &logging.library_level),
    ] {
        if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.{field} must be one of: {LOG_LEVELS:?}"
            )));
        }
    }

    if config.paper.commission_per_unit.is_sign_negative() {
        return Err(ConfigError::ValidationError(
            "paper.commission_per_unit must not be negative".to_string(),
        ));
    }

    if config.paper.accounts.is_empty() {
        return Err(ConfigError::ValidationError(
            "paper.accounts must list at least one account".to_string(),
        ));
    }

    if let Some(start) = &config.paper.start {
        DateTime::parse_from_rfc3339(start).map_err(|e| {
            ConfigError::ValidationError(format!("paper.start '{start}': {e}"))
        })?;
    }

    Ok(())
}
