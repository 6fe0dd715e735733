//! Shared fixtures for the paper venue integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

use level_trader::application::ports::{InstructionSourcePort, MarketCalendarPort, VenuePort};
use level_trader::application::services::{IterationOutcome, SessionSettings, TradingSession};
use level_trader::domain::market::ContractSpec;
use level_trader::domain::shared::{Symbol, VenueTime};
use level_trader::infrastructure::{
    PaperMarket, PaperVenue, PaperVenueConfig, TradingHoursCalendar, YamlInstructionSource,
};

/// Local symbol of the XYZ 101 call.
pub const CALL: &str = "XYZ   240315C00101000";

/// XYZ stock with a 101 call and a 99 put expiring on the session date.
///
/// The stock trades at 99.5 and crosses 100 at 09:32.
pub const MARKET: &str = r#"
listings:
  - { con_id: 1, symbol: XYZ, rule_id: 26 }
  - { con_id: 2, symbol: XYZ, right: Call, strike: "101", expiration: 2024-03-15, rule_id: 26 }
  - { con_id: 3, symbol: XYZ, right: Put, strike: "99", expiration: 2024-03-15, rule_id: 26 }
  - { con_id: 4, symbol: ABC, rule_id: 26 }
rules:
  - { id: 26, rules: [{ threshold: "0", increment: "0.01" }] }
liquid_hours: "20240315:0930-20240315:1600;20240316:CLOSED"
steps:
  - { after_secs: 0, local_symbol: XYZ, bid: "99.4", ask: "99.6", last: "99.5" }
  - { after_secs: 0, local_symbol: "XYZ   240315C00101000", bid: "4.9", ask: "5", last: "5" }
  - { after_secs: 0, local_symbol: ABC, bid: "49.9", ask: "50.1", last: "50" }
  - { after_secs: 180, local_symbol: XYZ, last: "100.5" }
"#;

/// Options instruction entering the 101 call above 100.
pub const OPTIONS_INSTRUCTIONS: &str = r"
instructions:
  - symbol: XYZ
    currency: USD
    trading: OPTIONS
    amount: 1000
    stop: 10
    target: 20
    call_entry: 100
    call_strike: 101
    call_exp: 20240315
    flat_delay: 15
";

/// Clock start: a minute before the open.
pub fn start() -> VenueTime {
    DateTime::parse_from_rfc3339("2024-03-15T09:29:00-04:00").unwrap()
}

/// Parse a venue-local time on the session date.
pub fn at(hms: &str) -> VenueTime {
    DateTime::parse_from_rfc3339(&format!("2024-03-15T{hms}-04:00")).unwrap()
}

pub fn venue(duplicate_notifications: bool) -> Arc<PaperVenue> {
    let market = PaperMarket::from_yaml_str(MARKET).unwrap();
    let config = PaperVenueConfig {
        duplicate_notifications,
        ..PaperVenueConfig::starting_at(start())
    };
    Arc::new(PaperVenue::with_market(config, &market))
}

pub fn settings() -> SessionSettings {
    SessionSettings {
        reference: ContractSpec::stock(Symbol::new("XYZ"), "USD", "SMART"),
        pump_interval: Duration::from_secs(10),
        derivative_quote_wait: Duration::from_secs(1),
        ..SessionSettings::default()
    }
}

pub fn instruction_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub type PaperSession =
    TradingSession<PaperVenue, TradingHoursCalendar<PaperVenue>, YamlInstructionSource>;

/// A session over `venue` reading `file`, connected and trading the first account.
pub async fn session(venue: &Arc<PaperVenue>, file: &NamedTempFile) -> PaperSession {
    venue.connect().await.unwrap();
    let mut session = TradingSession::new(
        Arc::clone(venue),
        Arc::new(TradingHoursCalendar::new(Arc::clone(venue))),
        Arc::new(YamlInstructionSource::new(file.path())),
        settings(),
    );
    session.set_account("DU0000001");
    session
}

/// Iterate until the venue clock reaches `until` or the session stops continuing.
pub async fn iterate_until<V, C, I>(
    session: &mut TradingSession<V, C, I>,
    venue: &PaperVenue,
    until: VenueTime,
) where
    V: VenuePort + ?Sized,
    C: MarketCalendarPort + ?Sized,
    I: InstructionSourcePort + ?Sized,
{
    let token = CancellationToken::new();
    while venue.clock() < until {
        let outcome = session.iterate(&token).await.unwrap();
        if outcome != IterationOutcome::Continue {
            break;
        }
    }
}
