//! Market Window
//!
//! Open and close instants for the current trading day.

use chrono::{Duration, NaiveTime, TimeZone};

use crate::domain::market::TradingDay;
use crate::domain::shared::VenueTime;

/// Delay before the simulated open in test mode.
const TEST_OPEN_DELAY_SECS: i64 = 10;

/// Length of the simulated session in test mode.
const TEST_SESSION_SECS: i64 = 600;

/// Fallback window used when the calendar has no boundaries for the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionDefaults {
    /// Regular open, venue local.
    pub open: NaiveTime,
    /// Regular close, venue local.
    pub close: NaiveTime,
    /// Open shortly after now for a short session, regardless of the calendar.
    pub test_right_now: bool,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN),
            test_right_now: false,
        }
    }
}

/// Session boundaries for today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketWindow {
    /// Session open.
    pub open: VenueTime,
    /// Session close.
    pub close: VenueTime,
}

impl MarketWindow {
    /// Resolve today's window from the calendar, falling back to the defaults.
    #[must_use]
    pub fn resolve(day: &TradingDay, now: VenueTime, defaults: &SessionDefaults) -> Self {
        if defaults.test_right_now {
            let open = now + Duration::seconds(TEST_OPEN_DELAY_SECS);
            return Self {
                open,
                close: open + Duration::seconds(TEST_SESSION_SECS),
            };
        }

        Self {
            open: day.open.unwrap_or_else(|| at_local(now, defaults.open)),
            close: day.close.unwrap_or_else(|| at_local(now, defaults.close)),
        }
    }

    /// Returns true if `now` lies inside `[open, close)`.
    #[must_use]
    pub fn contains(&self, now: VenueTime) -> bool {
        self.open <= now && now < self.close
    }
}

/// `time` on `now`'s date in `now`'s offset.
fn at_local(now: VenueTime, time: NaiveTime) -> VenueTime {
    // Fixed offsets map every local time to exactly one instant.
    now.offset()
        .from_local_datetime(&now.date_naive().and_time(time))
        .single()
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn time(s: &str) -> VenueTime {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn market_window_from_calendar() {
        let day = TradingDay {
            is_open: true,
            open: Some(time("2024-03-15T09:30:00-04:00")),
            close: Some(time("2024-03-15T13:00:00-04:00")),
        };
        let window = MarketWindow::resolve(
            &day,
            time("2024-03-15T08:00:00-04:00"),
            &SessionDefaults::default(),
        );
        assert_eq!(window.close, time("2024-03-15T13:00:00-04:00"));
    }

    #[test]
    fn market_window_defaults() {
        let day = TradingDay {
            is_open: true,
            open: None,
            close: None,
        };
        let window = MarketWindow::resolve(
            &day,
            time("2024-03-15T08:00:00-04:00"),
            &SessionDefaults::default(),
        );
        assert_eq!(window.open, time("2024-03-15T09:30:00-04:00"));
        assert_eq!(window.close, time("2024-03-15T16:00:00-04:00"));
        assert!(window.contains(time("2024-03-15T09:30:00-04:00")));
        assert!(!window.contains(time("2024-03-15T16:00:00-04:00")));
    }

    #[test]
    fn market_window_test_mode() {
        let defaults = SessionDefaults {
            test_right_now: true,
            ..SessionDefaults::default()
        };
        let window = MarketWindow::resolve(
            &TradingDay::closed(),
            time("2024-03-16T20:00:00-04:00"),
            &defaults,
        );
        assert_eq!(window.open, time("2024-03-16T20:00:10-04:00"));
        assert_eq!(window.close, time("2024-03-16T20:10:10-04:00"));
    }
}
