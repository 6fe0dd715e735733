//! Historical bars and bar size mapping.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::market::MarketDataError;
use crate::domain::shared::VenueTime;

/// One OHLCV bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar start time.
    pub time: VenueTime,
    /// Open price.
    pub open: Decimal,
    /// High price.
    pub high: Decimal,
    /// Low price.
    pub low: Decimal,
    /// Close price.
    pub close: Decimal,
    /// Traded volume.
    pub volume: Decimal,
}

/// Venue bar sizes and the longest duration a single request may cover.
const BAR_SIZES: &[(&str, &str)] = &[
    ("1 secs", "1800 S"),
    ("5 secs", "3600 S"),
    ("10 secs", "14400 S"),
    ("15 secs", "14400 S"),
    ("30 secs", "28800 S"),
    ("1 min", "1 D"),
    ("2 mins", "2 D"),
    ("3 mins", "1 W"),
    ("5 mins", "1 W"),
    ("10 mins", "1 W"),
    ("15 mins", "1 W"),
    ("20 mins", "1 W"),
    ("30 mins", "1 M"),
    ("1 hour", "1 M"),
    ("2 hours", "1 M"),
    ("3 hours", "1 M"),
    ("4 hours", "1 M"),
    ("8 hours", "1 M"),
    ("1 day", "1 Y"),
    ("1 week", "1 Y"),
    ("1 month", "1 Y"),
];

/// A bar size the venue accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BarSize {
    label: &'static str,
    duration: &'static str,
}

impl BarSize {
    /// Daily bars.
    pub const DAILY: Self = Self {
        label: "1 day",
        duration: "1 Y",
    };

    /// Map an intraday bar size in seconds to the venue's bar size.
    ///
    /// Sizes under a minute are expressed in seconds, up to 30 minutes in
    /// whole minutes, and up to 8 hours in whole hours.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedBarSize` when the size is not one the venue serves.
    pub fn from_seconds(seconds: u32) -> Result<Self, MarketDataError> {
        let unsupported = MarketDataError::UnsupportedBarSize { seconds };
        let label = match seconds {
            0 => return Err(unsupported),
            1..=59 => format!("{seconds} secs"),
            60..=1800 if seconds % 60 == 0 => plural(seconds / 60, "min"),
            3600..=28800 if seconds % 3600 == 0 => plural(seconds / 3600, "hour"),
            _ => return Err(unsupported),
        };

        BAR_SIZES
            .iter()
            .find(|(l, _)| *l == label)
            .map(|&(label, duration)| Self { label, duration })
            .ok_or(unsupported)
    }

    /// Venue bar size label, e.g. `"1 min"`.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Longest request duration for this size, e.g. `"1 D"`.
    #[must_use]
    pub const fn duration(&self) -> &'static str {
        self.duration
    }

    /// Length of one bar in seconds. A month counts as 30 days.
    #[must_use]
    pub fn seconds(&self) -> u32 {
        let (count, unit) = self.label.split_once(' ').unwrap_or(("1", "day"));
        let count: u32 = count.parse().unwrap_or(1);
        let unit = match unit.trim_end_matches('s') {
            "sec" => 1,
            "min" => 60,
            "hour" => 3_600,
            "day" => 86_400,
            "week" => 604_800,
            _ => 2_592_000,
        };
        count * unit
    }
}

fn plural(count: u32, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

impl fmt::Display for BarSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// A keep-up-to-date historical bar subscription request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarRequest {
    /// Bar size.
    pub size: BarSize,
    /// Restrict to regular trading hours.
    pub regular_hours_only: bool,
}

impl BarRequest {
    /// Daily regular-hours bars over the last year.
    #[must_use]
    pub const fn daily_regular() -> Self {
        Self {
            size: BarSize::DAILY,
            regular_hours_only: true,
        }
    }

    /// Intraday bars including extended hours.
    #[must_use]
    pub const fn intraday_extended(size: BarSize) -> Self {
        Self {
            size,
            regular_hours_only: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, "1 secs", "1800 S")]
    #[test_case(30, "30 secs", "28800 S")]
    #[test_case(60, "1 min", "1 D")]
    #[test_case(120, "2 mins", "2 D")]
    #[test_case(300, "5 mins", "1 W")]
    #[test_case(1800, "30 mins", "1 M")]
    #[test_case(3600, "1 hour", "1 M")]
    #[test_case(28800, "8 hours", "1 M")]
    fn bar_size_from_seconds(seconds: u32, label: &str, duration: &str) {
        let size = BarSize::from_seconds(seconds).unwrap();
        assert_eq!(size.label(), label);
        assert_eq!(size.duration(), duration);
    }

    #[test_case(0 ; "zero")]
    #[test_case(7 ; "seconds not offered")]
    #[test_case(90 ; "not whole minutes")]
    #[test_case(2400 ; "forty minutes")]
    #[test_case(18000 ; "five hours")]
    #[test_case(86400 ; "a day")]
    fn bar_size_unsupported(seconds: u32) {
        assert_eq!(
            BarSize::from_seconds(seconds),
            Err(MarketDataError::UnsupportedBarSize { seconds })
        );
    }

    #[test_case(5, 5)]
    #[test_case(120, 120)]
    #[test_case(7200, 7200)]
    fn bar_size_seconds(seconds: u32, expected: u32) {
        assert_eq!(BarSize::from_seconds(seconds).unwrap().seconds(), expected);
    }

    #[test]
    fn bar_size_daily_seconds() {
        assert_eq!(BarSize::DAILY.seconds(), 86_400);
    }

    #[test]
    fn bar_requests() {
        let daily = BarRequest::daily_regular();
        assert!(daily.regular_hours_only);
        assert_eq!(daily.size.duration(), "1 Y");

        let intraday = BarRequest::intraday_extended(BarSize::from_seconds(60).unwrap());
        assert!(!intraday.regular_hours_only);
        assert_eq!(intraday.size.to_string(), "1 min");
    }
}
