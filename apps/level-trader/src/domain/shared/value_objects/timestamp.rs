//! Venue-local timestamps.
//!
//! Every decision in the trading loop is made against the venue clock, so
//! timestamps carry the venue's UTC offset rather than being normalized to UTC.

use chrono::{DateTime, FixedOffset};

/// A timestamp in the venue's local time zone.
pub type VenueTime = DateTime<FixedOffset>;

/// Compact `YYYYmmdd_HHMMSS` form used in order references and file names.
#[must_use]
pub fn compact_stamp(at: &VenueTime) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// `YYYYmmdd HH:MM:SS` form used in transition log lines.
#[must_use]
pub fn log_stamp(at: &VenueTime) -> String {
    at.format("%Y%m%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VenueTime {
        DateTime::parse_from_rfc3339("2024-03-15T09:31:07-04:00").unwrap()
    }

    #[test]
    fn compact_stamp_format() {
        assert_eq!(compact_stamp(&sample()), "20240315_093107");
    }

    #[test]
    fn log_stamp_keeps_local_wall_clock() {
        assert_eq!(log_stamp(&sample()), "20240315 09:31:07");
    }
}
