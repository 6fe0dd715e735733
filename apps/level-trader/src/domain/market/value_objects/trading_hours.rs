//! Venue trading-hours strings.
//!
//! The venue describes a contract's sessions as `;`-separated day fields:
//!
//! - `20240315:0930-1600` (same-day interval, `,` separates several)
//! - `20240315:0930-20240315:1600` (explicit start and end dates)
//! - `20240316:CLOSED`

use chrono::{Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};

use crate::domain::market::MarketDataError;
use crate::domain::shared::VenueTime;

/// Raw trading hours of a contract in the venue's time zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingHours {
    /// Liquid (regular) hours string.
    pub liquid_hours: String,
    /// UTC offset of the venue's time zone.
    pub offset: FixedOffset,
}

/// Session boundaries for one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingDay {
    /// Whether any session starts or ends on the date.
    pub is_open: bool,
    /// Start of the first session starting on the date.
    pub open: Option<VenueTime>,
    /// End of the last session ending on the date.
    pub close: Option<VenueTime>,
}

impl TradingDay {
    /// A day without sessions.
    #[must_use]
    pub const fn closed() -> Self {
        Self {
            is_open: false,
            open: None,
            close: None,
        }
    }
}

impl TradingHours {
    /// Parse every session interval, in the order the venue listed them.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTradingHours` for a field that matches neither format.
    pub fn intervals(&self) -> Result<Vec<(VenueTime, VenueTime)>, MarketDataError> {
        let mut intervals = Vec::new();

        for field in self.liquid_hours.split(';').map(str::trim) {
            if field.is_empty() || field.contains("CLOSED") {
                continue;
            }
            let invalid = || MarketDataError::InvalidTradingHours {
                field: field.to_string(),
            };

            let pieces: Vec<&str> = field.split(':').collect();
            if pieces.len() == 2 {
                let day = pieces[0];
                for interval in pieces[1].split(',') {
                    let (start, end) = interval.split_once('-').ok_or_else(invalid)?;
                    let start = self.parse(&format!("{day}{start}"), "%Y%m%d%H%M", field)?;
                    let end = self.parse(&format!("{day}{end}"), "%Y%m%d%H%M", field)?;
                    intervals.push(ordered(start, end));
                }
            } else {
                for interval in field.split(',') {
                    let (start, end) = interval.split_once('-').ok_or_else(invalid)?;
                    let start = self.parse(start, "%Y%m%d:%H%M", field)?;
                    let end = self.parse(end, "%Y%m%d:%H%M", field)?;
                    intervals.push(ordered(start, end));
                }
            }
        }

        Ok(intervals)
    }

    /// Session boundaries for `date`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTradingHours` if the hours string is malformed.
    pub fn trading_day(&self, date: NaiveDate) -> Result<TradingDay, MarketDataError> {
        let intervals = self.intervals()?;

        let is_open = intervals
            .iter()
            .any(|(start, end)| start.date_naive() == date || end.date_naive() == date);
        let open = intervals
            .iter()
            .find(|(start, _)| start.date_naive() == date)
            .map(|(start, _)| *start);
        let close = intervals
            .iter()
            .rev()
            .find(|(_, end)| end.date_naive() == date)
            .map(|(_, end)| *end);

        Ok(TradingDay {
            is_open,
            open,
            close,
        })
    }

    fn parse(&self, text: &str, format: &str, field: &str) -> Result<VenueTime, MarketDataError> {
        NaiveDateTime::parse_from_str(text.trim(), format)
            .ok()
            .and_then(|naive| self.offset.from_local_datetime(&naive).single())
            .ok_or_else(|| MarketDataError::InvalidTradingHours {
                field: field.to_string(),
            })
    }
}

/// Overnight sessions list the end time only; their start belongs to the previous day.
fn ordered(start: VenueTime, end: VenueTime) -> (VenueTime, VenueTime) {
    if start > end {
        (start - Duration::days(1), end)
    } else {
        (start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn eastern() -> FixedOffset {
        FixedOffset::west_opt(4 * 3600).unwrap()
    }

    fn hours(text: &str) -> TradingHours {
        TradingHours {
            liquid_hours: text.to_string(),
            offset: eastern(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn explicit_dates_format() {
        let h = hours("20240315:0930-20240315:1600;20240316:CLOSED;20240317:CLOSED");
        let day = h.trading_day(date(2024, 3, 15)).unwrap();

        assert!(day.is_open);
        let open = day.open.unwrap();
        let close = day.close.unwrap();
        assert_eq!((open.hour(), open.minute()), (9, 30));
        assert_eq!((close.hour(), close.minute()), (16, 0));
        assert_eq!(open.offset(), &eastern());
    }

    #[test]
    fn closed_day() {
        let h = hours("20240315:0930-20240315:1600;20240316:CLOSED");
        assert_eq!(h.trading_day(date(2024, 3, 16)).unwrap(), TradingDay::closed());
    }

    #[test]
    fn same_day_format_with_several_intervals() {
        let h = hours("20240315:0400-0930,0930-1600,1600-2000");
        let day = h.trading_day(date(2024, 3, 15)).unwrap();

        assert_eq!(day.open.unwrap().hour(), 4);
        assert_eq!(day.close.unwrap().hour(), 20);
        assert_eq!(h.intervals().unwrap().len(), 3);
    }

    #[test]
    fn overnight_interval_starts_previous_day() {
        let h = hours("20240315:1700-1600");
        let intervals = h.intervals().unwrap();
        let (start, end) = intervals[0];

        assert_eq!(start.date_naive(), date(2024, 3, 14));
        assert_eq!(end.date_naive(), date(2024, 3, 15));
        assert!(h.trading_day(date(2024, 3, 14)).unwrap().is_open);
    }

    #[test]
    fn malformed_field() {
        let h = hours("20240315:0930");
        assert!(matches!(
            h.intervals(),
            Err(MarketDataError::InvalidTradingHours { .. })
        ));

        let h = hours("20240315:9x30-1600");
        assert!(h.trading_day(date(2024, 3, 15)).is_err());
    }

    #[test]
    fn empty_hours_is_closed() {
        assert_eq!(hours("").trading_day(date(2024, 3, 15)).unwrap(), TradingDay::closed());
    }
}
