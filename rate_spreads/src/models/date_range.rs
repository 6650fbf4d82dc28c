use chrono::{Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use snafu::{Backtrace, Snafu};

/// Length of the window requested when no start date is given.
pub const DEFAULT_SPAN_YEARS: u32 = 5;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DateRangeError {
    #[snafu(display("start date {start} must be before end date {end}"))]
    Empty {
        start: NaiveDate,
        end: NaiveDate,
        backtrace: Backtrace,
    },

    #[snafu(display("cannot go back {years} years from {end}"))]
    OutOfRange {
        end: NaiveDate,
        years: u32,
        backtrace: Backtrace,
    },
}

/// Half-open interval of calendar days, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day requested (inclusive).
    start: NaiveDate,
    /// Day after the last requested day (exclusive).
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start >= end {
            return EmptySnafu { start, end }.fail();
        }
        Ok(Self { start, end })
    }

    /// `[end - years, end)`, clamping to the last day of the month when the
    /// anniversary does not exist (Feb 29).
    pub fn trailing_years(end: NaiveDate, years: u32) -> Result<Self, DateRangeError> {
        let start = end
            .checked_sub_months(Months::new(years.saturating_mul(12)))
            .ok_or_else(|| OutOfRangeSnafu { end, years }.build())?;
        Self::new(start, end)
    }

    /// Resolves optional bounds: `end` defaults to today (UTC) and `start` to
    /// five years before `end`.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, DateRangeError> {
        let end = end.unwrap_or_else(today);
        match start {
            Some(start) => Self::new(start, end),
            None => Self::trailing_years(end, DEFAULT_SPAN_YEARS),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// Today's calendar date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        assert!(DateRange::new(ymd(2024, 1, 1), ymd(2024, 1, 1)).is_err());
        assert!(DateRange::new(ymd(2024, 1, 2), ymd(2024, 1, 1)).is_err());
    }

    #[test]
    fn half_open_contains() {
        let r = DateRange::new(ymd(2024, 1, 1), ymd(2024, 1, 3)).unwrap();
        assert!(r.contains(ymd(2024, 1, 1)));
        assert!(r.contains(ymd(2024, 1, 2)));
        assert!(!r.contains(ymd(2024, 1, 3)));
    }

    #[test]
    fn trailing_years_clamps_leap_day() {
        let r = DateRange::trailing_years(ymd(2024, 2, 29), 5).unwrap();
        assert_eq!(r.start(), ymd(2019, 2, 28));
        assert_eq!(r.end(), ymd(2024, 2, 29));
    }

    #[test]
    fn resolve_defaults() {
        let end = ymd(2025, 6, 30);
        let r = DateRange::resolve(None, Some(end)).unwrap();
        assert_eq!(r.start(), ymd(2020, 6, 30));

        let r = DateRange::resolve(None, None).unwrap();
        assert_eq!(r.end(), today());
        assert_eq!(r.start(), today().checked_sub_months(Months::new(60)).unwrap());
    }
}
