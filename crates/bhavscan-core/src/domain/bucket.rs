use std::fmt::{Display, Formatter};

use serde::Serialize;
use time::{Date, Duration, OffsetDateTime};

/// Recency window a canonical snapshot can be routed into.
///
/// For a fixed "now", membership nests: `FiveDays ⊆ OneMonth ⊆ ThreeMonths`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RecencyBucket {
    #[serde(rename = "5 DAYS")]
    FiveDays,
    #[serde(rename = "1 MONTH")]
    OneMonth,
    #[serde(rename = "3 MONTHS")]
    ThreeMonths,
}

impl RecencyBucket {
    /// Processing order for aggregation and ranking.
    pub const ALL: [Self; 3] = [Self::FiveDays, Self::OneMonth, Self::ThreeMonths];

    /// Routing order, widest window first.
    pub const WIDEST_FIRST: [Self; 3] = [Self::ThreeMonths, Self::OneMonth, Self::FiveDays];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FiveDays => "5 DAYS",
            Self::OneMonth => "1 MONTH",
            Self::ThreeMonths => "3 MONTHS",
        }
    }

    pub const fn lookback(self) -> Duration {
        match self {
            Self::FiveDays => Duration::days(5),
            Self::OneMonth => Duration::weeks(4),
            Self::ThreeMonths => Duration::weeks(12),
        }
    }

    pub fn cutoff(self, now: OffsetDateTime) -> OffsetDateTime {
        now - self.lookback()
    }

    /// A file dated `date` (taken at midnight in now's offset) qualifies when
    /// it is not older than the cutoff.
    pub fn includes(self, date: Date, now: OffsetDateTime) -> bool {
        date.midnight().assume_offset(now.offset()) >= self.cutoff(now)
    }
}

impl Display for RecencyBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Month, Time};

    fn at(year: i32, month: Month, day: u8, hour: u8) -> OffsetDateTime {
        Date::from_calendar_date(year, month, day)
            .expect("valid date")
            .with_time(Time::from_hms(hour, 0, 0).expect("valid time"))
            .assume_utc()
    }

    fn date(year: i32, month: Month, day: u8) -> Date {
        Date::from_calendar_date(year, month, day).expect("valid date")
    }

    #[test]
    fn cutoff_compares_against_midnight_of_file_date() {
        let now = at(2024, Month::June, 21, 15);

        // now - 5 days = 2024-06-16 15:00, so the 16th at midnight is too old.
        assert!(!RecencyBucket::FiveDays.includes(date(2024, Month::June, 16), now));
        assert!(RecencyBucket::FiveDays.includes(date(2024, Month::June, 17), now));
    }

    #[test]
    fn cutoff_is_inclusive_at_exact_boundary() {
        let now = at(2024, Month::June, 21, 0);
        assert!(RecencyBucket::FiveDays.includes(date(2024, Month::June, 16), now));
        assert!(RecencyBucket::OneMonth.includes(date(2024, Month::May, 24), now));
        assert!(!RecencyBucket::OneMonth.includes(date(2024, Month::May, 23), now));
        assert!(RecencyBucket::ThreeMonths.includes(date(2024, Month::March, 29), now));
        assert!(!RecencyBucket::ThreeMonths.includes(date(2024, Month::March, 28), now));
    }

    #[test]
    fn labels_match_folder_names() {
        let labels: Vec<_> = RecencyBucket::ALL.iter().map(|b| b.as_str()).collect();
        assert_eq!(labels, ["5 DAYS", "1 MONTH", "3 MONTHS"]);
    }
}
