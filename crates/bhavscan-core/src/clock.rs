use time::{Date, OffsetDateTime, Time};

/// Source of "now" for retention cutoffs.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock in the local offset, or UTC when the offset is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(OffsetDateTime);

impl FixedClock {
    pub const fn new(now: OffsetDateTime) -> Self {
        Self(now)
    }

    /// Midday UTC on `date`.
    pub fn at_noon(date: Date) -> Self {
        Self(date.with_time(Time::MIDNIGHT + time::Duration::hours(12)).assume_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> OffsetDateTime {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn fixed_clock_returns_same_instant() {
        let date = Date::from_calendar_date(2024, Month::June, 21).expect("valid date");
        let clock = FixedClock::at_noon(date);
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().date(), date);
        assert_eq!(clock.now().hour(), 12);
    }
}
