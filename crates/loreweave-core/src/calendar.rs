//! Configurable fantasy calendar and date derivation.
//!
//! Dates are never stored: they are derived on demand from the absolute
//! world-day number and the calendar configuration. Leap years (every
//! `leap_year_interval` years, 0 to disable) gain one extra day, appended
//! to the last month of the year.

use serde::{Deserialize, Serialize};

use loreweave_types::Season;

use crate::clock::ClockError;

/// Calendar configuration as it appears in `loreweave-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// World-seconds in one day.
    #[serde(default = "default_seconds_per_day")]
    pub seconds_per_day: u64,
    /// Days in every month (the leap day is appended to the last month).
    #[serde(default = "default_days_per_month")]
    pub days_per_month: u64,
    /// Months in a year.
    #[serde(default = "default_months_per_year")]
    pub months_per_year: u64,
    /// Every Nth year gains one extra day; 0 disables leap years.
    #[serde(default = "default_leap_year_interval")]
    pub leap_year_interval: u64,
}

const fn default_seconds_per_day() -> u64 {
    86_400
}
const fn default_days_per_month() -> u64 {
    30
}
const fn default_months_per_year() -> u64 {
    12
}
const fn default_leap_year_interval() -> u64 {
    4
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            seconds_per_day: default_seconds_per_day(),
            days_per_month: default_days_per_month(),
            months_per_year: default_months_per_year(),
            leap_year_interval: default_leap_year_interval(),
        }
    }
}

/// A derived calendar date. All fields are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDate {
    /// Year number.
    pub year: u64,
    /// Month within the year.
    pub month: u64,
    /// Day within the month.
    pub day_of_month: u64,
    /// Absolute world-day this date was derived from.
    pub day: u64,
    /// The season band the month falls in.
    pub season: Season,
}

/// A validated calendar ready for date math.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    seconds_per_day: u64,
    days_per_month: u64,
    months_per_year: u64,
    leap_year_interval: u64,
}

impl Calendar {
    /// Build a calendar from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if any field that must be
    /// at least 1 is zero.
    pub fn new(config: &CalendarConfig) -> Result<Self, ClockError> {
        if config.seconds_per_day == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "seconds_per_day must be at least 1".to_owned(),
            });
        }
        if config.days_per_month == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "days_per_month must be at least 1".to_owned(),
            });
        }
        if config.months_per_year == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "months_per_year must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            seconds_per_day: config.seconds_per_day,
            days_per_month: config.days_per_month,
            months_per_year: config.months_per_year,
            leap_year_interval: config.leap_year_interval,
        })
    }

    /// World-seconds in one day.
    pub const fn seconds_per_day(&self) -> u64 {
        self.seconds_per_day
    }

    /// Days in every (non-leap-extended) month.
    pub const fn days_per_month(&self) -> u64 {
        self.days_per_month
    }

    /// Months in a year.
    pub const fn months_per_year(&self) -> u64 {
        self.months_per_year
    }

    /// Days in a common (non-leap) year.
    pub const fn days_per_common_year(&self) -> u64 {
        self.days_per_month.saturating_mul(self.months_per_year)
    }

    /// Whether `year` is a leap year (gains one day).
    pub const fn is_leap_year(&self, year: u64) -> bool {
        if self.leap_year_interval == 0 {
            return false;
        }
        // Year 0 is not a leap year; the first leap year is the interval.
        year != 0 && year % self.leap_year_interval == 0
    }

    /// Days in the given year.
    pub const fn days_in_year(&self, year: u64) -> u64 {
        let common = self.days_per_common_year();
        if self.is_leap_year(year) {
            common.saturating_add(1)
        } else {
            common
        }
    }

    /// The absolute world-day for a world-seconds timestamp.
    pub const fn day_for_time(&self, sim_time: u64) -> u64 {
        // seconds_per_day >= 1 by construction.
        sim_time / self.seconds_per_day
    }

    /// Derive the full date for an absolute world-day.
    pub fn date_for_day(&self, day: u64) -> CalendarDate {
        let mut year: u64 = 0;
        let mut remaining = day;
        loop {
            let year_len = self.days_in_year(year);
            if remaining < year_len {
                break;
            }
            remaining = remaining.saturating_sub(year_len);
            year = year.saturating_add(1);
        }

        // The leap day (if any) extends the last month of the year.
        let month = (remaining / self.days_per_month).min(self.months_per_year.saturating_sub(1));
        let day_of_month = remaining.saturating_sub(month.saturating_mul(self.days_per_month));

        CalendarDate {
            year,
            month,
            day_of_month,
            day,
            season: self.season_for_month(month),
        }
    }

    /// The season band for a month index: the year is split evenly into
    /// four quarters regardless of how many months it has.
    pub const fn season_for_month(&self, month: u64) -> Season {
        let quarter = month.saturating_mul(4) / self.months_per_year;
        match quarter {
            0 => Season::Spring,
            1 => Season::Summer,
            2 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    /// World-seconds spanned by `days` whole days.
    pub const fn seconds_for_days(&self, days: u64) -> u64 {
        days.saturating_mul(self.seconds_per_day)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn default_calendar() -> Calendar {
        Calendar::new(&CalendarConfig::default()).unwrap()
    }

    #[test]
    fn rejects_zero_fields() {
        let cfg = CalendarConfig {
            days_per_month: 0,
            ..CalendarConfig::default()
        };
        assert!(Calendar::new(&cfg).is_err());

        let cfg = CalendarConfig {
            seconds_per_day: 0,
            ..CalendarConfig::default()
        };
        assert!(Calendar::new(&cfg).is_err());
    }

    #[test]
    fn date_derivation_basics() {
        let cal = default_calendar();
        // Day 0: year 0, month 0, day 0, spring.
        let date = cal.date_for_day(0);
        assert_eq!((date.year, date.month, date.day_of_month), (0, 0, 0));
        assert_eq!(date.season, Season::Spring);

        // Day 30: month 1.
        let date = cal.date_for_day(30);
        assert_eq!((date.year, date.month, date.day_of_month), (0, 1, 0));

        // Day 359: last day of year 0 (360-day common year).
        let date = cal.date_for_day(359);
        assert_eq!((date.year, date.month, date.day_of_month), (0, 11, 29));
        assert_eq!(date.season, Season::Winter);

        // Day 360: year 1 begins (year 1 is not a leap year with interval 4).
        let date = cal.date_for_day(360);
        assert_eq!((date.year, date.month, date.day_of_month), (1, 0, 0));
    }

    #[test]
    fn leap_years_extend_the_last_month() {
        let cal = default_calendar();
        assert!(!cal.is_leap_year(0));
        assert!(!cal.is_leap_year(1));
        assert!(cal.is_leap_year(4));
        assert_eq!(cal.days_in_year(1), 360);
        assert_eq!(cal.days_in_year(4), 361);

        // Years 0..=4 span 360*4 + 361 days; the extra day belongs to
        // year 4's last month as day_of_month 30.
        let start_of_year_4: u64 = 360 * 4;
        let leap_day = start_of_year_4 + 360;
        let date = cal.date_for_day(leap_day);
        assert_eq!((date.year, date.month, date.day_of_month), (4, 11, 30));

        let next = cal.date_for_day(leap_day + 1);
        assert_eq!((next.year, next.month, next.day_of_month), (5, 0, 0));
    }

    #[test]
    fn seasons_split_the_year_evenly() {
        let cal = default_calendar();
        assert_eq!(cal.season_for_month(0), Season::Spring);
        assert_eq!(cal.season_for_month(2), Season::Spring);
        assert_eq!(cal.season_for_month(3), Season::Summer);
        assert_eq!(cal.season_for_month(6), Season::Autumn);
        assert_eq!(cal.season_for_month(9), Season::Winter);
        assert_eq!(cal.season_for_month(11), Season::Winter);
    }

    #[test]
    fn day_for_time_uses_seconds_per_day() {
        let cal = default_calendar();
        assert_eq!(cal.day_for_time(0), 0);
        assert_eq!(cal.day_for_time(86_399), 0);
        assert_eq!(cal.day_for_time(86_400), 1);
    }
}
