//! The world clock: current time, time scale, and calendar views.
//!
//! Simulation time is a `u64` of world-seconds. `advance` scales the
//! caller's delta by the configured time scale and carries the fractional
//! remainder so that repeated small ticks lose nothing. Calendar views
//! (day, date, season) are always derived from the counter -- never
//! stored independently; the counter is the source of truth.

use crate::calendar::{Calendar, CalendarConfig, CalendarDate};

use loreweave_types::Season;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The time counter would overflow.
    #[error("time counter overflow: cannot advance beyond u64::MAX")]
    TimeOverflow,

    /// Invalid clock or calendar configuration.
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// World clock tracking the simulation's temporal state.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldClock {
    /// Current simulation time in world-seconds.
    current_time: u64,
    /// Multiplier applied to every advance delta.
    time_scale: f64,
    /// Sub-second remainder carried between advances.
    fraction: f64,
    /// The calendar used for all derived views.
    calendar: Calendar,
}

impl WorldClock {
    /// Create a clock at time 0 with the given scale and calendar.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the calendar is invalid
    /// or `time_scale` is not finite and positive.
    pub fn new(calendar_config: &CalendarConfig, time_scale: f64) -> Result<Self, ClockError> {
        if !time_scale.is_finite() || time_scale <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("time_scale must be finite and positive, got {time_scale}"),
            });
        }
        Ok(Self {
            current_time: 0,
            time_scale,
            fraction: 0.0,
            calendar: Calendar::new(calendar_config)?,
        })
    }

    /// Advance by `delta_seconds` of caller time, scaled by the time
    /// scale. Returns the number of whole world-seconds added.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TimeOverflow`] if the counter would exceed
    /// `u64::MAX`, and [`ClockError::InvalidConfig`] for a negative or
    /// non-finite delta.
    pub fn advance(&mut self, delta_seconds: f64) -> Result<u64, ClockError> {
        if !delta_seconds.is_finite() || delta_seconds < 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("advance delta must be finite and non-negative, got {delta_seconds}"),
            });
        }
        let scaled = delta_seconds.mul_add(self.time_scale, self.fraction);
        let whole = scaled.floor();
        self.fraction = scaled - whole;

        let added = f64_to_u64(whole).ok_or(ClockError::TimeOverflow)?;
        self.current_time = self
            .current_time
            .checked_add(added)
            .ok_or(ClockError::TimeOverflow)?;
        Ok(added)
    }

    /// Current simulation time in world-seconds.
    pub const fn now(&self) -> u64 {
        self.current_time
    }

    /// The current time scale.
    pub const fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Change the time scale at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the scale is not finite
    /// and positive.
    pub fn set_time_scale(&mut self, time_scale: f64) -> Result<(), ClockError> {
        if !time_scale.is_finite() || time_scale <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("time_scale must be finite and positive, got {time_scale}"),
            });
        }
        self.time_scale = time_scale;
        Ok(())
    }

    /// The current absolute world-day.
    pub const fn day(&self) -> u64 {
        self.calendar.day_for_time(self.current_time)
    }

    /// The full derived calendar date.
    pub fn date(&self) -> CalendarDate {
        self.calendar.date_for_day(self.day())
    }

    /// The current season.
    pub fn season(&self) -> Season {
        self.date().season
    }

    /// The calendar this clock derives views from.
    pub const fn calendar(&self) -> &Calendar {
        &self.calendar
    }
}

/// Convert a non-negative whole `f64` to `u64`, `None` if out of range.
///
/// The cast is guarded: the value is checked to be finite, non-negative,
/// and below `u64::MAX` before casting.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn f64_to_u64(value: f64) -> Option<u64> {
    if value.is_finite() && value >= 0.0 && value < u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}
