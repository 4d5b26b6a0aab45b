//! World clock, calendar, and trigger scheduling for the Loreweave substrate.
//!
//! The scheduler drives everything periodic in the simulation: it advances
//! the clock, publishes day/month/year/season boundary events that the
//! engines subscribe to (instead of polling), and fires one-time and
//! recurring scheduled triggers from a priority queue.
//!
//! # Modules
//!
//! - [`calendar`] -- Configurable calendar (days per month, months per
//!   year, leap-year interval) and date derivation from world-seconds.
//! - [`clock`] -- The world clock: current time, time scale, fractional
//!   carry, and calendar-derived views.
//! - [`scheduler`] -- Priority queue of scheduled triggers with recurrence,
//!   lazy cancellation, a capped catch-up loop, and boundary-event
//!   publication.
//! - [`config`] -- Typed YAML configuration sections and the file loader.

pub mod calendar;
pub mod clock;
pub mod config;
pub mod scheduler;

pub use calendar::{Calendar, CalendarConfig, CalendarDate};
pub use clock::{ClockError, WorldClock};
pub use config::{ConfigError, LoggingConfig, SchedulerConfig, WorldConfig, load_yaml_file, parse_yaml};
pub use scheduler::{
    Recurrence, ScheduledTrigger, SchedulerError, TickReport, TriggerScheduler,
};
