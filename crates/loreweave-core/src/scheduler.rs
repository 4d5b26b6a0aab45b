//! The trigger scheduler: drives the clock and fires time-based events.
//!
//! Each tick advances the [`WorldClock`], emits a `TimeAdvanced` event,
//! then walks every day boundary crossed since the previous tick in order,
//! publishing `DayPassed` per day plus `MonthPassed`, `YearPassed`, and
//! `SeasonChanged` at the matching boundaries. Scheduled triggers are kept
//! in a min-heap ordered by fire day and popped as their day is reached.
//!
//! Catch-up after a stall is capped: a tick that would cross more than
//! `max_catchup_days_per_tick` boundaries processes the cap, logs, and
//! returns [`SchedulerError::Overrun`]. The runner treats the error as
//! non-fatal; remaining days are processed on subsequent ticks.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};
use std::sync::Arc;

use tracing::{debug, error, info};

use loreweave_events::EventDispatcher;
use loreweave_types::{Event, EventPayload, TriggerId};

use crate::clock::{ClockError, WorldClock};
use crate::config::SchedulerConfig;

/// Errors that can occur while ticking the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The clock rejected the advance.
    #[error(transparent)]
    Clock(#[from] ClockError),

    /// The tick crossed more day boundaries than the configured cap.
    #[error("scheduler overrun: {pending} day boundaries pending, processed {processed} (cap {cap})")]
    Overrun {
        /// Boundaries still unprocessed after the cap was hit.
        pending: u64,
        /// Boundaries processed this tick.
        processed: u64,
        /// The configured cap.
        cap: u64,
    },

    /// A publish to the dispatcher failed.
    #[error("failed to publish scheduler event: {0}")]
    Publish(#[from] loreweave_events::DispatchError),
}

/// How a trigger repeats after firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Recurrence {
    /// Fire once, then retire.
    Once,
    /// Fire every N days.
    EveryDays(u64),
    /// Fire every day.
    Daily,
    /// Fire every 7 days.
    Weekly,
    /// Fire every calendar month (by day count).
    Monthly,
    /// Fire every calendar year (by day count of a common year).
    Yearly,
}

/// A scheduled trigger awaiting its fire day.
#[derive(Debug, Clone)]
pub struct ScheduledTrigger {
    /// Unique trigger id.
    pub id: TriggerId,
    /// Designer-assigned label, carried on the `TriggerFired` payload.
    pub label: String,
    /// Absolute world-day the trigger next fires on.
    pub fire_on_day: u64,
    /// Repeat behavior.
    pub recurrence: Recurrence,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// World-seconds added to the clock.
    pub seconds_added: u64,
    /// Day boundaries processed this tick.
    pub days_processed: u64,
    /// Triggers fired this tick.
    pub triggers_fired: u64,
}

/// Heap entry: min-ordered by (fire day, id) via `Reverse`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct HeapKey(u64, TriggerId);

/// The scheduler owns the clock and the pending trigger heap.
pub struct TriggerScheduler {
    clock: WorldClock,
    dispatcher: Arc<EventDispatcher>,
    heap: BinaryHeap<Reverse<(HeapKey, StoredTrigger)>>,
    cancelled: BTreeSet<TriggerId>,
    last_processed_day: u64,
    max_catchup_days: u64,
}

/// Trigger fields carried inside the heap. Heap order is decided by the
/// key; the derived order here only breaks exact-key ties.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct StoredTrigger {
    label: String,
    recurrence: Recurrence,
}

impl TriggerScheduler {
    /// Build a scheduler around an existing clock.
    pub fn new(
        clock: WorldClock,
        dispatcher: Arc<EventDispatcher>,
        config: &SchedulerConfig,
    ) -> Self {
        let last_processed_day = clock.day();
        Self {
            clock,
            dispatcher,
            heap: BinaryHeap::new(),
            cancelled: BTreeSet::new(),
            last_processed_day,
            max_catchup_days: config.max_catchup_days_per_tick.max(1),
        }
    }

    /// The clock this scheduler drives.
    pub const fn clock(&self) -> &WorldClock {
        &self.clock
    }

    /// Schedule a trigger to fire on an absolute world-day.
    ///
    /// A fire day in the past fires on the next processed boundary.
    pub fn schedule(
        &mut self,
        label: impl Into<String>,
        fire_on_day: u64,
        recurrence: Recurrence,
    ) -> TriggerId {
        let id = TriggerId::new();
        let label = label.into();
        debug!(trigger = %id, %label, fire_on_day, "trigger scheduled");
        self.heap.push(Reverse((
            HeapKey(fire_on_day, id),
            StoredTrigger { label, recurrence },
        )));
        id
    }

    /// Cancel a scheduled trigger. Returns `false` if it was already
    /// fired, cancelled, or never existed.
    pub fn cancel(&mut self, id: TriggerId) -> bool {
        let pending = self
            .heap
            .iter()
            .any(|Reverse((HeapKey(_, entry_id), _))| *entry_id == id);
        if pending {
            self.cancelled.insert(id)
        } else {
            false
        }
    }

    /// Snapshot of pending triggers (cancelled tombstones excluded),
    /// ordered by fire day.
    pub fn pending_triggers(&self) -> Vec<ScheduledTrigger> {
        let mut pending: Vec<ScheduledTrigger> = self
            .heap
            .iter()
            .filter(|Reverse((HeapKey(_, id), _))| !self.cancelled.contains(id))
            .map(|Reverse((HeapKey(fire_on_day, id), trigger))| ScheduledTrigger {
                id: *id,
                label: trigger.label.clone(),
                fire_on_day: *fire_on_day,
                recurrence: trigger.recurrence,
            })
            .collect();
        pending.sort_by_key(|trigger| (trigger.fire_on_day, trigger.id));
        pending
    }

    /// Advance the clock by `delta_seconds` of caller time and process
    /// every boundary crossed, up to the catch-up cap.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Overrun`] when the cap was hit; the
    /// processed boundaries are still committed and the remainder will
    /// be handled by later ticks. Clock and publish failures propagate.
    pub fn tick(&mut self, delta_seconds: f64) -> Result<TickReport, SchedulerError> {
        let seconds_added = self.clock.advance(delta_seconds)?;
        let mut report = TickReport {
            seconds_added,
            ..TickReport::default()
        };

        let event = Event::new(
            self.clock.now(),
            EventPayload::TimeAdvanced {
                sim_time: self.clock.now(),
                delta: seconds_added,
            },
            "scheduler",
        );
        let _ = self.dispatcher.publish_sync(event)?;

        let target_day = self.clock.day();
        let pending = target_day.saturating_sub(self.last_processed_day);
        let to_process = pending.min(self.max_catchup_days);

        for _ in 0..to_process {
            let day = self.last_processed_day.saturating_add(1);
            report.triggers_fired = report
                .triggers_fired
                .saturating_add(self.process_day(day)?);
            self.last_processed_day = day;
            report.days_processed = report.days_processed.saturating_add(1);
        }

        if pending > to_process {
            let remaining = pending.saturating_sub(to_process);
            error!(
                pending = remaining,
                processed = to_process,
                cap = self.max_catchup_days,
                "tick overran the catch-up cap"
            );
            return Err(SchedulerError::Overrun {
                pending: remaining,
                processed: to_process,
                cap: self.max_catchup_days,
            });
        }
        Ok(report)
    }

    /// Publish boundary events for one day and fire any due triggers.
    fn process_day(&mut self, day: u64) -> Result<u64, SchedulerError> {
        let sim_time = self.clock.now();
        let date = self.clock.calendar().date_for_day(day);
        let previous = self.clock.calendar().date_for_day(day.saturating_sub(1));

        let _ = self
            .dispatcher
            .publish_sync(Event::new(sim_time, EventPayload::DayPassed { day }, "scheduler"))?;

        if day > 0 && date.month != previous.month {
            let _ = self.dispatcher.publish_sync(Event::new(
                sim_time,
                EventPayload::MonthPassed {
                    year: date.year,
                    month: date.month,
                },
                "scheduler",
            ))?;
        }
        if day > 0 && date.year != previous.year {
            info!(year = date.year, "a new year begins");
            let _ = self.dispatcher.publish_sync(Event::new(
                sim_time,
                EventPayload::YearPassed { year: date.year },
                "scheduler",
            ))?;
        }
        if day > 0 && date.season != previous.season {
            let _ = self.dispatcher.publish_sync(Event::new(
                sim_time,
                EventPayload::SeasonChanged {
                    old: previous.season,
                    new: date.season,
                },
                "scheduler",
            ))?;
        }

        self.fire_due_triggers(day, sim_time)
    }

    /// Pop and fire every trigger due on or before `day`.
    fn fire_due_triggers(&mut self, day: u64, sim_time: u64) -> Result<u64, SchedulerError> {
        let mut fired: u64 = 0;
        while let Some(Reverse((HeapKey(fire_on_day, _), _))) = self.heap.peek() {
            if *fire_on_day > day {
                break;
            }
            let Some(Reverse((HeapKey(_, id), trigger))) = self.heap.pop() else {
                break;
            };
            if self.cancelled.remove(&id) {
                continue;
            }
            debug!(trigger = %id, label = %trigger.label, day, "trigger fired");
            let _ = self.dispatcher.publish_sync(Event::new(
                sim_time,
                EventPayload::TriggerFired {
                    label: trigger.label.clone(),
                },
                "scheduler",
            ))?;
            fired = fired.saturating_add(1);

            if let Some(interval) = self.recurrence_interval(trigger.recurrence) {
                let next = day.saturating_add(interval.max(1));
                self.heap.push(Reverse((HeapKey(next, id), trigger)));
            }
        }
        Ok(fired)
    }

    /// Interval in days implied by a recurrence, `None` for one-shot.
    fn recurrence_interval(&self, recurrence: Recurrence) -> Option<u64> {
        let calendar = self.clock.calendar();
        match recurrence {
            Recurrence::Once => None,
            Recurrence::EveryDays(n) => Some(n.max(1)),
            Recurrence::Daily => Some(1),
            Recurrence::Weekly => Some(7),
            Recurrence::Monthly => Some(calendar.days_per_month()),
            Recurrence::Yearly => Some(calendar.days_per_common_year()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    use loreweave_types::EventType;

    use crate::calendar::CalendarConfig;
    use crate::config::SchedulerConfig;

    fn make_scheduler(cap: u64) -> (TriggerScheduler, Arc<EventDispatcher>) {
        let dispatcher = Arc::new(EventDispatcher::new());
        let clock = WorldClock::new(&CalendarConfig::default(), 1.0).unwrap();
        let config = SchedulerConfig {
            max_catchup_days_per_tick: cap,
        };
        (
            TriggerScheduler::new(clock, Arc::clone(&dispatcher), &config),
            dispatcher,
        )
    }

    fn count_events(dispatcher: &EventDispatcher, event_type: EventType) -> Arc<AtomicU64> {
        let counter = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&counter);
        dispatcher
            .subscribe(
                event_type,
                0,
                Arc::new(move |_event| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .unwrap();
        counter
    }

    #[test]
    fn one_day_passed_per_boundary() {
        let (mut scheduler, dispatcher) = make_scheduler(1_000);
        let days = count_events(&dispatcher, EventType::DayPassed);

        // Three days in one tick.
        let report = scheduler.tick(86_400.0 * 3.0).unwrap();
        assert_eq!(report.days_processed, 3);
        assert_eq!(days.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn month_and_year_boundaries_fire() {
        let (mut scheduler, dispatcher) = make_scheduler(1_000);
        let months = count_events(&dispatcher, EventType::MonthPassed);
        let years = count_events(&dispatcher, EventType::YearPassed);
        let seasons = count_events(&dispatcher, EventType::SeasonChanged);

        // One common year: 360 days, 12 months. Entering a new year
        // coincides with entering its first month.
        let _ = scheduler.tick(86_400.0 * 360.0).unwrap();
        assert_eq!(months.load(Ordering::SeqCst), 12);
        assert_eq!(years.load(Ordering::SeqCst), 1);
        // Seasons change on the quarter boundaries plus the year wrap.
        assert_eq!(seasons.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn overrun_caps_and_resumes() {
        let (mut scheduler, dispatcher) = make_scheduler(5);
        let days = count_events(&dispatcher, EventType::DayPassed);

        let result = scheduler.tick(86_400.0 * 12.0);
        let Err(SchedulerError::Overrun { pending, processed, cap }) = result else {
            panic!("expected overrun");
        };
        assert_eq!((pending, processed, cap), (7, 5, 5));
        assert_eq!(days.load(Ordering::SeqCst), 5);

        // Later ticks drain the backlog without re-advancing much.
        let _ = scheduler.tick(0.0).map_err(|_e| ());
        let _ = scheduler.tick(0.0).map_err(|_e| ());
        assert_eq!(days.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn one_shot_trigger_fires_once() {
        let (mut scheduler, dispatcher) = make_scheduler(1_000);
        let fired = count_events(&dispatcher, EventType::TriggerFired);

        let _ = scheduler.schedule("festival", 2, Recurrence::Once);
        let report = scheduler.tick(86_400.0 * 4.0).unwrap();
        assert_eq!(report.triggers_fired, 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(scheduler.pending_triggers().is_empty());
    }

    #[test]
    fn recurring_trigger_requeues() {
        let (mut scheduler, dispatcher) = make_scheduler(1_000);
        let fired = count_events(&dispatcher, EventType::TriggerFired);

        let _ = scheduler.schedule("market-day", 1, Recurrence::EveryDays(2));
        let _ = scheduler.tick(86_400.0 * 6.0).unwrap();
        // Fires on days 1, 3, 5.
        assert_eq!(fired.load(Ordering::SeqCst), 3);
        let pending = scheduler.pending_triggers();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.first().map(|t| t.fire_on_day), Some(7));
    }

    #[test]
    fn cancelled_trigger_does_not_fire() {
        let (mut scheduler, dispatcher) = make_scheduler(1_000);
        let fired = count_events(&dispatcher, EventType::TriggerFired);

        let id = scheduler.schedule("eclipse", 1, Recurrence::Once);
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        let _ = scheduler.tick(86_400.0 * 2.0).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn past_fire_day_fires_on_next_boundary() {
        let (mut scheduler, dispatcher) = make_scheduler(1_000);
        let _ = scheduler.tick(86_400.0 * 5.0).unwrap();

        let fired = count_events(&dispatcher, EventType::TriggerFired);
        let _ = scheduler.schedule("late", 2, Recurrence::Once);
        let _ = scheduler.tick(86_400.0).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
