//! The [`EventDispatcher`]: subscriptions, middleware, and delivery.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use loreweave_types::{Event, EventType, SubscriptionId};

use crate::error::{DispatchError, HandlerError};

/// A subscriber callback. Receives a shared reference to the immutable
/// event; failures are isolated into the [`DispatchReport`].
pub type EventHandler = Arc<dyn Fn(&Event) -> Result<(), HandlerError> + Send + Sync>;

/// A middleware callback. Returns the (possibly transformed) event, or
/// `None` to veto it before any subscriber runs.
pub type Middleware = Arc<dyn Fn(Event) -> Option<Event> + Send + Sync>;

/// How many recently dispatched events the diagnostics ring retains.
const HISTORY_CAPACITY: usize = 256;

/// One registered subscription.
struct SubscriptionEntry {
    id: SubscriptionId,
    priority: i32,
    /// Monotonic registration sequence, the tie-break after priority.
    seq: u64,
    handler: EventHandler,
}

/// Mutable registration state behind one lock.
#[derive(Default)]
struct Registry {
    subscriptions: BTreeMap<EventType, Vec<SubscriptionEntry>>,
    middleware: Vec<Middleware>,
    next_seq: u64,
}

/// One handler failure recorded during a dispatch.
#[derive(Debug, Clone)]
pub struct HandlerFailure {
    /// The failing subscription.
    pub subscription_id: SubscriptionId,
    /// The error the handler returned.
    pub error: HandlerError,
}

/// The outcome of one synchronous dispatch.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// Whether middleware vetoed the event before delivery.
    pub vetoed: bool,
    /// How many handlers ran (including failing ones).
    pub handlers_run: u32,
    /// Failures recorded during delivery; never aborts remaining handlers.
    pub failures: Vec<HandlerFailure>,
}

/// The in-process publish/subscribe bus.
///
/// One instance per process, constructed at startup and shared by `Arc`.
/// All methods take `&self`; interior state is behind locks that are held
/// only while snapshotting, never while running user code.
pub struct EventDispatcher {
    registry: RwLock<Registry>,
    history: Mutex<VecDeque<Event>>,
    stats: Mutex<BTreeMap<EventType, u64>>,

    async_tx: mpsc::UnboundedSender<Event>,
    /// Receiver parked here until [`spawn_async_worker`] claims it.
    ///
    /// [`spawn_async_worker`]: EventDispatcher::spawn_async_worker
    async_rx: Mutex<Option<mpsc::UnboundedReceiver<Event>>>,
    shutdown: AtomicBool,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher {
    /// Create a dispatcher with no subscriptions and an idle async queue.
    pub fn new() -> Self {
        let (async_tx, async_rx) = mpsc::unbounded_channel();
        Self {
            registry: RwLock::new(Registry::default()),
            history: Mutex::new(VecDeque::with_capacity(HISTORY_CAPACITY)),
            stats: Mutex::new(BTreeMap::new()),
            async_tx,
            async_rx: Mutex::new(Some(async_rx)),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Register a handler for one event type.
    ///
    /// Handlers for the same type run in descending `priority`; equal
    /// priorities run in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::LockPoisoned`] if the registry lock is
    /// poisoned.
    pub fn subscribe(
        &self,
        event_type: EventType,
        priority: i32,
        handler: EventHandler,
    ) -> Result<SubscriptionId, DispatchError> {
        let mut registry = self.registry.write().map_err(|_e| DispatchError::LockPoisoned)?;
        let id = SubscriptionId::new();
        let seq = registry.next_seq;
        registry.next_seq = registry.next_seq.wrapping_add(1);
        registry
            .subscriptions
            .entry(event_type)
            .or_default()
            .push(SubscriptionEntry {
                id,
                priority,
                seq,
                handler,
            });
        debug!(?event_type, %id, priority, "Subscription registered");
        Ok(id)
    }

    /// Remove a subscription. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::LockPoisoned`] if the registry lock is
    /// poisoned.
    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<bool, DispatchError> {
        let mut registry = self.registry.write().map_err(|_e| DispatchError::LockPoisoned)?;
        for entries in registry.subscriptions.values_mut() {
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            if entries.len() < before {
                debug!(%id, "Subscription removed");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Register a middleware callback.
    ///
    /// Middleware runs before any subscriber, in registration order, and
    /// may transform the event or veto it by returning `None`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::LockPoisoned`] if the registry lock is
    /// poisoned.
    pub fn register_middleware(&self, middleware: Middleware) -> Result<(), DispatchError> {
        let mut registry = self.registry.write().map_err(|_e| DispatchError::LockPoisoned)?;
        registry.middleware.push(middleware);
        Ok(())
    }

    /// Publish an event and run every matching handler before returning.
    ///
    /// Handler errors are recorded in the report and logged; they never
    /// abort delivery to the remaining handlers.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::LockPoisoned`] if an internal lock is
    /// poisoned. Handler failures are *not* errors at this boundary.
    pub fn publish_sync(&self, event: Event) -> Result<DispatchReport, DispatchError> {
        self.deliver(event)
    }

    /// Enqueue an event for asynchronous delivery and return immediately.
    ///
    /// Gives no ordering guarantee relative to other event types. The
    /// worker task (see [`spawn_async_worker`]) drains the queue and runs
    /// the same middleware/handler path as the synchronous variant.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::QueueClosed`] after shutdown.
    ///
    /// [`spawn_async_worker`]: EventDispatcher::spawn_async_worker
    pub fn publish_async(&self, event: Event) -> Result<(), DispatchError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(DispatchError::QueueClosed);
        }
        self.async_tx
            .send(event)
            .map_err(|_e| DispatchError::QueueClosed)
    }

    /// Spawn the worker task that drains the async queue.
    ///
    /// Call once after entering the tokio runtime. The worker checks the
    /// shutdown flag between events (cooperative cancellation) and exits
    /// when [`shutdown`] is called or the queue closes. Calling this a
    /// second time returns `None` because the receiver is already claimed.
    ///
    /// [`shutdown`]: EventDispatcher::shutdown
    pub fn spawn_async_worker(self: &Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        let mut rx = {
            let mut slot = self.async_rx.lock().ok()?;
            slot.take()?
        };
        let dispatcher = Arc::clone(self);
        Some(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if dispatcher.shutdown.load(Ordering::Acquire) {
                    debug!("Async dispatch worker stopping (shutdown requested)");
                    break;
                }
                match dispatcher.deliver(event) {
                    Ok(report) if !report.failures.is_empty() => {
                        warn!(
                            failures = report.failures.len(),
                            "Async dispatch completed with handler failures"
                        );
                    }
                    Ok(_) => {}
                    Err(err) => warn!(%err, "Async dispatch failed"),
                }
            }
            debug!("Async dispatch worker exited");
        }))
    }

    /// Request cooperative shutdown of the async worker.
    ///
    /// In-flight events already dequeued still complete; queued events
    /// after the flag is observed are dropped.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// The most recently dispatched events, newest last, up to `limit`.
    pub fn recent_events(&self, limit: usize) -> Vec<Event> {
        self.history.lock().map_or_else(
            |_e| Vec::new(),
            |history| {
                let skip = history.len().saturating_sub(limit);
                history.iter().skip(skip).cloned().collect()
            },
        )
    }

    /// Per-type count of events that reached delivery (post-middleware).
    pub fn dispatch_stats(&self) -> BTreeMap<EventType, u64> {
        self.stats
            .lock()
            .map_or_else(|_e| BTreeMap::new(), |stats| stats.clone())
    }

    /// Run the middleware chain and deliver to a snapshot of handlers.
    fn deliver(&self, event: Event) -> Result<DispatchReport, DispatchError> {
        // Snapshot middleware and handlers first, then release the lock
        // so handlers may publish or (un)subscribe re-entrantly.
        let (middleware, mut handlers) = {
            let registry = self.registry.read().map_err(|_e| DispatchError::LockPoisoned)?;
            let middleware: Vec<Middleware> = registry.middleware.clone();
            let handlers: Vec<(SubscriptionId, i32, u64, EventHandler)> = registry
                .subscriptions
                .get(&event.event_type)
                .map(|entries| {
                    entries
                        .iter()
                        .map(|entry| {
                            (entry.id, entry.priority, entry.seq, Arc::clone(&entry.handler))
                        })
                        .collect()
                })
                .unwrap_or_default();
            (middleware, handlers)
        };

        // Middleware: registration order, transform or veto.
        let mut event = event;
        for mw in &middleware {
            match mw(event) {
                Some(transformed) => event = transformed,
                None => {
                    debug!("Event vetoed by middleware");
                    return Ok(DispatchReport {
                        vetoed: true,
                        ..DispatchReport::default()
                    });
                }
            }
        }

        // Descending priority, then registration order. The sort is
        // stable, so equal priorities keep their seq order.
        handlers.sort_by_key(|entry| (core::cmp::Reverse(entry.1), entry.2));

        self.record(&event);

        let mut report = DispatchReport::default();
        for (subscription_id, _, _, handler) in &handlers {
            report.handlers_run = report.handlers_run.saturating_add(1);
            if let Err(error) = handler(&event) {
                warn!(
                    event_type = ?event.event_type,
                    subscription = %subscription_id,
                    %error,
                    "Handler failed; continuing delivery"
                );
                report.failures.push(HandlerFailure {
                    subscription_id: *subscription_id,
                    error,
                });
            }
        }
        Ok(report)
    }

    /// Append to the history ring and bump the per-type counter.
    fn record(&self, event: &Event) {
        if let Ok(mut history) = self.history.lock() {
            if history.len() == HISTORY_CAPACITY {
                history.pop_front();
            }
            history.push_back(event.clone());
        }
        if let Ok(mut stats) = self.stats.lock() {
            let counter = stats.entry(event.event_type).or_insert(0);
            *counter = counter.saturating_add(1);
        }
    }
}

impl core::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventDispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use loreweave_types::EventPayload;

    use super::*;

    fn custom_event() -> Event {
        Event::new(0, EventPayload::Custom(serde_json::json!({"k": 1})), "test")
    }

    #[test]
    fn handlers_run_in_priority_then_registration_order() {
        let dispatcher = EventDispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for (label, priority) in [("low", 1), ("high-a", 10), ("high-b", 10), ("mid", 5)] {
            let order = Arc::clone(&order);
            dispatcher
                .subscribe(
                    EventType::Custom,
                    priority,
                    Arc::new(move |_event| {
                        order.lock().unwrap().push(label);
                        Ok(())
                    }),
                )
                .unwrap();
        }

        let report = dispatcher.publish_sync(custom_event()).unwrap();
        assert_eq!(report.handlers_run, 4);
        assert_eq!(
            *order.lock().unwrap(),
            vec!["high-a", "high-b", "mid", "low"]
        );
    }

    #[test]
    fn handler_error_is_isolated() {
        let dispatcher = EventDispatcher::new();
        let reached = Arc::new(AtomicUsize::new(0));

        dispatcher
            .subscribe(
                EventType::Custom,
                10,
                Arc::new(|_event| Err(HandlerError::new("boom"))),
            )
            .unwrap();
        {
            let reached = Arc::clone(&reached);
            dispatcher
                .subscribe(
                    EventType::Custom,
                    0,
                    Arc::new(move |_event| {
                        reached.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }),
                )
                .unwrap();
        }

        let report = dispatcher.publish_sync(custom_event()).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.handlers_run, 2);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn middleware_transforms_then_vetoes() {
        let dispatcher = EventDispatcher::new();
        let seen_priority = Arc::new(Mutex::new(None));

        // First middleware bumps the envelope priority.
        dispatcher
            .register_middleware(Arc::new(|event| Some(event.with_priority(99))))
            .unwrap();

        {
            let seen = Arc::clone(&seen_priority);
            dispatcher
                .subscribe(
                    EventType::Custom,
                    0,
                    Arc::new(move |event| {
                        *seen.lock().unwrap() = Some(event.priority);
                        Ok(())
                    }),
                )
                .unwrap();
        }

        let report = dispatcher.publish_sync(custom_event()).unwrap();
        assert!(!report.vetoed);
        assert_eq!(*seen_priority.lock().unwrap(), Some(99));

        // Second middleware vetoes everything; the handler must not run.
        dispatcher
            .register_middleware(Arc::new(|_event| None))
            .unwrap();
        *seen_priority.lock().unwrap() = None;

        let report = dispatcher.publish_sync(custom_event()).unwrap();
        assert!(report.vetoed);
        assert_eq!(report.handlers_run, 0);
        assert_eq!(*seen_priority.lock().unwrap(), None);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let dispatcher = EventDispatcher::new();
        let count = Arc::new(AtomicUsize::new(0));

        let id = {
            let count = Arc::clone(&count);
            dispatcher
                .subscribe(
                    EventType::Custom,
                    0,
                    Arc::new(move |_event| {
                        count.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }),
                )
                .unwrap()
        };

        let _ = dispatcher.publish_sync(custom_event()).unwrap();
        assert!(dispatcher.unsubscribe(id).unwrap());
        assert!(!dispatcher.unsubscribe(id).unwrap());
        let _ = dispatcher.publish_sync(custom_event()).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn history_and_stats_record_dispatches() {
        let dispatcher = EventDispatcher::new();
        for _ in 0..3 {
            let _ = dispatcher.publish_sync(custom_event()).unwrap();
        }
        assert_eq!(dispatcher.recent_events(2).len(), 2);
        assert_eq!(dispatcher.recent_events(10).len(), 3);
        assert_eq!(dispatcher.dispatch_stats().get(&EventType::Custom), Some(&3));
    }

    #[tokio::test]
    async fn async_publish_never_blocks_and_delivers() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let count = Arc::new(AtomicUsize::new(0));

        {
            let count = Arc::clone(&count);
            dispatcher
                .subscribe(
                    EventType::Custom,
                    0,
                    Arc::new(move |_event| {
                        count.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }),
                )
                .unwrap();
        }

        // Enqueue before the worker exists: must not block or fail.
        dispatcher.publish_async(custom_event()).unwrap();

        let handle = dispatcher.spawn_async_worker().unwrap();
        // Second spawn returns None: the receiver is already claimed.
        assert!(dispatcher.spawn_async_worker().is_none());

        dispatcher.publish_async(custom_event()).unwrap();

        // Give the worker a moment to drain.
        for _ in 0..50 {
            if count.load(Ordering::SeqCst) == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 2);

        dispatcher.shutdown();
        assert!(dispatcher.publish_async(custom_event()).is_err());
        // The worker only checks the shutdown flag between events, so an
        // idle worker must be aborted rather than detached.
        handle.abort();
        let _ = handle.await;
    }
}
