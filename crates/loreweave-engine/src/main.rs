//! World engine binary for the Loreweave simulation substrate.
//!
//! This is the main entry point that wires together the event
//! dispatcher, versioned world state, calendar scheduler, and the
//! narrative and world engines. It loads configuration, seeds a
//! starting world, registers the engine subscriptions, and runs the
//! paced tick loop until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `loreweave-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Create the event dispatcher and world state store
//! 4. Create the world clock and trigger scheduler
//! 5. Construct the motif, rumor, POI, population, and faction engines
//! 6. Seed the starting world (regions, factions, POIs, entities)
//! 7. Register engine subscriptions on the dispatcher
//! 8. Start the async dispatch worker
//! 9. Run the tick loop
//! 10. Shut down and log the final report

mod config;
mod error;
mod wiring;
mod worldgen;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use loreweave_core::{SchedulerError, TriggerScheduler, WorldClock};
use loreweave_events::EventDispatcher;
use loreweave_narrative::{MotifEngine, RumorEngine};
use loreweave_state::WorldStateStore;
use loreweave_world::{FactionEngine, PoiRegistry, PopulationController};

use crate::config::SimulationConfig;
use crate::wiring::Services;

/// Application entry point for the world engine.
///
/// # Errors
///
/// Returns an error if any initialization step fails.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.filter.clone())),
        )
        .with_target(true)
        .init();

    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        time_scale = config.world.time_scale,
        "loreweave-engine starting"
    );

    // 3. Create the event dispatcher and world state store.
    let dispatcher = Arc::new(EventDispatcher::new());
    let store = Arc::new(WorldStateStore::new(Arc::clone(&dispatcher)));

    // 4. Create the world clock and trigger scheduler.
    let clock = WorldClock::new(&config.world.calendar, config.world.time_scale)?;
    let mut scheduler =
        TriggerScheduler::new(clock, Arc::clone(&dispatcher), &config.scheduler);
    info!(
        days_per_month = config.world.calendar.days_per_month,
        months_per_year = config.world.calendar.months_per_year,
        "World clock and scheduler initialized"
    );

    // 5. Construct the engines.
    let seed = config.world.seed;
    let mut motif = MotifEngine::new(
        config.motif.clone(),
        seed,
        Arc::clone(&store),
        Arc::clone(&dispatcher),
    )?;
    let mut rumor = RumorEngine::new(config.rumor.clone(), seed, Arc::clone(&dispatcher));
    let mut registry = PoiRegistry::new(
        config.poi.clone(),
        Arc::clone(&store),
        Arc::clone(&dispatcher),
    );
    let population = PopulationController::new(config.population.clone());
    let mut faction = FactionEngine::new(
        config.faction.clone(),
        seed,
        Arc::clone(&store),
        Arc::clone(&dispatcher),
    );

    // 6. Seed the starting world.
    let world = worldgen::generate(
        seed,
        &mut motif,
        &mut rumor,
        &mut registry,
        &mut faction,
        &mut scheduler,
    )?;

    // 7. Register engine subscriptions.
    let services = Services {
        dispatcher: Arc::clone(&dispatcher),
        motif: Arc::new(Mutex::new(motif)),
        rumor: Arc::new(Mutex::new(rumor)),
        registry: Arc::new(Mutex::new(registry)),
        population: Arc::new(population),
        faction: Arc::new(Mutex::new(faction)),
        holdings: Arc::new(world.holdings),
    };
    wiring::register_subscriptions(&services)?;
    info!("Engine subscriptions registered");

    // 8. Start the async dispatch worker.
    let worker = dispatcher.spawn_async_worker();

    // 9. Run the tick loop.
    let tick_interval = Duration::from_millis(config.world.tick_interval_ms);
    let mut tick: u64 = 0;
    loop {
        if let Some(max_ticks) = config.world.max_ticks {
            if tick >= max_ticks {
                info!(tick, "Tick limit reached");
                break;
            }
        }
        tick = tick.saturating_add(1);

        match scheduler.tick(config.world.tick_delta_seconds) {
            Ok(report) => {
                if report.days_processed > 0 {
                    info!(
                        tick,
                        seconds = report.seconds_added,
                        days = report.days_processed,
                        triggers = report.triggers_fired,
                        day = scheduler.clock().day(),
                        "tick complete"
                    );
                }
            }
            Err(SchedulerError::Overrun {
                pending,
                processed,
                cap,
            }) => {
                // Catch-up is capped per tick; the backlog drains on
                // subsequent ticks.
                warn!(tick, pending, processed, cap, "day backlog, catching up");
            }
            Err(e) => return Err(e.into()),
        }

        tokio::time::sleep(tick_interval).await;
    }

    // 10. Shut down and log the final report.
    dispatcher.shutdown();
    if let Some(handle) = worker {
        handle.abort();
        let _ = handle.await;
    }

    let date = scheduler.clock().date();
    log_final_report(&dispatcher.dispatch_stats(), store.key_count());
    info!(
        day = date.day,
        year = date.year,
        month = date.month,
        entities = world.entities.len(),
        "loreweave-engine shutdown complete"
    );

    Ok(())
}

/// Load the simulation configuration from `loreweave-config.yaml`.
///
/// Looks for the config file relative to the current working
/// directory. Missing file means defaults.
fn load_config() -> Result<SimulationConfig, crate::error::EngineError> {
    let config_path = Path::new("loreweave-config.yaml");
    if config_path.exists() {
        SimulationConfig::from_file(config_path)
    } else {
        Ok(SimulationConfig::default())
    }
}

/// Log per-event-type dispatch counts and the state key count.
fn log_final_report(
    stats: &BTreeMap<loreweave_types::EventType, u64>,
    key_count: usize,
) {
    let total: u64 = stats.values().copied().sum();
    info!(events_dispatched = total, state_keys = key_count, "final report");
    for (event_type, count) in stats {
        info!(event_type = ?event_type, count, "dispatch count");
    }
}
