//! Service wiring: engine subscriptions on the dispatcher.
//!
//! Engines never call each other. Calendar boundary events fan out to
//! the engines through the subscriptions registered here, and
//! cross-engine consequences (war aftermath) are applied by the wiring
//! closures after the owning engine's lock has been released.
//!
//! Handler ordering: motif rotation runs before rumor decay and the
//! faction day step (higher subscription priority), so aftermath motif
//! injections land on an already-rotated pool.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use loreweave_events::{EventDispatcher, HandlerError};
use loreweave_narrative::{MotifEngine, RumorEngine};
use loreweave_types::{EventPayload, EventType, FactionId, PoiId};
use loreweave_world::{FactionEngine, PoiRegistry, PopulationController, WarResolution};

use crate::error::EngineError;

/// Every long-lived service, shared with the wiring closures.
pub struct Services {
    /// The event core.
    pub dispatcher: Arc<EventDispatcher>,
    /// Motif rotation engine.
    pub motif: Arc<Mutex<MotifEngine>>,
    /// Rumor diffusion engine.
    pub rumor: Arc<Mutex<RumorEngine>>,
    /// POI registry and state machine.
    pub registry: Arc<Mutex<PoiRegistry>>,
    /// Population controller.
    pub population: Arc<PopulationController>,
    /// Faction tension / war engine.
    pub faction: Arc<Mutex<FactionEngine>>,
    /// Which POIs each faction holds; war damage lands here.
    pub holdings: Arc<BTreeMap<FactionId, Vec<PoiId>>>,
}

/// Register every engine subscription.
///
/// # Errors
///
/// Returns [`EngineError::Dispatch`] if a subscription cannot be
/// registered.
pub fn register_subscriptions(services: &Services) -> Result<(), EngineError> {
    subscribe_motif_rotation(services)?;
    subscribe_rumor_decay(services)?;
    subscribe_faction_day(services)?;
    subscribe_population_month(services)?;
    Ok(())
}

/// `DayPassed` -> motif rotation. Runs first (priority 20).
fn subscribe_motif_rotation(services: &Services) -> Result<(), EngineError> {
    let motif = Arc::clone(&services.motif);
    let _ = services.dispatcher.subscribe(
        EventType::DayPassed,
        20,
        Arc::new(move |event| {
            let EventPayload::DayPassed { day } = event.payload else {
                return Ok(());
            };
            let mut engine = motif.lock().map_err(|_e| HandlerError::from("motif engine lock poisoned"))?;
            let rotated = engine
                .on_day_passed(day, event.sim_time)
                .map_err(|e| HandlerError::from(e.to_string()))?;
            if rotated > 0 {
                info!(day, rotated, "motifs rotated");
            }
            Ok(())
        }),
    )?;
    Ok(())
}

/// `DayPassed` -> believability decay (priority 10).
fn subscribe_rumor_decay(services: &Services) -> Result<(), EngineError> {
    let rumor = Arc::clone(&services.rumor);
    let _ = services.dispatcher.subscribe(
        EventType::DayPassed,
        10,
        Arc::new(move |event| {
            let mut engine = rumor.lock().map_err(|_e| HandlerError::from("rumor engine lock poisoned"))?;
            engine.on_day_passed(event.sim_time);
            Ok(())
        }),
    )?;
    Ok(())
}

/// `DayPassed` -> tension decay, countdowns, war resolution (priority 0).
///
/// Resolutions returned by the faction engine are applied here, after
/// its lock is dropped: war damage and population shift on the loser's
/// holdings, then the aftermath motif.
fn subscribe_faction_day(services: &Services) -> Result<(), EngineError> {
    let faction = Arc::clone(&services.faction);
    let registry = Arc::clone(&services.registry);
    let motif = Arc::clone(&services.motif);
    let holdings = Arc::clone(&services.holdings);
    let _ = services.dispatcher.subscribe(
        EventType::DayPassed,
        0,
        Arc::new(move |event| {
            let EventPayload::DayPassed { day } = event.payload else {
                return Ok(());
            };
            let resolutions = {
                let mut engine = faction
                    .lock()
                    .map_err(|_e| HandlerError::from("faction engine lock poisoned"))?;
                engine
                    .on_day_passed(event.sim_time)
                    .map_err(|e| HandlerError::from(e.to_string()))?
            };
            for resolution in resolutions {
                apply_resolution(&resolution, &registry, &motif, &holdings, day, event.sim_time)?;
            }
            Ok(())
        }),
    )?;
    Ok(())
}

/// `MonthPassed` -> population growth step.
fn subscribe_population_month(services: &Services) -> Result<(), EngineError> {
    let registry = Arc::clone(&services.registry);
    let population = Arc::clone(&services.population);
    let _ = services.dispatcher.subscribe(
        EventType::MonthPassed,
        0,
        Arc::new(move |event| {
            let mut pois = registry
                .lock()
                .map_err(|_e| HandlerError::from("poi registry lock poisoned"))?;
            let changed = population
                .on_month_passed(&mut pois, event.sim_time)
                .map_err(|e| HandlerError::from(e.to_string()))?;
            info!(changed, "monthly population step complete");
            Ok(())
        }),
    )?;
    Ok(())
}

/// Apply one war resolution's cross-engine consequences.
fn apply_resolution(
    resolution: &WarResolution,
    registry: &Arc<Mutex<PoiRegistry>>,
    motif: &Arc<Mutex<MotifEngine>>,
    holdings: &BTreeMap<FactionId, Vec<PoiId>>,
    day: u64,
    sim_time: u64,
) -> Result<(), HandlerError> {
    let mut aftermath_region = None;

    if let Some(loser) = resolution.loser {
        let mut pois = registry
            .lock()
            .map_err(|_e| HandlerError::from("poi registry lock poisoned"))?;
        for &poi_id in holdings.get(&loser).map_or(&[][..], Vec::as_slice) {
            if aftermath_region.is_none() {
                aftermath_region = pois.get(poi_id).ok().map(|poi| poi.region.clone());
            }
            if let Some(damage) = resolution.damage {
                if let Err(e) = pois.apply_war_damage(poi_id, damage, sim_time) {
                    warn!(poi = %poi_id, error = %e, "war damage failed to apply");
                }
            }
            if resolution.population_shift > 0.0 {
                let survivors = match pois.get(poi_id) {
                    Ok(poi) => shifted_population(poi.current_population, resolution.population_shift),
                    Err(_) => continue,
                };
                if let Err(e) = pois.set_population(poi_id, survivors, sim_time) {
                    warn!(poi = %poi_id, error = %e, "population shift failed to apply");
                }
            }
        }
    }

    let mut moods = motif
        .lock()
        .map_err(|_e| HandlerError::from("motif engine lock poisoned"))?;
    moods
        .inject(resolution.aftermath_motif, aftermath_region, day, sim_time)
        .map_err(|e| HandlerError::from(e.to_string()))?;
    info!(pair = ?resolution.pair, outcome = ?resolution.outcome, "war aftermath applied");
    Ok(())
}

/// Population remaining after a displacement fraction.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn shifted_population(current: u32, shift: f64) -> u32 {
    let remaining = (f64::from(current) * (1.0 - shift.clamp(0.0, 1.0))).floor();
    if remaining <= 0.0 { 0 } else { remaining as u32 }
}
