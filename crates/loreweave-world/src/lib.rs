//! World-mechanic engines: population, POI lifecycle, faction tension.
//!
//! These engines own the mutable world objects created at generation
//! time (POIs, faction pair records) and evolve them in response to
//! calendar boundary events. All effects surface as dispatcher events
//! and world-state writes; engines never call each other directly --
//! cross-engine consequences (war aftermath, damage) are returned as
//! plans for the wiring layer to apply.

pub mod config;
pub mod error;
pub mod faction;
pub mod poi;
pub mod population;

pub use config::{FactionConfig, OutcomeConsequences, PoiConfig, PopulationConfig};
pub use error::WorldError;
pub use faction::{FactionEngine, WarResolution};
pub use poi::{PoiRegistry, TransitionRule};
pub use population::PopulationController;
