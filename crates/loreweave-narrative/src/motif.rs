//! The motif engine: hidden narrative moods, rotated over time.
//!
//! One global motif is always active at intensity 7. Each region carries
//! its own small pool of regional motifs at intensity 1..=6, pairwise
//! distinct by catalog type within the region. Expired motifs are
//! forgotten and replaced by fresh uniform draws; nothing about world
//! state influences the draw.
//!
//! Motifs never conflict. [`MotifEngine::motif_context`] synthesizes the
//! global motif and a region's active motifs into a single
//! [`EffectVector`] by per-dimension summation (scaled by intensity),
//! which is commutative and associative, so merge order never matters.
//!
//! # Events
//!
//! - `MotifRotated` -- emitted once per newly activated motif.
//!
//! # State keys
//!
//! - `motif.global` -- the active global motif.
//! - `motif.region.<region>` -- a region's active pool.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use loreweave_events::EventDispatcher;
use loreweave_state::WorldStateStore;
use loreweave_types::{
    EffectDimension, EffectVector, Event, EventPayload, Motif, MotifCatalog, MotifId, MotifScope,
    RegionId,
};

use crate::config::MotifConfig;
use crate::error::NarrativeError;

/// Fixed intensity of the global motif.
pub const GLOBAL_INTENSITY: u8 = 7;

/// A read-only snapshot of the motifs influencing one region, built for
/// the content layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MotifContext {
    /// Synthesis of the global motif and the region's active pool.
    pub effects: EffectVector,
    /// The motifs contributing to `effects`, global first.
    pub active: Vec<Motif>,
    /// A short tone descriptor derived from the dominant dimension.
    pub tone: &'static str,
}

/// Rotates motifs and answers context queries.
pub struct MotifEngine {
    config: MotifConfig,
    rng: SmallRng,
    global: Motif,
    regional: BTreeMap<RegionId, Vec<Motif>>,
    store: Arc<WorldStateStore>,
    dispatcher: Arc<EventDispatcher>,
}

impl MotifEngine {
    /// Build the engine and draw the initial global motif.
    ///
    /// Regions are added afterwards via
    /// [`register_region`](Self::register_region), each drawing its own
    /// starting pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial state write or publish fails.
    pub fn new(
        config: MotifConfig,
        seed: u64,
        store: Arc<WorldStateStore>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Result<Self, NarrativeError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let global = draw_global_motif(&config, 0, &mut rng);
        let mut engine = Self {
            config,
            rng,
            global,
            regional: BTreeMap::new(),
            store,
            dispatcher,
        };
        engine.announce(engine.global.clone(), 0)?;
        Ok(engine)
    }

    /// Register a region and draw its starting motif pool.
    ///
    /// Registering the same region twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if a state write or publish fails.
    pub fn register_region(&mut self, region: RegionId, day: u64, sim_time: u64) -> Result<(), NarrativeError> {
        if self.regional.contains_key(&region) {
            return Ok(());
        }
        self.regional.insert(region.clone(), Vec::new());
        self.refill_region(&region, day, sim_time)
    }

    /// The active global motif.
    pub const fn global(&self) -> &Motif {
        &self.global
    }

    /// A region's active pool, empty for unknown regions.
    pub fn regional(&self, region: &RegionId) -> &[Motif] {
        self.regional.get(region).map_or(&[], Vec::as_slice)
    }

    /// Rotate expired motifs. Evaluated once per day boundary.
    ///
    /// Returns the number of motifs rotated.
    ///
    /// # Errors
    ///
    /// Returns an error if a state write or publish fails.
    pub fn on_day_passed(&mut self, day: u64, sim_time: u64) -> Result<usize, NarrativeError> {
        let mut rotated = 0_usize;

        if day >= self.global.expires_on_day() {
            let replacement = draw_global_motif(&self.config, day, &mut self.rng);
            info!(
                old = ?self.global.catalog_type,
                new = ?replacement.catalog_type,
                day,
                "global motif rotated"
            );
            self.global = replacement.clone();
            self.announce(replacement, sim_time)?;
            rotated = rotated.saturating_add(1);
        }

        let regions: Vec<RegionId> = self.regional.keys().cloned().collect();
        for region in regions {
            if let Some(pool) = self.regional.get_mut(&region) {
                pool.retain(|motif| day < motif.expires_on_day());
            }
            rotated = rotated.saturating_add(self.refill_count(&region, day, sim_time)?);
        }
        Ok(rotated)
    }

    /// Inject a motif outside the normal rotation, e.g. war aftermath.
    ///
    /// A global injection replaces the active global motif. A regional
    /// injection displaces any same-catalog motif in the region's pool
    /// (keeping the pool pairwise distinct) and the oldest motif if the
    /// pool is full.
    ///
    /// # Errors
    ///
    /// Returns an error if a state write or publish fails.
    pub fn inject(
        &mut self,
        catalog: MotifCatalog,
        region: Option<RegionId>,
        day: u64,
        sim_time: u64,
    ) -> Result<MotifId, NarrativeError> {
        let motif = match region {
            None => {
                let motif = Motif {
                    id: MotifId::new(),
                    catalog_type: catalog,
                    intensity: GLOBAL_INTENSITY,
                    duration_days: self.draw_global_duration(),
                    scope: MotifScope::Global,
                    started_on_day: day,
                };
                self.global = motif.clone();
                motif
            }
            Some(region) => {
                let motif = self.draw_regional_for(catalog, &region, day);
                let pool = self.regional.entry(region).or_default();
                pool.retain(|active| active.catalog_type != catalog);
                if pool.len() >= self.config.regional_motifs_per_region {
                    pool.remove(0);
                }
                pool.push(motif.clone());
                motif
            }
        };
        info!(catalog = ?motif.catalog_type, scope = ?motif.scope, day, "motif injected");
        let id = motif.id;
        self.announce(motif, sim_time)?;
        Ok(id)
    }

    /// Synthesize the motifs influencing `region` (or only the global
    /// motif, for `None`) into one context snapshot.
    pub fn motif_context(&self, region: Option<&RegionId>) -> MotifContext {
        let mut active = vec![self.global.clone()];
        if let Some(region) = region {
            active.extend(self.regional(region).iter().cloned());
        }

        let mut effects = EffectVector::new();
        for motif in &active {
            effects.merge(&effects_for(motif.catalog_type).scaled(f64::from(motif.intensity)));
        }
        let tone = effects
            .dominant()
            .map_or("unremarkable", |(dimension, _)| tone_for(dimension));
        MotifContext {
            effects,
            active,
            tone,
        }
    }

    /// Top a region's pool back up to the configured size.
    fn refill_region(&mut self, region: &RegionId, day: u64, sim_time: u64) -> Result<(), NarrativeError> {
        let _ = self.refill_count(region, day, sim_time)?;
        Ok(())
    }

    fn refill_count(&mut self, region: &RegionId, day: u64, sim_time: u64) -> Result<usize, NarrativeError> {
        let mut added = 0_usize;
        loop {
            let taken: Vec<MotifCatalog> = self
                .regional
                .get(region)
                .map(|pool| pool.iter().map(|motif| motif.catalog_type).collect())
                .unwrap_or_default();
            if taken.len() >= self.config.regional_motifs_per_region {
                break;
            }
            let Some(catalog) = draw_distinct_catalog(&taken, &mut self.rng) else {
                // Every catalog entry is already active here.
                warn!(region = region.as_str(), "motif catalog exhausted for region");
                break;
            };
            let motif = self.draw_regional_for(catalog, region, day);
            debug!(
                region = region.as_str(),
                catalog = ?motif.catalog_type,
                intensity = motif.intensity,
                duration = motif.duration_days,
                "regional motif drawn"
            );
            if let Some(pool) = self.regional.get_mut(region) {
                pool.push(motif.clone());
            }
            self.announce(motif, sim_time)?;
            added = added.saturating_add(1);
        }
        Ok(added)
    }

    /// Draw a regional motif of a fixed catalog type.
    fn draw_regional_for(&mut self, catalog: MotifCatalog, region: &RegionId, day: u64) -> Motif {
        let intensity: u8 = self.rng.random_range(1..=6);
        let factor = self.rng.random_range(
            self.config.regional_duration_factor_min..=self.config.regional_duration_factor_max,
        );
        Motif {
            id: MotifId::new(),
            catalog_type: catalog,
            intensity,
            duration_days: u64::from(intensity).saturating_mul(factor),
            scope: MotifScope::Regional(region.clone()),
            started_on_day: day,
        }
    }

    fn draw_global_duration(&mut self) -> u64 {
        draw_global_duration(&self.config, &mut self.rng)
    }

    /// Publish the rotation event and write the active set to the store.
    fn announce(&self, motif: Motif, sim_time: u64) -> Result<(), NarrativeError> {
        let scope = motif.scope.clone();
        let _ = self.dispatcher.publish_sync(Event::new(
            sim_time,
            EventPayload::MotifRotated { motif },
            "motif-engine",
        ))?;

        match scope {
            MotifScope::Global => {
                let _ = self.store.set(
                    "motif.global",
                    serde_json::to_value(&self.global)?,
                    "motif",
                    None,
                    sim_time,
                )?;
            }
            MotifScope::Regional(region) => {
                let pool = self.regional(&region);
                let key = format!("motif.region.{}", slug(region.as_str()));
                let _ = self.store.set(
                    &key,
                    serde_json::to_value(pool)?,
                    "motif",
                    Some(region),
                    sim_time,
                )?;
            }
        }
        Ok(())
    }
}

/// Draw the global motif: fixed intensity, jittered duration, uniform
/// catalog pick with repeats allowed.
fn draw_global_motif(config: &MotifConfig, day: u64, rng: &mut impl Rng) -> Motif {
    let index = rng.random_range(0..MotifCatalog::ALL.len());
    let catalog = MotifCatalog::ALL.get(index).copied().unwrap_or(MotifCatalog::Omen);
    Motif {
        id: MotifId::new(),
        catalog_type: catalog,
        intensity: GLOBAL_INTENSITY,
        duration_days: draw_global_duration(config, rng),
        scope: MotifScope::Global,
        started_on_day: day,
    }
}

/// Draw a global duration uniformly from the jitter window around the
/// base, `[base - jitter, base + jitter]`.
fn draw_global_duration(config: &MotifConfig, rng: &mut impl Rng) -> u64 {
    let lo = config
        .global_base_duration_days
        .saturating_sub(config.global_duration_jitter_days);
    let hi = config
        .global_base_duration_days
        .saturating_add(config.global_duration_jitter_days);
    rng.random_range(lo..=hi)
}

/// Uniform draw over the catalog entries not in `taken`.
fn draw_distinct_catalog(taken: &[MotifCatalog], rng: &mut impl Rng) -> Option<MotifCatalog> {
    let available: Vec<MotifCatalog> = MotifCatalog::ALL
        .iter()
        .copied()
        .filter(|catalog| !taken.contains(catalog))
        .collect();
    if available.is_empty() {
        return None;
    }
    let index = rng.random_range(0..available.len());
    available.get(index).copied()
}

/// The base effect vector (intensity 1) for a catalog entry.
pub fn effects_for(catalog: MotifCatalog) -> EffectVector {
    use EffectDimension::{Danger, Festivity, Gloom, Hope, Mystery, Tension};
    let pairs: &[(EffectDimension, f64)] = match catalog {
        MotifCatalog::Betrayal => &[(Tension, 1.0), (Gloom, 0.3)],
        MotifCatalog::Omen => &[(Mystery, 1.0), (Gloom, 0.4)],
        MotifCatalog::Festival => &[(Festivity, 1.0), (Hope, 0.5)],
        MotifCatalog::Plague => &[(Gloom, 1.0), (Danger, 0.8)],
        MotifCatalog::Prosperity => &[(Hope, 1.0), (Festivity, 0.4)],
        MotifCatalog::Haunting => &[(Mystery, 0.8), (Gloom, 0.6)],
        MotifCatalog::Discovery => &[(Hope, 0.7), (Mystery, 0.5)],
        MotifCatalog::Strife => &[(Tension, 1.0), (Danger, 0.5)],
        MotifCatalog::Harvest => &[(Hope, 0.6), (Festivity, 0.6)],
        MotifCatalog::Wanderlust => &[(Hope, 0.4), (Mystery, 0.3)],
        MotifCatalog::Mourning => &[(Gloom, 1.0)],
        MotifCatalog::Conspiracy => &[(Mystery, 0.7), (Tension, 0.6)],
    };
    EffectVector::from_pairs(pairs)
}

/// A short tone word for the dominant effect dimension.
const fn tone_for(dimension: EffectDimension) -> &'static str {
    match dimension {
        EffectDimension::Tension => "uneasy",
        EffectDimension::Danger => "perilous",
        EffectDimension::Festivity => "festive",
        EffectDimension::Mystery => "strange",
        EffectDimension::Gloom => "grim",
        EffectDimension::Hope => "hopeful",
    }
}

/// Replace whitespace with hyphens so region names form valid state keys.
fn slug(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("-")
}
