//! Starting-world generation.
//!
//! Seeds a small but complete world: three regions, a handful of POIs
//! per region, three factions with pairwise tension records, named
//! entities with gossip profiles, a few origin rumors, and the standing
//! calendar triggers. Everything random flows from the world seed, so
//! the same seed reproduces the same starting world.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use loreweave_core::{Recurrence, TriggerScheduler};
use loreweave_narrative::{EntityProfile, MotifEngine, RumorEngine};
use loreweave_types::{
    EntityId, FactionId, Poi, PoiId, PoiState, PoiType, RegionId, RumorCatalog,
};
use loreweave_world::{FactionEngine, PoiRegistry};

use crate::error::EngineError;

/// Everything worldgen created, for wiring and logging.
pub struct GeneratedWorld {
    /// The seeded regions.
    pub regions: Vec<RegionId>,
    /// Faction ids with display names.
    pub factions: Vec<(FactionId, String)>,
    /// Which POIs each faction holds; war damage lands here.
    pub holdings: BTreeMap<FactionId, Vec<PoiId>>,
    /// The seeded gossip entities.
    pub entities: Vec<EntityId>,
}

const REGION_NAMES: [&str; 3] = ["emberfall", "thornwood", "mirefen"];

const FACTION_NAMES: [&str; 3] = ["Ashen Covenant", "River League", "Stone Concord"];

const POI_NAMES: [&str; 9] = [
    "Harrowgate",
    "Cinderholt",
    "Bryn Tor",
    "Whistlefen",
    "Oakhaven",
    "Greywatch",
    "Saltmere",
    "Duskwell",
    "Thornden",
];

const SEED_RUMORS: [(RumorCatalog, f64, u8, &str, &str); 3] = [
    (
        RumorCatalog::Portent,
        0.3,
        3,
        "omens",
        "A second moon rose over the fen for 3 nights",
    ),
    (
        RumorCatalog::Crime,
        0.8,
        4,
        "politics",
        "The reeve of Harrowgate never paid the grain levy",
    ),
    (
        RumorCatalog::Threat,
        0.6,
        5,
        "war",
        "Raiders took 12 horses from the Saltmere road",
    ),
];

/// Build the starting world into the supplied engines.
///
/// # Errors
///
/// Propagates engine failures during seeding.
pub fn generate(
    seed: u64,
    motif: &mut MotifEngine,
    rumor: &mut RumorEngine,
    registry: &mut PoiRegistry,
    faction: &mut FactionEngine,
    scheduler: &mut TriggerScheduler,
) -> Result<GeneratedWorld, EngineError> {
    let mut rng = SmallRng::seed_from_u64(seed);

    // Regions, each with a starting motif pool.
    let regions: Vec<RegionId> = REGION_NAMES.iter().map(|&name| RegionId::from(name)).collect();
    for region in &regions {
        motif.register_region(region.clone(), 0, 0)?;
    }

    // Factions and their pairwise tension records.
    let factions: Vec<(FactionId, String)> = FACTION_NAMES
        .iter()
        .map(|&name| (FactionId::new(), name.to_owned()))
        .collect();
    for (i, (x, _)) in factions.iter().enumerate() {
        for (y, _) in factions.iter().skip(i.saturating_add(1)) {
            let _ = faction.register_pair(*x, *y);
            let opening: f64 = rng.random_range(-20.0..20.0);
            faction.adjust_tension(*x, *y, opening, "old grievances", 0)?;
        }
    }

    // POIs, three per region, round-robin across factions.
    let mut holdings: BTreeMap<FactionId, Vec<PoiId>> = BTreeMap::new();
    for (index, &name) in POI_NAMES.iter().enumerate() {
        let Some(region) = regions.get(index.checked_rem(regions.len()).unwrap_or(0)) else {
            continue;
        };
        let Some((owner, _)) = factions.get(index.checked_rem(factions.len()).unwrap_or(0)) else {
            continue;
        };
        let poi = seed_poi(name, region.clone(), &mut rng);
        holdings.entry(*owner).or_default().push(poi.id);
        registry.insert(poi);
    }

    // Gossip entities with reliability/skepticism profiles.
    let entities = seed_entities(rumor, &mut rng);

    // Origin rumors, told by nobody in particular yet.
    for (catalog, truth, severity, category, text) in SEED_RUMORS {
        let _ = rumor.create_rumor(catalog, truth, severity, category, text, 0)?;
    }

    // Standing calendar triggers.
    let _ = scheduler.schedule("market-day", 7, Recurrence::Weekly);
    let _ = scheduler.schedule("festival-of-lanterns", 120, Recurrence::Yearly);

    info!(
        regions = regions.len(),
        factions = factions.len(),
        pois = registry.len(),
        entities = entities.len(),
        rumors = SEED_RUMORS.len(),
        "starting world generated"
    );

    Ok(GeneratedWorld {
        regions,
        factions,
        holdings,
        entities,
    })
}

/// Draw one POI with a type-appropriate population window.
fn seed_poi(name: &str, region: RegionId, rng: &mut impl Rng) -> Poi {
    let poi_type = match rng.random_range(0..5) {
        0 | 1 => PoiType::Village,
        2 => PoiType::Town,
        3 => PoiType::City,
        _ => PoiType::Fortress,
    };
    let target: u32 = match poi_type {
        PoiType::Village => rng.random_range(80..200),
        PoiType::Town => rng.random_range(400..1_200),
        PoiType::City => rng.random_range(2_000..6_000),
        PoiType::Fortress | PoiType::Temple => rng.random_range(50..150),
    };
    let current = rng.random_range(target / 2..=target);
    Poi {
        id: PoiId::new(),
        name: name.to_owned(),
        poi_type,
        region,
        state: PoiState::Normal,
        current_population: current,
        target_population: target,
        min_population: target / 20,
        max_population: target.saturating_mul(2),
        npc_count: current / 10,
        manual_override: false,
    }
}

const ENTITY_NAMES: [&str; 6] = ["Maren", "Odo", "Petra", "Selvan", "Bragi", "Edda"];

/// Register named entities and a ring of mild acquaintance.
fn seed_entities(rumor: &mut RumorEngine, rng: &mut impl Rng) -> Vec<EntityId> {
    let profiles: Vec<EntityProfile> = ENTITY_NAMES
        .iter()
        .map(|&name| EntityProfile {
            id: EntityId::new(),
            name: name.to_owned(),
            reliability: rng.random_range(0.2..0.9),
            skepticism: rng.random_range(0.1..0.8),
            relationships: BTreeMap::new(),
        })
        .collect();
    let ids: Vec<EntityId> = profiles.iter().map(|profile| profile.id).collect();
    for profile in profiles {
        rumor.register_entity(profile);
    }
    for (i, &from) in ids.iter().enumerate() {
        let wrapped = i.saturating_add(1).checked_rem(ids.len()).unwrap_or(0);
        if let Some(to) = ids.get(wrapped).copied() {
            // Registered entities cannot be missing here.
            let _ = rumor.set_relationship(from, to, rng.random_range(-0.3..0.7));
        }
    }
    ids
}
