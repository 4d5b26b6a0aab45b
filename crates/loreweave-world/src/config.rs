//! Tunable parameters for the world engines.

use serde::{Deserialize, Serialize};

use loreweave_types::{PoiType, WarOutcome};

/// Population controller parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Monthly base growth for villages.
    pub base_rate_village: f64,
    /// Monthly base growth for towns.
    pub base_rate_town: f64,
    /// Monthly base growth for cities.
    pub base_rate_city: f64,
    /// Monthly base growth for fortresses.
    pub base_rate_fortress: f64,
    /// Monthly base growth for temples.
    pub base_rate_temple: f64,
    /// Admin-controlled multiplier on every growth computation. May be
    /// negative, producing world-wide decline.
    pub global_multiplier: f64,
    /// Fraction of target population at which growth is halved.
    pub soft_cap_fraction: f64,
}

impl PopulationConfig {
    /// The monthly base growth rate for a POI type.
    pub const fn base_rate(&self, poi_type: PoiType) -> f64 {
        match poi_type {
            PoiType::Village => self.base_rate_village,
            PoiType::Town => self.base_rate_town,
            PoiType::City => self.base_rate_city,
            PoiType::Fortress => self.base_rate_fortress,
            PoiType::Temple => self.base_rate_temple,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            base_rate_village: 10.0,
            base_rate_town: 20.0,
            base_rate_city: 40.0,
            base_rate_fortress: 6.0,
            base_rate_temple: 4.0,
            global_multiplier: 1.0,
            soft_cap_fraction: 0.9,
        }
    }
}

/// POI state-machine parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoiConfig {
    /// NPCs generated per point of target population when a POI enters
    /// `Repopulating` or `Normal`.
    pub npc_fraction: f64,
}

impl Default for PoiConfig {
    fn default() -> Self {
        Self { npc_fraction: 0.1 }
    }
}

/// Deterministic consequences of one war outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeConsequences {
    /// Fraction of the loser's POI populations displaced.
    pub population_shift: f64,
    /// Resource penalty written against the losing side.
    pub resource_penalty: f64,
    /// Tension value the pair resets to.
    pub tension_after: f64,
}

impl Default for OutcomeConsequences {
    fn default() -> Self {
        Self {
            population_shift: 0.0,
            resource_penalty: 0.0,
            tension_after: 0.0,
        }
    }
}

/// Faction tension / war engine parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FactionConfig {
    /// Tension at or above which war is declared.
    pub war_threshold: f64,
    /// Tension at or below which an alliance forms.
    pub alliance_threshold: f64,
    /// Tension at or above which the pair is `Hostile`.
    pub hostile_threshold: f64,
    /// Tension at or above which the pair is in `Rivalry`.
    pub rivalry_threshold: f64,
    /// Daily decay applied while tension is positive.
    pub decay_positive_per_day: f64,
    /// Daily decay applied while tension is negative.
    pub decay_negative_per_day: f64,
    /// Days a war runs before auto-resolving. Territory captures reset
    /// the countdown to this value.
    pub war_countdown_days: u64,
    /// Consequences of a decisive victory.
    pub decisive_victory: OutcomeConsequences,
    /// Consequences of a pyrrhic victory.
    pub pyrrhic_victory: OutcomeConsequences,
    /// Consequences of a stalemate.
    pub stalemate: OutcomeConsequences,
    /// Consequences of a negotiated settlement.
    pub negotiated_settlement: OutcomeConsequences,
}

impl FactionConfig {
    /// The configured consequences for one outcome.
    pub const fn consequences(&self, outcome: WarOutcome) -> OutcomeConsequences {
        match outcome {
            WarOutcome::DecisiveVictory => self.decisive_victory,
            WarOutcome::PyrrhicVictory => self.pyrrhic_victory,
            WarOutcome::Stalemate => self.stalemate,
            WarOutcome::NegotiatedSettlement => self.negotiated_settlement,
        }
    }
}

impl Default for FactionConfig {
    fn default() -> Self {
        Self {
            war_threshold: 70.0,
            alliance_threshold: -75.0,
            hostile_threshold: 40.0,
            rivalry_threshold: 15.0,
            decay_positive_per_day: 1.5,
            decay_negative_per_day: 1.0,
            war_countdown_days: 30,
            decisive_victory: OutcomeConsequences {
                population_shift: 0.5,
                resource_penalty: 0.4,
                tension_after: 10.0,
            },
            pyrrhic_victory: OutcomeConsequences {
                population_shift: 0.3,
                resource_penalty: 0.3,
                tension_after: 25.0,
            },
            stalemate: OutcomeConsequences {
                population_shift: 0.1,
                resource_penalty: 0.2,
                tension_after: 40.0,
            },
            negotiated_settlement: OutcomeConsequences {
                population_shift: 0.0,
                resource_penalty: 0.1,
                tension_after: 0.0,
            },
        }
    }
}
