//! Tunable parameters for the narrative engines.

use serde::{Deserialize, Serialize};

/// Motif engine parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotifConfig {
    /// How many motifs each region keeps active at once.
    pub regional_motifs_per_region: usize,
    /// Base duration of the global motif, in days.
    pub global_base_duration_days: u64,
    /// Half-width (inclusive) of the uniform jitter window around the
    /// global motif's base duration, in days.
    pub global_duration_jitter_days: u64,
    /// Lower bound (inclusive) of the per-intensity duration factor for
    /// regional motifs.
    pub regional_duration_factor_min: u64,
    /// Upper bound (inclusive) of the per-intensity duration factor.
    pub regional_duration_factor_max: u64,
}

impl Default for MotifConfig {
    fn default() -> Self {
        Self {
            regional_motifs_per_region: 3,
            global_base_duration_days: 28,
            global_duration_jitter_days: 10,
            regional_duration_factor_min: 3,
            regional_duration_factor_max: 6,
        }
    }
}

/// Weights applied when computing a propagation hop's mutation chance.
///
/// `chance = clamp(base * (1 - reliability*w_rel) * (1 - skepticism*w_skep)
/// + severity/5 * w_sev, 0, 1)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationWeights {
    /// How strongly a reliable transmitter suppresses mutation.
    pub reliability: f64,
    /// How strongly a skeptical receiver suppresses mutation.
    pub skepticism: f64,
    /// How strongly emotional weight (severity) promotes mutation.
    pub severity: f64,
}

impl Default for MutationWeights {
    fn default() -> Self {
        Self {
            reliability: 0.5,
            skepticism: 0.5,
            severity: 0.2,
        }
    }
}

/// Rumor engine parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RumorConfig {
    /// Baseline mutation chance before weighting.
    pub base_mutation_chance: f64,
    /// Probability that a proper noun survives a subject shift untouched.
    pub proper_noun_skip_chance: f64,
    /// Daily believability decay, subtracted per unreinforced day.
    pub decay_per_day: f64,
    /// Weights for the mutation-chance formula.
    pub weights: MutationWeights,
}

impl Default for RumorConfig {
    fn default() -> Self {
        Self {
            base_mutation_chance: 0.3,
            proper_noun_skip_chance: 0.8,
            decay_per_day: 0.1,
            weights: MutationWeights::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuning() {
        let motif = MotifConfig::default();
        assert_eq!(motif.global_base_duration_days, 28);
        assert_eq!(motif.global_duration_jitter_days, 10);

        let rumor = RumorConfig::default();
        assert!((rumor.base_mutation_chance - 0.3).abs() < f64::EPSILON);
        assert!((rumor.decay_per_day - 0.1).abs() < f64::EPSILON);
    }
}
