use crate::compression::codec_for;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use vectier_core::{CompressionConfig, HeatConfig, Tier};

/// Immutable per-tier table entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    pub tier: Tier,
    /// Raw `f32` bytes divided by `bytes_per_vector`
    pub compression_ratio: f64,
    /// Encoded size of one vector in this tier
    pub bytes_per_vector: usize,
    /// Lowest heat score recommended for this tier (inclusive)
    pub min_heat_score: f64,
    /// Highest heat score recommended for this tier (exclusive, except hot)
    pub max_heat_score: f64,
}

/// Tier policy
///
/// Owns the ordered tier table and maps heat scores to recommended tiers:
/// - Hot: heat >= `warm_below` (default 0.8)
/// - Warm: heat in [`cool_below`, `warm_below`) (default [0.5, 0.8))
/// - Cool: heat in [`cold_below`, `cool_below`) (default [0.25, 0.5))
/// - Cold: heat in [`frozen_below`, `cold_below`) (default [0.1, 0.25))
/// - Frozen: heat < `frozen_below` (default 0.1)
///
/// Recommendations never mutate state; the manager decides whether to act.
///
/// # Example
///
/// ```
/// use vectier_core::{CompressionConfig, Tier};
/// use vectier_storage::tiering_manager::TierPolicy;
///
/// let policy = TierPolicy::from_config(&CompressionConfig::default()).unwrap();
/// assert_eq!(policy.tier_for_heat_score(1.0), Tier::Hot);
/// assert_eq!(policy.tier_for_heat_score(0.0), Tier::Frozen);
/// assert_eq!(policy.bytes_for_tier(Tier::Warm, 10), 30_720);
/// ```
#[derive(Debug, Clone)]
pub struct TierPolicy {
    dimension: usize,
    num_subvectors: usize,
    tiers: [TierConfig; Tier::COUNT],
}

impl TierPolicy {
    /// Build the tier table for a vector geometry.
    ///
    /// # Errors
    ///
    /// Returns error if the heat boundaries fail validation
    pub fn new(dimension: usize, num_subvectors: usize, heat: &HeatConfig) -> Result<Self> {
        heat.validate()?;

        let [warm_below, cool_below, cold_below, frozen_below] = heat.boundaries();
        let ranges = [
            (warm_below, 1.0),
            (cool_below, warm_below),
            (cold_below, cool_below),
            (frozen_below, cold_below),
            (0.0, frozen_below),
        ];

        let raw_bytes = dimension * 4;
        let tiers = Tier::ALL.map(|tier| {
            let bytes_per_vector = (codec_for(tier).encoded_len)(dimension, num_subvectors);
            let (min_heat_score, max_heat_score) = ranges[tier.index()];
            TierConfig {
                tier,
                compression_ratio: raw_bytes as f64 / bytes_per_vector.max(1) as f64,
                bytes_per_vector,
                min_heat_score,
                max_heat_score,
            }
        });

        Ok(Self {
            dimension,
            num_subvectors,
            tiers,
        })
    }

    /// Build the tier table from a validated compression config.
    ///
    /// # Errors
    ///
    /// Returns error if the config fails validation
    pub fn from_config(config: &CompressionConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.dimension, config.num_subvectors(), &config.heat)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn num_subvectors(&self) -> usize {
        self.num_subvectors
    }

    /// The full tier table, hottest first.
    pub fn tier_configs(&self) -> &[TierConfig] {
        &self.tiers
    }

    pub fn config(&self, tier: Tier) -> &TierConfig {
        &self.tiers[tier.index()]
    }

    /// True iff `to` is strictly later than `from`.
    pub fn is_valid_transition(from: Tier, to: Tier) -> bool {
        from.can_transition_to(to)
    }

    /// Successor tier, or `None` at frozen.
    pub fn next_tier(tier: Tier) -> Option<Tier> {
        tier.next()
    }

    /// Recommended tier for a heat score.
    ///
    /// Scores are clamped to [0, 1]; NaN counts as 0.
    pub fn tier_for_heat_score(&self, score: f64) -> Tier {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        self.tiers
            .iter()
            .find(|config| score >= config.min_heat_score)
            .map_or(Tier::Frozen, |config| config.tier)
    }

    pub fn bytes_per_vector(&self, tier: Tier) -> usize {
        self.config(tier).bytes_per_vector
    }

    /// `count * bytes_per_vector(tier)`.
    pub fn bytes_for_tier(&self, tier: Tier, count: usize) -> u64 {
        count as u64 * self.bytes_per_vector(tier) as u64
    }
}
