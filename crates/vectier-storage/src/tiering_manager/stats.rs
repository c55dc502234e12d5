use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vectier_core::Tier;

/// Vector count and encoded bytes held in one tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierUsage {
    pub count: usize,
    pub bytes: u64,
}

/// Memory accounting snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_vectors: usize,
    /// Encoded bytes across all tiers
    pub total_bytes: u64,
    /// Every tier is present, including empty ones
    pub by_tier: BTreeMap<Tier, TierUsage>,
    /// Bytes the same vectors would take as raw `f32`
    pub uncompressed_bytes: u64,
    pub bytes_saved: u64,
    /// `uncompressed_bytes / total_bytes`; 1.0 for an empty manager
    pub compression_ratio: f64,
}

impl MemoryStats {
    pub(crate) fn from_usage(usage: [TierUsage; Tier::COUNT], dimension: usize) -> Self {
        let total_vectors: usize = usage.iter().map(|u| u.count).sum();
        let total_bytes: u64 = usage.iter().map(|u| u.bytes).sum();
        let uncompressed_bytes = total_vectors as u64 * dimension as u64 * 4;

        let compression_ratio = if total_bytes == 0 {
            1.0
        } else {
            uncompressed_bytes as f64 / total_bytes as f64
        };

        Self {
            total_vectors,
            total_bytes,
            by_tier: Tier::ALL.into_iter().zip(usage).collect(),
            uncompressed_bytes,
            bytes_saved: uncompressed_bytes.saturating_sub(total_bytes),
            compression_ratio,
        }
    }
}

/// Vector count per tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDistribution {
    pub hot: usize,
    pub warm: usize,
    pub cool: usize,
    pub cold: usize,
    pub frozen: usize,
}

impl TierDistribution {
    pub fn get(&self, tier: Tier) -> usize {
        match tier {
            Tier::Hot => self.hot,
            Tier::Warm => self.warm,
            Tier::Cool => self.cool,
            Tier::Cold => self.cold,
            Tier::Frozen => self.frozen,
        }
    }

    pub(crate) fn increment(&mut self, tier: Tier) {
        let slot = match tier {
            Tier::Hot => &mut self.hot,
            Tier::Warm => &mut self.warm,
            Tier::Cool => &mut self.cool,
            Tier::Cold => &mut self.cold,
            Tier::Frozen => &mut self.frozen,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        Tier::ALL.iter().map(|&tier| self.get(tier)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let stats = MemoryStats::from_usage([TierUsage::default(); Tier::COUNT], 1536);
        assert_eq!(stats.total_vectors, 0);
        assert_eq!(stats.total_bytes, 0);
        assert_eq!(stats.bytes_saved, 0);
        assert_eq!(stats.compression_ratio, 1.0);
        assert_eq!(stats.by_tier.len(), Tier::COUNT);
    }

    #[test]
    fn test_mixed_usage() {
        let mut usage = [TierUsage::default(); Tier::COUNT];
        usage[Tier::Hot.index()] = TierUsage { count: 1, bytes: 6144 };
        usage[Tier::Cold.index()] = TierUsage { count: 1, bytes: 96 };

        let stats = MemoryStats::from_usage(usage, 1536);
        assert_eq!(stats.total_vectors, 2);
        assert_eq!(stats.total_bytes, 6240);
        assert_eq!(stats.uncompressed_bytes, 12_288);
        assert_eq!(stats.bytes_saved, 6048);
        assert!((stats.compression_ratio - 12_288.0 / 6240.0).abs() < 1e-12);
        assert_eq!(stats.by_tier[&Tier::Cold].count, 1);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = MemoryStats::from_usage([TierUsage::default(); Tier::COUNT], 8);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["by_tier"]["frozen"]["count"], 0);
    }

    #[test]
    fn test_distribution() {
        let mut dist = TierDistribution::default();
        dist.increment(Tier::Warm);
        dist.increment(Tier::Warm);
        dist.increment(Tier::Frozen);

        assert_eq!(dist.get(Tier::Warm), 2);
        assert_eq!(dist.frozen, 1);
        assert_eq!(dist.total(), 3);
    }
}
