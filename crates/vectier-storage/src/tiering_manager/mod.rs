//! Heat-driven tiered compression
//!
//! Vectors start hot and move forward as their heat score decays:
//! - **Hot**: raw `f32`, lossless, 4 bytes per dimension
//! - **Warm**: half precision, 2 bytes per dimension
//! - **Cool**: 8-bit product quantization, 1 byte per subvector
//! - **Cold**: 4-bit product quantization, half a byte per subvector
//! - **Frozen**: binary quantization, 1 bit per dimension
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   CompressionManager                     │
//! │                                                          │
//! │  store() ──► Hot bytes + AccessRecord + training buffer  │
//! │  retrieve() ──► decode(tier) + AccessTracker boost       │
//! │                         │                                │
//! │   decay_heat_scores() ──► AccessTracker (half-life)      │
//! │                         │                                │
//! │   check_transitions() ──► TierPolicy (heat → tier)       │
//! │                         │                                │
//! │      transition_tier() ──► decode → re-encode (codecs)   │
//! │                         │                                │
//! │   train_codebooks() ──► PQ8 / PQ4 / binary (rayon)       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use vectier_core::{CompressionConfig, Tier};
//! use vectier_storage::tiering_manager::CompressionManager;
//!
//! # fn example() -> vectier_core::CoreResult<()> {
//! let config = CompressionConfig {
//!     dimension: 16,
//!     pq_subvectors: Some(4),
//!     pq8_centroids: 8,
//!     pq4_centroids: 4,
//!     ..CompressionConfig::default()
//! };
//! let mut manager = CompressionManager::new(config)?;
//!
//! let training: Vec<Vec<f32>> = (0..32).map(|i| vec![i as f32 / 32.0; 16]).collect();
//! manager.force_train_codebooks(&training)?;
//!
//! manager.store("doc-1", &training[3])?;
//! manager.transition_tier("doc-1", Tier::Cool)?;
//! assert_eq!(manager.get_memory_stats().total_bytes, 4);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod manager;
mod policy;
mod stats;
mod tracker;

pub use manager::{CodebookSet, CompressionManager, SharedCompressionManager};
pub use policy::{TierConfig, TierPolicy};
pub use stats::{MemoryStats, TierDistribution, TierUsage};
pub use tracker::{AccessRecord, AccessTracker, Clock, ManualClock, SystemClock};
