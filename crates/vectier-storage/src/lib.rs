//! Tiered vector compression engine: per-tier codecs and the
//! heat-driven `CompressionManager`.

pub mod compression;
pub mod error;
pub mod tiering_manager;

pub use compression::{CodecContext, EncodedVector};
pub use error::{Error, Result};
pub use tiering_manager::{
    AccessRecord, CodebookSet, CompressionManager, MemoryStats, SharedCompressionManager,
    TierConfig, TierDistribution, TierPolicy,
};
