//! Core domain types shared by the vectier tiered-compression engine.

pub mod config;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod telemetry;
pub mod tier;

pub use config::{CompressionConfig, HeatConfig, VectierConfig};
pub use error::{CoreError, CoreResult};
pub use ids::VectorId;
pub use tier::Tier;
