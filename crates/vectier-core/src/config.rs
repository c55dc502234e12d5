//! Configuration management for vectier
//!
//! Supports layered loading:
//! - YAML/TOML/JSON configuration files
//! - Environment variable overrides
//! - Built-in defaults
//! - Validation before use

use crate::error::{CoreError, CoreResult};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default embedding width.
pub const DEFAULT_DIMENSION: usize = 1536;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct VectierConfig {
    #[serde(default)]
    pub compression: CompressionConfig,
}

impl VectierConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Config file specified by VECTIER_CONFIG env var
    /// 3. ./config/vectier.{yaml,toml,json}
    /// 4. Hardcoded defaults (lowest priority)
    pub fn load() -> CoreResult<Self> {
        let mut builder = Self::set_defaults(Config::builder())?;

        if let Ok(config_path) = std::env::var("VECTIER_CONFIG") {
            builder = builder.add_source(File::with_name(&config_path).required(false));
        }

        builder = builder.add_source(File::with_name("./config/vectier").required(false));

        // Example: VECTIER_COMPRESSION__DIMENSION=768
        builder = builder.add_source(
            Environment::with_prefix("VECTIER")
                .separator("__")
                .try_parsing(true),
        );

        let config: VectierConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let config: VectierConfig = Self::set_defaults(Config::builder())?
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn set_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let defaults = CompressionConfig::default();
        builder
            .set_default("compression.dimension", defaults.dimension as u64)?
            .set_default("compression.auto_transition", defaults.auto_transition)?
            .set_default("compression.verbose", defaults.verbose)?
            .set_default(
                "compression.min_training_samples",
                defaults.min_training_samples as u64,
            )?
            .set_default(
                "compression.max_training_samples",
                defaults.max_training_samples as u64,
            )?
            .set_default("compression.pq8_centroids", defaults.pq8_centroids as u64)?
            .set_default("compression.pq4_centroids", defaults.pq4_centroids as u64)?
            .set_default("compression.pq_iterations", defaults.pq_iterations as u64)?
            .set_default("compression.training_seed", defaults.training_seed)?
            // Heat
            .set_default("compression.heat.half_life_hours", defaults.heat.half_life_hours)?
            .set_default("compression.heat.access_boost", defaults.heat.access_boost)?
            .set_default("compression.heat.warm_below", defaults.heat.warm_below)?
            .set_default("compression.heat.cool_below", defaults.heat.cool_below)?
            .set_default("compression.heat.cold_below", defaults.heat.cold_below)?
            .set_default("compression.heat.frozen_below", defaults.heat.frozen_below)
    }

    /// Validate configuration values
    pub fn validate(&self) -> CoreResult<()> {
        self.compression.validate()
    }
}

/// Compression manager configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompressionConfig {
    /// Fixed vector dimension for every stored vector
    pub dimension: usize,

    /// Run transition checks automatically after heat decay
    pub auto_transition: bool,

    /// Log transitions and training at info level instead of debug
    pub verbose: bool,

    /// Samples the training buffer must hold before `train_codebooks` runs
    pub min_training_samples: usize,

    /// Training buffer capacity (oldest samples are dropped first)
    pub max_training_samples: usize,

    /// PQ subvector count; must divide `dimension` (default: derived)
    #[serde(default)]
    pub pq_subvectors: Option<usize>,

    /// Centroids per subvector for 8-bit PQ (max 256)
    pub pq8_centroids: usize,

    /// Centroids per subvector for 4-bit PQ (max 16)
    pub pq4_centroids: usize,

    /// K-means rounds per subvector
    pub pq_iterations: usize,

    /// Seed for centroid initialization
    pub training_seed: u64,

    #[serde(default)]
    pub heat: HeatConfig,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            auto_transition: false,
            verbose: false,
            min_training_samples: 100,
            max_training_samples: 10_000,
            pq_subvectors: None,
            pq8_centroids: 256,
            pq4_centroids: 16,
            pq_iterations: 10,
            training_seed: 42,
            heat: HeatConfig::default(),
        }
    }
}

impl CompressionConfig {
    /// Default configuration for a given dimension
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            ..Self::default()
        }
    }

    /// Subvector count actually used for PQ
    pub fn num_subvectors(&self) -> usize {
        self.pq_subvectors
            .unwrap_or_else(|| default_num_subvectors(self.dimension))
    }

    /// Validate configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.dimension == 0 {
            return Err(CoreError::invalid_config("compression.dimension must be > 0"));
        }

        let subvectors = self.num_subvectors();
        if subvectors == 0 || self.dimension % subvectors != 0 {
            return Err(CoreError::invalid_config(format!(
                "compression.pq_subvectors ({}) must evenly divide dimension ({})",
                subvectors, self.dimension
            )));
        }

        if !(1..=256).contains(&self.pq8_centroids) {
            return Err(CoreError::invalid_config(
                "compression.pq8_centroids must be in 1..=256",
            ));
        }

        if !(1..=16).contains(&self.pq4_centroids) {
            return Err(CoreError::invalid_config(
                "compression.pq4_centroids must be in 1..=16",
            ));
        }

        if self.pq_iterations == 0 {
            return Err(CoreError::invalid_config(
                "compression.pq_iterations must be > 0",
            ));
        }

        if self.min_training_samples == 0 {
            return Err(CoreError::invalid_config(
                "compression.min_training_samples must be > 0",
            ));
        }

        if self.max_training_samples < self.min_training_samples {
            return Err(CoreError::invalid_config(
                "compression.max_training_samples must be >= min_training_samples",
            ));
        }

        self.heat.validate()
    }
}

/// Largest divisor of `dimension` that does not exceed `dimension / 8`
/// (at least 1). Gives 192 subvectors of width 8 at 1536 dimensions.
pub fn default_num_subvectors(dimension: usize) -> usize {
    let ceiling = (dimension / 8).max(1);
    (1..=ceiling)
        .rev()
        .find(|candidate| dimension % candidate == 0)
        .unwrap_or(1)
}

/// Heat score decay and tier boundaries
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HeatConfig {
    /// Hours for an idle vector's heat to halve
    pub half_life_hours: f64,

    /// Heat added on each retrieve (clamped at 1.0)
    pub access_boost: f64,

    /// Heat below which a vector is recommended for warm
    pub warm_below: f64,

    /// Heat below which a vector is recommended for cool
    pub cool_below: f64,

    /// Heat below which a vector is recommended for cold
    pub cold_below: f64,

    /// Heat below which a vector is recommended for frozen
    pub frozen_below: f64,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            half_life_hours: 24.0,
            access_boost: 0.1,
            warm_below: 0.8,
            cool_below: 0.5,
            cold_below: 0.25,
            frozen_below: 0.1,
        }
    }
}

impl HeatConfig {
    /// Tier boundaries from warm down to frozen
    pub fn boundaries(&self) -> [f64; 4] {
        [
            self.warm_below,
            self.cool_below,
            self.cold_below,
            self.frozen_below,
        ]
    }

    /// Validate configuration
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.half_life_hours.is_finite() && self.half_life_hours > 0.0) {
            return Err(CoreError::invalid_config(
                "compression.heat.half_life_hours must be > 0",
            ));
        }

        if !(0.0..=1.0).contains(&self.access_boost) {
            return Err(CoreError::invalid_config(
                "compression.heat.access_boost must be in [0, 1]",
            ));
        }

        let mut upper = 1.0;
        for boundary in self.boundaries() {
            if !(boundary > 0.0 && boundary < upper) {
                return Err(CoreError::invalid_config(
                    "compression.heat thresholds must strictly decrease within (0, 1)",
                ));
            }
            upper = boundary;
        }

        Ok(())
    }
}
