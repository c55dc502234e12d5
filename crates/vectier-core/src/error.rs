use crate::tier::Tier;
use thiserror::Error;

/// Canonical error type for compression and tiering operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity was not found.
    #[error("{entity} `{id}` was not found")]
    NotFound {
        /// Entity type name (e.g. `"vector"`).
        entity: &'static str,
        /// Identifier of the missing entity.
        id: String,
    },

    /// Vector or payload length does not match the configured dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Configured dimension (or byte length).
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// Requested transition is not strictly forward.
    #[error("invalid tier transition from {from} to {to}")]
    TierTransition {
        /// Current tier of the vector.
        from: Tier,
        /// Requested target tier.
        to: Tier,
    },

    /// Target tier needs a codebook or thresholds that have not been trained.
    #[error("codebook not trained for {tier} tier")]
    CodebookNotTrained {
        /// Tier whose codec is missing.
        tier: Tier,
    },

    /// Training was attempted without any samples.
    #[error("cannot train on an empty dataset")]
    EmptyTrainingSet,

    /// Codec failure not covered by a more specific variant.
    #[error("compression error: {message}")]
    Compression {
        /// Human-readable explanation.
        message: String,
    },

    /// Configuration failed validation.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable explanation.
        message: String,
    },

    /// Serialization error occurred.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error occurred.
    #[error("deserialization error: {0}")]
    DeserializationError(String),
}

impl CoreError {
    /// Creates a `NotFound` variant.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates a `DimensionMismatch` variant.
    #[must_use]
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Creates a `Compression` variant.
    #[must_use]
    pub fn compression(message: impl Into<String>) -> Self {
        Self::Compression {
            message: message.into(),
        }
    }

    /// Creates an `InvalidConfig` variant.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// True for the compression error family: unknown ids, wrong
    /// dimensions, untrained codecs, empty training sets and codec failures.
    ///
    /// Serde failures are not part of it.
    #[must_use]
    pub fn is_compression_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::DimensionMismatch { .. }
                | Self::CodebookNotTrained { .. }
                | Self::EmptyTrainingSet
                | Self::Compression { .. }
        )
    }

    /// True for rejected backward or same-tier transitions.
    #[must_use]
    pub fn is_transition_error(&self) -> bool {
        matches!(self, Self::TierTransition { .. })
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_eof() || err.is_syntax() {
            Self::DeserializationError(err.to_string())
        } else {
            Self::SerializationError(err.to_string())
        }
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        Self::invalid_config(err.to_string())
    }
}

/// Convenient result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
