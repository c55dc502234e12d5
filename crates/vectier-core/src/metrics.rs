//! Central metrics registry and metric definitions
//!
//! Prometheus metrics for the tiering engine, registered lazily on first
//! access using once_cell::Lazy.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};

// ===== Tier Metrics =====

/// Total number of tier transitions by source and target tier
pub static TIER_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "vectier_tier_transitions_total",
        "Total number of vector tier transitions",
        &["from", "to"]
    )
    .expect("Failed to register tier transitions counter")
});

/// Vectors moved by heat-driven transition checks
pub static TRANSITION_CHECK_MOVED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "vectier_transition_check_moved_total",
        "Total number of vectors moved by transition checks"
    )
    .expect("Failed to register transition check counter")
});

// ===== Vector Operation Metrics =====

/// Total number of store/retrieve/delete operations
pub static VECTOR_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "vectier_vector_operations_total",
        "Total number of vector operations",
        &["operation"]
    )
    .expect("Failed to register vector operations counter")
});

// ===== Training Metrics =====

/// Codebook training duration histogram
pub static CODEBOOK_TRAINING_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "vectier_codebook_training_duration_seconds",
        "Codebook training duration in seconds",
        &["codec"],
        // Buckets: 10ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s, 30s, 60s
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("Failed to register codebook training histogram")
});
