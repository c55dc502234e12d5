//! Shared fixtures for the vectier criterion benchmarks.

use once_cell::sync::OnceCell;
use rand::{rngs::StdRng, Rng, SeedableRng};
use vectier_core::{telemetry, CompressionConfig};
use vectier_storage::tiering_manager::CompressionManager;

/// Production embedding width.
pub const DEFAULT_DIMENSION: usize = 1536;

/// Vectors used to train codebooks in benchmark fixtures.
pub const TRAINING_SAMPLES: usize = 256;

/// Generate `count` vectors with components in [-1, 1).
///
/// Seeded so runs are comparable.
pub fn generate_random_vectors(count: usize, dim: usize) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    (0..count)
        .map(|_| (0..dim).map(|_| rng.gen_range(-1.0f32..1.0)).collect())
        .collect()
}

/// Training set shared across benchmark groups.
pub fn training_vectors() -> &'static [Vec<f32>] {
    static TRAINING: OnceCell<Vec<Vec<f32>>> = OnceCell::new();
    TRAINING.get_or_init(|| generate_random_vectors(TRAINING_SAMPLES, DEFAULT_DIMENSION))
}

/// Manager at the default geometry with every codec trained.
pub fn trained_manager() -> CompressionManager {
    // Quiet unless RUST_LOG says otherwise
    telemetry::init_tracing(false);

    let mut manager = CompressionManager::new(CompressionConfig::default())
        .unwrap_or_else(|e| panic!("default config must be valid: {}", e));
    manager
        .force_train_codebooks(training_vectors())
        .unwrap_or_else(|e| panic!("training benchmark codebooks failed: {}", e));
    manager
}
