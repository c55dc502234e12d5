use super::policy::TierPolicy;
use super::stats::{MemoryStats, TierDistribution, TierUsage};
use super::tracker::{AccessRecord, AccessTracker, Clock, SystemClock};
use crate::compression::{
    train_binary_thresholds, train_pq_codebook, BinaryThresholds, CodecContext, EncodedVector,
    PqCodebook, PQ4_MAX_CENTROIDS,
};
use crate::error::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use vectier_core::metrics::{
    CODEBOOK_TRAINING_DURATION, TIER_TRANSITIONS, TRANSITION_CHECK_MOVED, VECTOR_OPERATIONS,
};
use vectier_core::{CompressionConfig, CoreError, Tier, VectorId};

/// Emit at info when the manager is verbose, debug otherwise.
macro_rules! verbose_event {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

/// Manager behind an external mutex for multi-threaded callers.
pub type SharedCompressionManager = Arc<Mutex<CompressionManager>>;

/// Trained codecs for the cool, cold and frozen tiers.
///
/// Serializable so a persistence layer can save and restore training
/// results with `export_codebooks` / `import_codebooks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodebookSet {
    pub pq8: Option<PqCodebook>,
    pub pq4: Option<PqCodebook>,
    pub binary: Option<BinaryThresholds>,
}

impl CodebookSet {
    /// Codec context over these codebooks.
    pub fn context(&self, dimension: usize) -> CodecContext<'_> {
        CodecContext {
            dimension,
            pq8: self.pq8.as_ref(),
            pq4: self.pq4.as_ref(),
            binary: self.binary.as_ref(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.pq8.is_some() && self.pq4.is_some() && self.binary.is_some()
    }

    fn provides(&self, tier: Tier) -> bool {
        tier.requires_training() && self.context(0).has_trained_codec(tier)
    }

    /// Check every present codec against the manager geometry.
    fn validate(&self, dimension: usize, num_subvectors: usize) -> Result<()> {
        for (name, codebook) in [("pq8", &self.pq8), ("pq4", &self.pq4)] {
            let Some(codebook) = codebook else { continue };
            codebook.validate()?;
            codebook.ensure_dimension(dimension)?;
            if codebook.num_subvectors() != num_subvectors {
                return Err(CoreError::compression(format!(
                    "{} codebook has {} subvectors; manager uses {}",
                    name,
                    codebook.num_subvectors(),
                    num_subvectors
                )));
            }
        }

        if let Some(pq4) = &self.pq4 {
            if pq4.num_centroids() > PQ4_MAX_CENTROIDS {
                return Err(CoreError::compression(format!(
                    "pq4 codebook has {} centroids; 4-bit codes allow at most {}",
                    pq4.num_centroids(),
                    PQ4_MAX_CENTROIDS
                )));
            }
        }

        if let Some(binary) = &self.binary {
            binary.validate()?;
            binary.ensure_dimension(dimension)?;
        }

        Ok(())
    }
}

/// Tiered compression manager
///
/// Stores fixed-dimension vectors, tracks per-vector heat, and moves
/// vectors forward through progressively smaller encodings:
/// - Hot: raw `f32` (lossless)
/// - Warm: half precision
/// - Cool / Cold: 8-bit / 4-bit product quantization (needs training)
/// - Frozen: binary quantization (needs training)
///
/// Transitions only ever move forward. Each one decodes the current
/// representation and re-encodes it for the target tier, so error
/// accumulates across hops.
///
/// Every operation either applies fully or leaves state unchanged. The
/// manager has no internal lock; wrap it with [`CompressionManager::into_shared`]
/// when several threads need it.
///
/// # Example
///
/// ```
/// use vectier_core::{CompressionConfig, Tier};
/// use vectier_storage::tiering_manager::CompressionManager;
///
/// # fn example() -> vectier_core::CoreResult<()> {
/// let mut manager = CompressionManager::new(CompressionConfig::with_dimension(4))?;
/// manager.store("doc-1", &[0.1, 0.2, 0.3, 0.4])?;
/// manager.transition_tier("doc-1", Tier::Warm)?;
///
/// assert_eq!(manager.get_tier("doc-1"), Some(Tier::Warm));
/// assert_eq!(manager.retrieve("doc-1")?.map(|v| v.len()), Some(4));
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug)]
pub struct CompressionManager {
    config: CompressionConfig,
    policy: TierPolicy,
    vectors: HashMap<VectorId, EncodedVector>,
    tracker: AccessTracker,
    training_buffer: VecDeque<Vec<f32>>,
    codebooks: CodebookSet,
    clock: Arc<dyn Clock>,
}

impl CompressionManager {
    /// Create a manager using the system clock.
    ///
    /// # Errors
    ///
    /// Returns error if config validation fails
    pub fn new(config: CompressionConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a manager with an explicit time source.
    ///
    /// # Errors
    ///
    /// Returns error if config validation fails
    pub fn with_clock(config: CompressionConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let policy = TierPolicy::from_config(&config)?;

        tracing::debug!(
            dimension = config.dimension,
            num_subvectors = policy.num_subvectors(),
            auto_transition = config.auto_transition,
            "Created compression manager"
        );

        Ok(Self {
            config,
            policy,
            vectors: HashMap::new(),
            tracker: AccessTracker::new(),
            training_buffer: VecDeque::new(),
            codebooks: CodebookSet::default(),
            clock,
        })
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    pub fn policy(&self) -> &TierPolicy {
        &self.policy
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Wrap in `Arc<Mutex<_>>` for shared use.
    pub fn into_shared(self) -> SharedCompressionManager {
        Arc::new(Mutex::new(self))
    }

    /// Store a vector in the hot tier.
    ///
    /// Overwrites any existing vector under `id` and resets its access
    /// record. The vector is also queued for codebook training.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` if `vector.len() != dimension`
    /// - `Compression` if any component is NaN or infinite
    ///
    /// Nothing is written on error.
    pub fn store(&mut self, id: impl Into<VectorId>, vector: &[f32]) -> Result<()> {
        let id = id.into();
        let ctx = CodecContext::untrained(self.config.dimension);
        let encoded = EncodedVector::encode(Tier::Hot, vector, &ctx)?;
        if let Some(position) = vector.iter().position(|value| !value.is_finite()) {
            return Err(CoreError::compression(format!(
                "component {} of vector {} is not finite",
                position, id
            )));
        }

        self.vectors.insert(id.clone(), encoded);
        self.tracker.record_store(id.clone(), self.clock.now());

        if self.training_buffer.len() >= self.config.max_training_samples {
            self.training_buffer.pop_front();
        }
        self.training_buffer.push_back(vector.to_vec());

        VECTOR_OPERATIONS.with_label_values(&["store"]).inc();
        tracing::trace!(vector_id = %id, "Stored vector");
        Ok(())
    }

    /// Decode a vector and record the access.
    ///
    /// Returns `Ok(None)` for unknown ids. Each hit increments the access
    /// counter and boosts heat.
    ///
    /// # Errors
    ///
    /// Returns error if the stored bytes cannot be decoded
    pub fn retrieve(&mut self, id: &str) -> Result<Option<Vec<f32>>> {
        let Some(encoded) = self.vectors.get(id) else {
            return Ok(None);
        };
        let decoded = encoded.decode(&self.codebooks.context(self.config.dimension))?;

        self.tracker
            .record_access(id, self.clock.now(), self.config.heat.access_boost);

        VECTOR_OPERATIONS.with_label_values(&["retrieve"]).inc();
        Ok(Some(decoded))
    }

    /// Retrieve several vectors, skipping unknown ids.
    ///
    /// # Errors
    ///
    /// Returns error if any stored vector cannot be decoded; no access is
    /// recorded in that case.
    pub fn retrieve_many<I, S>(&mut self, ids: I) -> Result<Vec<(VectorId, Vec<f32>)>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ctx = self.codebooks.context(self.config.dimension);
        let mut found = Vec::new();
        for id in ids {
            if let Some((key, encoded)) = self.vectors.get_key_value(id.as_ref()) {
                found.push((key.clone(), encoded.decode(&ctx)?));
            }
        }

        let now = self.clock.now();
        for (id, _) in &found {
            self.tracker
                .record_access(id.as_str(), now, self.config.heat.access_boost);
        }

        VECTOR_OPERATIONS
            .with_label_values(&["retrieve"])
            .inc_by(found.len() as u64);
        Ok(found)
    }

    pub fn has(&self, id: &str) -> bool {
        self.vectors.contains_key(id)
    }

    /// Remove a vector and its access record. Returns whether it existed.
    pub fn delete(&mut self, id: &str) -> bool {
        let removed = self.vectors.remove(id).is_some();
        self.tracker.remove(id);
        if removed {
            VECTOR_OPERATIONS.with_label_values(&["delete"]).inc();
        }
        removed
    }

    /// All stored ids, sorted.
    pub fn get_all_vector_ids(&self) -> Vec<VectorId> {
        let mut ids: Vec<VectorId> = self.vectors.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn get_tier(&self, id: &str) -> Option<Tier> {
        self.vectors.get(id).map(EncodedVector::tier)
    }

    pub fn get_access_record(&self, id: &str) -> Option<&AccessRecord> {
        self.tracker.get(id)
    }

    /// Ids currently stored in `tier`, sorted.
    pub fn get_vectors_in_tier(&self, tier: Tier) -> Vec<VectorId> {
        let mut ids: Vec<VectorId> = self
            .vectors
            .iter()
            .filter(|(_, encoded)| encoded.tier() == tier)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Move a vector to a strictly later tier.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `id` is unknown
    /// - `TierTransition` if `target` is not after the current tier
    /// - `CodebookNotTrained` if `target` needs a codec that is missing
    ///
    /// State is unchanged on error.
    pub fn transition_tier(&mut self, id: &str, target: Tier) -> Result<()> {
        let (from, encoded) = self.reencode(id, target)?;
        self.commit_transition(id, from, encoded);
        Ok(())
    }

    /// Decode `id` and encode it for `target` without touching state.
    fn reencode(&self, id: &str, target: Tier) -> Result<(Tier, EncodedVector)> {
        let current = self
            .vectors
            .get(id)
            .ok_or_else(|| CoreError::not_found("vector", id))?;
        let from = current.tier();

        if !TierPolicy::is_valid_transition(from, target) {
            return Err(CoreError::TierTransition { from, to: target });
        }

        let ctx = self.codebooks.context(self.config.dimension);
        if !ctx.is_ready(target) {
            return Err(CoreError::CodebookNotTrained { tier: target });
        }

        let decoded = current.decode(&ctx)?;
        let encoded = EncodedVector::encode(target, &decoded, &ctx)?;
        Ok((from, encoded))
    }

    fn commit_transition(&mut self, id: &str, from: Tier, encoded: EncodedVector) {
        let to = encoded.tier();
        if let Some(slot) = self.vectors.get_mut(id) {
            *slot = encoded;
        }
        self.tracker.set_tier(id, to);

        TIER_TRANSITIONS
            .with_label_values(&[from.as_str(), to.as_str()])
            .inc();
        verbose_event!(
            self.config.verbose,
            vector_id = %id,
            from = %from,
            to = %to,
            "Transitioned vector"
        );
    }

    /// Move every vector whose heat recommends a later tier.
    ///
    /// The target is clamped to the furthest tier whose codec is trained,
    /// so untrained codecs hold vectors back instead of failing. Vectors
    /// are never moved to an earlier tier. Returns how many moved.
    ///
    /// # Errors
    ///
    /// Returns error if a stored vector fails to re-encode; nothing moves
    /// in that case.
    pub fn check_transitions(&mut self) -> Result<usize> {
        let ctx = self.codebooks.context(self.config.dimension);

        let mut planned = Vec::new();
        for record in self.tracker.iter() {
            let Some(encoded) = self.vectors.get(record.vector_id.as_str()) else {
                continue;
            };
            let current = encoded.tier();
            let recommended = self.policy.tier_for_heat_score(record.heat_score);
            if recommended <= current {
                continue;
            }

            let ready = Tier::ALL[current.index() + 1..=recommended.index()]
                .iter()
                .rev()
                .copied()
                .find(|&tier| ctx.is_ready(tier));
            if let Some(target) = ready {
                planned.push((record.vector_id.clone(), target));
            }
        }

        let mut staged = Vec::with_capacity(planned.len());
        for (id, target) in planned {
            let (from, encoded) = self.reencode(id.as_str(), target)?;
            staged.push((id, from, encoded));
        }

        let moved = staged.len();
        for (id, from, encoded) in staged {
            self.commit_transition(id.as_str(), from, encoded);
        }

        TRANSITION_CHECK_MOVED.inc_by(moved as u64);
        verbose_event!(self.config.verbose, moved, "Transition check complete");
        Ok(moved)
    }

    /// Apply time-based heat decay to every record.
    ///
    /// With `auto_transition` enabled this runs [`Self::check_transitions`]
    /// afterwards and returns how many vectors moved; otherwise returns 0.
    ///
    /// # Errors
    ///
    /// Returns error only from the automatic transition check
    pub fn decay_heat_scores(&mut self) -> Result<usize> {
        let decayed = self
            .tracker
            .decay_all(self.clock.now(), self.config.heat.half_life_hours);
        tracing::debug!(decayed, "Decayed heat scores");

        if self.config.auto_transition {
            return self.check_transitions();
        }
        Ok(0)
    }

    /// Train every codec from the internal buffer.
    ///
    /// Returns `false` without training while the buffer holds fewer than
    /// `min_training_samples` vectors.
    ///
    /// # Errors
    ///
    /// Returns error if training fails; existing codebooks are kept
    pub fn train_codebooks(&mut self) -> Result<bool> {
        if self.training_buffer.len() < self.config.min_training_samples {
            tracing::debug!(
                buffered = self.training_buffer.len(),
                required = self.config.min_training_samples,
                "Skipping codebook training: not enough samples"
            );
            return Ok(false);
        }

        let samples = self.training_buffer.make_contiguous();
        let trained = train_codebook_set(&self.config, samples)?;
        self.install_codebooks(trained)?;
        Ok(true)
    }

    /// Train every codec from an explicit sample, ignoring the buffer gate.
    ///
    /// # Errors
    ///
    /// - `EmptyTrainingSet` for an empty sample
    /// - `DimensionMismatch` for a vector of the wrong length
    pub fn force_train_codebooks<V: AsRef<[f32]> + Sync>(&mut self, vectors: &[V]) -> Result<()> {
        if vectors.is_empty() {
            return Err(CoreError::EmptyTrainingSet);
        }
        if let Some(bad) = vectors
            .iter()
            .find(|v| v.as_ref().len() != self.config.dimension)
        {
            return Err(CoreError::dimension_mismatch(
                self.config.dimension,
                bad.as_ref().len(),
            ));
        }

        let trained = train_codebook_set(&self.config, vectors)?;
        self.install_codebooks(trained)
    }

    /// True once PQ8, PQ4 and binary codecs are all trained.
    pub fn are_codebooks_trained(&self) -> bool {
        self.codebooks.is_complete()
    }

    /// Copy of the trained codecs.
    pub fn export_codebooks(&self) -> CodebookSet {
        self.codebooks.clone()
    }

    /// Install previously exported codecs.
    ///
    /// Codecs absent from `set` are kept.
    ///
    /// # Errors
    ///
    /// Returns a compression error if any codec does not match this
    /// manager's geometry; nothing changes in that case.
    pub fn import_codebooks(&mut self, set: CodebookSet) -> Result<()> {
        set.validate(self.config.dimension, self.policy.num_subvectors())?;
        self.install_codebooks(set)
    }

    /// Swap in new codecs, re-encoding vectors already held in the tiers
    /// they replace. Either everything is swapped or nothing is.
    fn install_codebooks(&mut self, incoming: CodebookSet) -> Result<()> {
        let dimension = self.config.dimension;
        let replaced: Vec<Tier> = Tier::ALL
            .into_iter()
            .filter(|&tier| incoming.provides(tier))
            .collect();

        let merged = CodebookSet {
            pq8: incoming.pq8.or_else(|| self.codebooks.pq8.clone()),
            pq4: incoming.pq4.or_else(|| self.codebooks.pq4.clone()),
            binary: incoming.binary.or_else(|| self.codebooks.binary.clone()),
        };

        let old_ctx = self.codebooks.context(dimension);
        let new_ctx = merged.context(dimension);
        let mut reencoded = Vec::new();
        for (id, encoded) in &self.vectors {
            if replaced.contains(&encoded.tier()) {
                let decoded = encoded.decode(&old_ctx)?;
                let fresh = EncodedVector::encode(encoded.tier(), &decoded, &new_ctx)?;
                reencoded.push((id.clone(), fresh));
            }
        }

        self.codebooks = merged;
        let count = reencoded.len();
        for (id, encoded) in reencoded {
            self.vectors.insert(id, encoded);
        }

        verbose_event!(
            self.config.verbose,
            replaced = ?replaced,
            reencoded = count,
            "Installed codebooks"
        );
        Ok(())
    }

    /// Vectors currently queued for training.
    pub fn training_buffer_len(&self) -> usize {
        self.training_buffer.len()
    }

    /// Memory accounting across tiers.
    pub fn get_memory_stats(&self) -> MemoryStats {
        let mut usage = [TierUsage::default(); Tier::COUNT];
        for encoded in self.vectors.values() {
            let slot = &mut usage[encoded.tier().index()];
            slot.count += 1;
            slot.bytes += encoded.len() as u64;
        }
        MemoryStats::from_usage(usage, self.config.dimension)
    }

    pub fn get_tier_distribution(&self) -> TierDistribution {
        let mut distribution = TierDistribution::default();
        for encoded in self.vectors.values() {
            distribution.increment(encoded.tier());
        }
        distribution
    }

    /// Drop all vectors, records, buffered samples and codecs.
    pub fn clear(&mut self) {
        let dropped = self.vectors.len();
        self.vectors.clear();
        self.tracker.clear();
        self.training_buffer.clear();
        self.codebooks = CodebookSet::default();
        tracing::debug!(dropped, "Cleared compression manager");
    }

    /// Release everything and consume the manager.
    pub fn dispose(mut self) {
        self.clear();
    }
}

/// Train PQ8, PQ4 and binary codecs on the same sample in parallel.
fn train_codebook_set<V: AsRef<[f32]> + Sync>(
    config: &CompressionConfig,
    samples: &[V],
) -> Result<CodebookSet> {
    let num_subvectors = config.num_subvectors();

    let (pq8, (pq4, binary)) = rayon::join(
        || {
            timed_training(config, "pq8", samples.len(), || {
                train_pq_codebook(
                    samples,
                    num_subvectors,
                    config.pq8_centroids,
                    config.pq_iterations,
                    config.training_seed,
                )
            })
        },
        || {
            rayon::join(
                || {
                    timed_training(config, "pq4", samples.len(), || {
                        train_pq_codebook(
                            samples,
                            num_subvectors,
                            config.pq4_centroids,
                            config.pq_iterations,
                            config.training_seed,
                        )
                    })
                },
                || {
                    timed_training(config, "binary", samples.len(), || {
                        train_binary_thresholds(samples)
                    })
                },
            )
        },
    );

    Ok(CodebookSet {
        pq8: Some(pq8?),
        pq4: Some(pq4?),
        binary: Some(binary?),
    })
}

fn timed_training<T>(
    config: &CompressionConfig,
    codec: &'static str,
    samples: usize,
    train: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let start = Instant::now();
    let result = train();
    let elapsed = start.elapsed();

    CODEBOOK_TRAINING_DURATION
        .with_label_values(&[codec])
        .observe(elapsed.as_secs_f64());

    match &result {
        Ok(_) => verbose_event!(
            config.verbose,
            codec,
            samples,
            duration_ms = elapsed.as_millis() as u64,
            "Trained codec"
        ),
        Err(e) => tracing::warn!(codec, samples, error = %e, "Codec training failed"),
    }
    result
}
