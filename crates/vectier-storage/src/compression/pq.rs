//! Product quantization (cool and cold tiers)
//!
//! A vector is split into `num_subvectors` contiguous chunks of equal width.
//! Each chunk is replaced by the index of its nearest centroid in a
//! per-subvector codebook trained with k-means.
//!
//! - PQ8: up to 256 centroids, one byte per subvector
//! - PQ4: up to 16 centroids, two 4-bit indices per byte (low nibble first)

use crate::error::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use vectier_core::CoreError;

/// Maximum centroids addressable by a PQ8 code.
pub const PQ8_MAX_CENTROIDS: usize = 256;

/// Maximum centroids addressable by a PQ4 code.
pub const PQ4_MAX_CENTROIDS: usize = 16;

/// Trained product-quantization codebook.
///
/// Centroids are stored flat in `[subvector][centroid][component]` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PqCodebook {
    num_subvectors: usize,
    num_centroids: usize,
    sub_dim: usize,
    centroids: Vec<f32>,
    training_size: usize,
}

impl PqCodebook {
    /// Builds a codebook from explicit centroids.
    ///
    /// # Errors
    ///
    /// Returns an error if the centroid buffer does not match the geometry.
    pub fn from_centroids(
        num_subvectors: usize,
        num_centroids: usize,
        sub_dim: usize,
        centroids: Vec<f32>,
        training_size: usize,
    ) -> Result<Self> {
        let codebook = Self {
            num_subvectors,
            num_centroids,
            sub_dim,
            centroids,
            training_size,
        };
        codebook.validate()?;
        Ok(codebook)
    }

    pub fn num_subvectors(&self) -> usize {
        self.num_subvectors
    }

    pub fn num_centroids(&self) -> usize {
        self.num_centroids
    }

    pub fn sub_dim(&self) -> usize {
        self.sub_dim
    }

    /// Number of vectors the codebook was trained on.
    pub fn training_size(&self) -> usize {
        self.training_size
    }

    /// Full vector dimension this codebook encodes.
    pub fn dimension(&self) -> usize {
        self.num_subvectors * self.sub_dim
    }

    /// Centroid `centroid` of subvector slot `subvector`.
    pub fn centroid(&self, subvector: usize, centroid: usize) -> &[f32] {
        let start = (subvector * self.num_centroids + centroid) * self.sub_dim;
        &self.centroids[start..start + self.sub_dim]
    }

    fn slot(&self, subvector: usize) -> &[f32] {
        let width = self.num_centroids * self.sub_dim;
        &self.centroids[subvector * width..(subvector + 1) * width]
    }

    /// Checks internal consistency of the geometry and centroid buffer.
    ///
    /// # Errors
    ///
    /// Returns an error for zero-sized geometry, more than 256 centroids, a
    /// centroid buffer of the wrong length, or non-finite centroid values.
    pub fn validate(&self) -> Result<()> {
        if self.num_subvectors == 0 || self.sub_dim == 0 {
            return Err(CoreError::compression(
                "codebook must have at least one subvector of non-zero width",
            ));
        }
        if !(1..=PQ8_MAX_CENTROIDS).contains(&self.num_centroids) {
            return Err(CoreError::compression(format!(
                "codebook has {} centroids; expected 1..={}",
                self.num_centroids, PQ8_MAX_CENTROIDS
            )));
        }
        let expected = self.num_subvectors * self.num_centroids * self.sub_dim;
        if self.centroids.len() != expected {
            return Err(CoreError::compression(format!(
                "codebook holds {} centroid values; geometry requires {}",
                self.centroids.len(),
                expected
            )));
        }
        if self.centroids.iter().any(|value| !value.is_finite()) {
            return Err(CoreError::compression("codebook contains non-finite centroids"));
        }
        Ok(())
    }

    /// Checks that this codebook encodes vectors of exactly `dimension`.
    ///
    /// # Errors
    ///
    /// Returns an error if the subvector geometry does not cover `dimension`.
    pub fn ensure_dimension(&self, dimension: usize) -> Result<()> {
        if self.dimension() != dimension {
            return Err(CoreError::compression(format!(
                "codebook covers {} dimensions ({} subvectors x {}); manager dimension is {}",
                self.dimension(),
                self.num_subvectors,
                self.sub_dim,
                dimension
            )));
        }
        Ok(())
    }

    /// Index of the centroid nearest to `chunk` in slot `subvector`.
    fn nearest(&self, subvector: usize, chunk: &[f32]) -> usize {
        nearest_centroid(chunk, self.slot(subvector), self.sub_dim)
    }

    fn codes(&self, vector: &[f32]) -> Result<Vec<usize>> {
        if vector.len() != self.dimension() {
            return Err(CoreError::dimension_mismatch(self.dimension(), vector.len()));
        }
        Ok(vector
            .chunks_exact(self.sub_dim)
            .enumerate()
            .map(|(subvector, chunk)| self.nearest(subvector, chunk))
            .collect())
    }

    fn reconstruct(&self, codes: impl Iterator<Item = usize>) -> Result<Vec<f32>> {
        let mut out = Vec::with_capacity(self.dimension());
        for (subvector, code) in codes.enumerate() {
            if code >= self.num_centroids {
                return Err(CoreError::compression(format!(
                    "code {} at subvector {} exceeds {} centroids",
                    code, subvector, self.num_centroids
                )));
            }
            out.extend_from_slice(self.centroid(subvector, code));
        }
        Ok(out)
    }
}

/// Train a codebook with `iterations` rounds of k-means per subvector slot.
///
/// Initial centroids are a seeded shuffle of the distinct training chunks
/// (repeating cyclically when `num_centroids` exceeds them). Clusters that
/// receive no members keep their previous centroid. Slots train in parallel.
///
/// # Errors
///
/// Returns `EmptyTrainingSet` for no vectors, `DimensionMismatch` for ragged
/// input, and `Compression` when `num_subvectors` does not divide the
/// dimension or `num_centroids` is outside `1..=256`.
pub fn train_pq_codebook<V: AsRef<[f32]> + Sync>(
    vectors: &[V],
    num_subvectors: usize,
    num_centroids: usize,
    iterations: usize,
    seed: u64,
) -> Result<PqCodebook> {
    let first = vectors.first().ok_or(CoreError::EmptyTrainingSet)?;
    let dimension = first.as_ref().len();

    if let Some(ragged) = vectors.iter().find(|v| v.as_ref().len() != dimension) {
        return Err(CoreError::dimension_mismatch(dimension, ragged.as_ref().len()));
    }
    if num_subvectors == 0 || dimension == 0 || dimension % num_subvectors != 0 {
        return Err(CoreError::compression(format!(
            "dimension {} is not evenly divisible into {} subvectors",
            dimension, num_subvectors
        )));
    }
    if !(1..=PQ8_MAX_CENTROIDS).contains(&num_centroids) {
        return Err(CoreError::compression(format!(
            "num_centroids must be in 1..={}, got {}",
            PQ8_MAX_CENTROIDS, num_centroids
        )));
    }

    let sub_dim = dimension / num_subvectors;

    let slots: Vec<Vec<f32>> = (0..num_subvectors)
        .into_par_iter()
        .map(|subvector| {
            let chunks: Vec<&[f32]> = vectors
                .iter()
                .map(|v| &v.as_ref()[subvector * sub_dim..(subvector + 1) * sub_dim])
                .collect();
            kmeans(&chunks, sub_dim, num_centroids, iterations, slot_seed(seed, subvector))
        })
        .collect();

    PqCodebook::from_centroids(
        num_subvectors,
        num_centroids,
        sub_dim,
        slots.concat(),
        vectors.len(),
    )
}

fn slot_seed(seed: u64, subvector: usize) -> u64 {
    seed ^ (subvector as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn kmeans(chunks: &[&[f32]], sub_dim: usize, k: usize, iterations: usize, seed: u64) -> Vec<f32> {
    let mut order: Vec<usize> = (0..chunks.len()).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    // Seed from distinct chunks so duplicates in the sample don't collapse clusters.
    let mut seeds: Vec<&[f32]> = Vec::with_capacity(k);
    for &index in &order {
        if seeds.len() == k {
            break;
        }
        let chunk = chunks[index];
        if !seeds.iter().any(|seed| *seed == chunk) {
            seeds.push(chunk);
        }
    }

    let mut centroids = Vec::with_capacity(k * sub_dim);
    for c in 0..k {
        centroids.extend_from_slice(seeds[c % seeds.len()]);
    }

    let mut assignments = vec![usize::MAX; chunks.len()];
    let mut sums = vec![0f64; k * sub_dim];
    let mut counts = vec![0usize; k];

    for _ in 0..iterations {
        let mut changed = false;
        for (chunk, assigned) in chunks.iter().zip(assignments.iter_mut()) {
            let nearest = nearest_centroid(chunk, &centroids, sub_dim);
            if nearest != *assigned {
                *assigned = nearest;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        sums.iter_mut().for_each(|s| *s = 0.0);
        counts.iter_mut().for_each(|c| *c = 0);
        for (chunk, &assigned) in chunks.iter().zip(assignments.iter()) {
            counts[assigned] += 1;
            let sum = &mut sums[assigned * sub_dim..(assigned + 1) * sub_dim];
            for (acc, &value) in sum.iter_mut().zip(chunk.iter()) {
                *acc += f64::from(value);
            }
        }

        for (c, &count) in counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let sum = &sums[c * sub_dim..(c + 1) * sub_dim];
            let centroid = &mut centroids[c * sub_dim..(c + 1) * sub_dim];
            for (value, &acc) in centroid.iter_mut().zip(sum.iter()) {
                *value = (acc / count as f64) as f32;
            }
        }
    }

    centroids
}

/// Linear search for the nearest centroid by squared Euclidean distance.
/// Ties resolve to the lowest index.
fn nearest_centroid(chunk: &[f32], centroids: &[f32], sub_dim: usize) -> usize {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (index, centroid) in centroids.chunks_exact(sub_dim).enumerate() {
        let distance: f32 = chunk
            .iter()
            .zip(centroid.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        if distance < best_distance {
            best_distance = distance;
            best = index;
        }
    }
    best
}

/// Encode with one byte per subvector (`num_subvectors` bytes).
///
/// # Errors
///
/// Returns an error if the vector length does not match the codebook.
pub fn encode_pq8(vector: &[f32], codebook: &PqCodebook) -> Result<Vec<u8>> {
    Ok(codebook
        .codes(vector)?
        .into_iter()
        .map(|code| code as u8)
        .collect())
}

/// Encode with two 4-bit codes per byte (`ceil(num_subvectors / 2)` bytes).
///
/// Subvector `2i` lands in the low nibble of byte `i`, `2i + 1` in the high
/// nibble; an odd trailing subvector leaves the high nibble zero.
///
/// # Errors
///
/// Returns an error if the codebook has more than 16 centroids or the vector
/// length does not match.
pub fn encode_pq4(vector: &[f32], codebook: &PqCodebook) -> Result<Vec<u8>> {
    if codebook.num_centroids() > PQ4_MAX_CENTROIDS {
        return Err(CoreError::compression(format!(
            "PQ4 requires at most {} centroids, codebook has {}",
            PQ4_MAX_CENTROIDS,
            codebook.num_centroids()
        )));
    }

    let codes = codebook.codes(vector)?;
    Ok(codes
        .chunks(2)
        .map(|pair| {
            let low = pair[0] as u8;
            let high = pair.get(1).map_or(0, |&code| code as u8);
            low | (high << 4)
        })
        .collect())
}

/// Reconstruct from PQ8 codes.
///
/// # Errors
///
/// Returns an error if the code count does not match the codebook or a code
/// addresses a missing centroid.
pub fn decode_pq8(codes: &[u8], codebook: &PqCodebook) -> Result<Vec<f32>> {
    if codes.len() != codebook.num_subvectors() {
        return Err(CoreError::dimension_mismatch(
            codebook.num_subvectors(),
            codes.len(),
        ));
    }
    codebook.reconstruct(codes.iter().map(|&code| usize::from(code)))
}

/// Reconstruct from packed PQ4 codes.
///
/// # Errors
///
/// Returns an error if the byte count does not match the codebook or a code
/// addresses a missing centroid.
pub fn decode_pq4(packed: &[u8], codebook: &PqCodebook) -> Result<Vec<f32>> {
    let expected = pq4_len(codebook.num_subvectors());
    if packed.len() != expected {
        return Err(CoreError::dimension_mismatch(expected, packed.len()));
    }
    let codes = packed
        .iter()
        .flat_map(|&byte| [usize::from(byte & 0x0F), usize::from(byte >> 4)])
        .take(codebook.num_subvectors());
    codebook.reconstruct(codes)
}

/// Packed PQ4 length for `num_subvectors` codes.
pub fn pq4_len(num_subvectors: usize) -> usize {
    (num_subvectors + 1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn random_vectors(count: usize, dimension: usize, seed: u64) -> Vec<Vec<f32>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| (0..dimension).map(|_| rng.gen_range(-1.0..1.0)).collect())
            .collect()
    }

    /// Vectors drawn from `clusters` well-separated prototypes.
    fn clustered_vectors(count: usize, dimension: usize, clusters: usize) -> Vec<Vec<f32>> {
        (0..count)
            .map(|i| {
                let cluster = (i % clusters) as f32;
                (0..dimension).map(|d| cluster * 10.0 + d as f32 * 0.01).collect()
            })
            .collect()
    }

    #[test]
    fn test_train_empty_fails() {
        let empty: Vec<Vec<f32>> = Vec::new();
        let err = train_pq_codebook(&empty, 4, 16, 5, 42).unwrap_err();
        assert!(matches!(err, CoreError::EmptyTrainingSet));
    }

    #[test]
    fn test_train_indivisible_fails() {
        let vectors = random_vectors(10, 10, 1);
        let err = train_pq_codebook(&vectors, 3, 4, 5, 42).unwrap_err();
        assert!(err.is_compression_error());
    }

    #[test]
    fn test_train_ragged_fails() {
        let vectors = vec![vec![0.0; 8], vec![0.0; 6]];
        let err = train_pq_codebook(&vectors, 2, 2, 5, 42).unwrap_err();
        assert!(matches!(err, CoreError::DimensionMismatch { expected: 8, actual: 6 }));
    }

    #[test]
    fn test_codebook_geometry() {
        let vectors = random_vectors(50, 32, 7);
        let codebook = train_pq_codebook(&vectors, 8, 16, 5, 42).unwrap();

        assert_eq!(codebook.num_subvectors(), 8);
        assert_eq!(codebook.num_centroids(), 16);
        assert_eq!(codebook.sub_dim(), 4);
        assert_eq!(codebook.dimension(), 32);
        assert_eq!(codebook.training_size(), 50);
        assert!(codebook.validate().is_ok());
    }

    #[test]
    fn test_training_is_deterministic() {
        let vectors = random_vectors(40, 16, 3);
        let a = train_pq_codebook(&vectors, 4, 8, 10, 99).unwrap();
        let b = train_pq_codebook(&vectors, 4, 8, 10, 99).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_clustered_data_reconstructs_exactly() {
        let vectors = clustered_vectors(40, 16, 4);
        let codebook = train_pq_codebook(&vectors, 4, 4, 10, 42).unwrap();

        for vector in &vectors {
            let decoded = decode_pq8(&encode_pq8(vector, &codebook).unwrap(), &codebook).unwrap();
            for (a, b) in vector.iter().zip(decoded.iter()) {
                assert!((a - b).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_more_centroids_than_samples_keeps_samples() {
        let vectors = random_vectors(10, 8, 5);
        let codebook = train_pq_codebook(&vectors, 2, 32, 5, 42).unwrap();

        for vector in &vectors {
            let decoded = decode_pq8(&encode_pq8(vector, &codebook).unwrap(), &codebook).unwrap();
            assert_eq!(&decoded, vector);
        }
    }

    #[test]
    fn test_pq8_length() {
        let vectors = random_vectors(30, 24, 11);
        let codebook = train_pq_codebook(&vectors, 6, 8, 5, 42).unwrap();
        assert_eq!(encode_pq8(&vectors[0], &codebook).unwrap().len(), 6);
    }

    #[test]
    fn test_pq4_packing_layout() {
        // One centroid per code value: centroid c of every slot is [c]
        let centroids: Vec<f32> = (0..3).flat_map(|_| (0..16).map(|c| c as f32)).collect();
        let codebook = PqCodebook::from_centroids(3, 16, 1, centroids, 0).unwrap();

        let packed = encode_pq4(&[5.0, 12.0, 7.0], &codebook).unwrap();
        assert_eq!(packed, vec![0xC5, 0x07]);
        assert_eq!(decode_pq4(&packed, &codebook).unwrap(), vec![5.0, 12.0, 7.0]);
    }

    #[test]
    fn test_pq4_rejects_large_codebook() {
        let vectors = random_vectors(30, 8, 13);
        let codebook = train_pq_codebook(&vectors, 2, 32, 2, 42).unwrap();
        assert!(encode_pq4(&vectors[0], &codebook).is_err());
    }

    #[test]
    fn test_encode_wrong_dimension_fails() {
        let vectors = random_vectors(20, 16, 17);
        let codebook = train_pq_codebook(&vectors, 4, 4, 3, 42).unwrap();
        let err = encode_pq8(&[0.0; 12], &codebook).unwrap_err();
        assert!(matches!(err, CoreError::DimensionMismatch { expected: 16, actual: 12 }));
        assert!(codebook.ensure_dimension(12).is_err());
        assert!(codebook.ensure_dimension(16).is_ok());
    }

    #[test]
    fn test_decode_corrupt_codes_fails() {
        let vectors = random_vectors(20, 16, 19);
        let codebook = train_pq_codebook(&vectors, 4, 4, 3, 42).unwrap();

        assert!(decode_pq8(&[0, 1, 2], &codebook).is_err());
        assert!(decode_pq8(&[0, 1, 2, 200], &codebook).is_err());
        assert!(decode_pq4(&[0x00], &codebook).is_err());
    }

    #[test]
    fn test_from_centroids_validates() {
        assert!(PqCodebook::from_centroids(2, 4, 2, vec![0.0; 15], 0).is_err());
        assert!(PqCodebook::from_centroids(2, 4, 2, vec![0.0; 16], 0).is_ok());
        assert!(PqCodebook::from_centroids(2, 4, 2, vec![f32::NAN; 16], 0).is_err());
    }
}
