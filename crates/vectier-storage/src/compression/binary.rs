//! Binary quantization (frozen tier)
//!
//! One bit per dimension: set when the value exceeds that dimension's
//! trained threshold. Bits pack LSB-first, eight dimensions per byte.
//! Decoding yields `threshold + 1.0` for set bits and `threshold - 1.0`
//! otherwise, which preserves the sign pattern but not magnitudes.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use vectier_core::CoreError;

/// Per-dimension thresholds (the training mean of each dimension).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryThresholds {
    thresholds: Vec<f32>,
    training_size: usize,
}

impl BinaryThresholds {
    /// Builds thresholds from explicit values.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or non-finite threshold list.
    pub fn from_values(thresholds: Vec<f32>, training_size: usize) -> Result<Self> {
        let thresholds = Self {
            thresholds,
            training_size,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn thresholds(&self) -> &[f32] {
        &self.thresholds
    }

    pub fn dimension(&self) -> usize {
        self.thresholds.len()
    }

    /// Number of vectors the thresholds were trained on.
    pub fn training_size(&self) -> usize {
        self.training_size
    }

    /// Checks that thresholds are present and finite.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or non-finite threshold list.
    pub fn validate(&self) -> Result<()> {
        if self.thresholds.is_empty() {
            return Err(CoreError::compression("binary thresholds are empty"));
        }
        if self.thresholds.iter().any(|t| !t.is_finite()) {
            return Err(CoreError::compression("binary thresholds contain non-finite values"));
        }
        Ok(())
    }

    /// Checks that the thresholds cover exactly `dimension` values.
    ///
    /// # Errors
    ///
    /// Returns an error on a length mismatch.
    pub fn ensure_dimension(&self, dimension: usize) -> Result<()> {
        if self.dimension() != dimension {
            return Err(CoreError::compression(format!(
                "binary thresholds cover {} dimensions; manager dimension is {}",
                self.dimension(),
                dimension
            )));
        }
        Ok(())
    }
}

/// Compute the per-dimension mean of the training sample.
///
/// # Errors
///
/// Returns `EmptyTrainingSet` for no vectors and `DimensionMismatch` for
/// ragged input.
pub fn train_binary_thresholds<V: AsRef<[f32]>>(vectors: &[V]) -> Result<BinaryThresholds> {
    let first = vectors.first().ok_or(CoreError::EmptyTrainingSet)?;
    let dimension = first.as_ref().len();
    if dimension == 0 {
        return Err(CoreError::compression("cannot train thresholds on zero-length vectors"));
    }

    let mut sums = vec![0f64; dimension];
    for vector in vectors {
        let vector = vector.as_ref();
        if vector.len() != dimension {
            return Err(CoreError::dimension_mismatch(dimension, vector.len()));
        }
        for (sum, &value) in sums.iter_mut().zip(vector.iter()) {
            *sum += f64::from(value);
        }
    }

    let count = vectors.len() as f64;
    let thresholds = sums.into_iter().map(|sum| (sum / count) as f32).collect();
    BinaryThresholds::from_values(thresholds, vectors.len())
}

/// Packed length for `dimension` bits.
pub fn binary_len(dimension: usize) -> usize {
    (dimension + 7) / 8
}

/// Encode one bit per dimension (`ceil(dimension / 8)` bytes).
///
/// # Errors
///
/// Returns an error if the vector length does not match the thresholds.
pub fn encode_binary(vector: &[f32], thresholds: &BinaryThresholds) -> Result<Vec<u8>> {
    if vector.len() != thresholds.dimension() {
        return Err(CoreError::dimension_mismatch(thresholds.dimension(), vector.len()));
    }

    let mut out = vec![0u8; binary_len(vector.len())];
    for (i, (&value, &threshold)) in vector.iter().zip(thresholds.thresholds()).enumerate() {
        if value > threshold {
            out[i / 8] |= 1 << (i % 8);
        }
    }
    Ok(out)
}

/// Reconstruct `threshold ± 1.0` per dimension.
///
/// # Errors
///
/// Returns an error if the byte count does not match the thresholds.
pub fn decode_binary(bits: &[u8], thresholds: &BinaryThresholds) -> Result<Vec<f32>> {
    let expected = binary_len(thresholds.dimension());
    if bits.len() != expected {
        return Err(CoreError::dimension_mismatch(expected, bits.len()));
    }

    Ok(thresholds
        .thresholds()
        .iter()
        .enumerate()
        .map(|(i, &threshold)| {
            if bits[i / 8] & (1 << (i % 8)) != 0 {
                threshold + 1.0
            } else {
                threshold - 1.0
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_train_empty_fails() {
        let empty: Vec<Vec<f32>> = Vec::new();
        assert!(matches!(
            train_binary_thresholds(&empty).unwrap_err(),
            CoreError::EmptyTrainingSet
        ));
    }

    #[test]
    fn test_thresholds_are_means() {
        let vectors = vec![vec![1.0, -2.0, 0.0], vec![3.0, 2.0, 1.0]];
        let thresholds = train_binary_thresholds(&vectors).unwrap();
        assert_eq!(thresholds.thresholds(), &[2.0, 0.0, 0.5]);
        assert_eq!(thresholds.training_size(), 2);
    }

    #[test]
    fn test_bit_layout() {
        let thresholds = BinaryThresholds::from_values(vec![0.0; 10], 1).unwrap();
        let vector = [1.0, -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, -1.0, 0.5, -0.5];

        let bits = encode_binary(&vector, &thresholds).unwrap();
        assert_eq!(bits, vec![0b0000_0101, 0b0000_0001]);

        let decoded = decode_binary(&bits, &thresholds).unwrap();
        assert_eq!(decoded[0], 1.0);
        assert_eq!(decoded[1], -1.0);
        assert_eq!(decoded[8], 1.0);
        assert_eq!(decoded[9], -1.0);
    }

    #[test]
    fn test_value_equal_to_threshold_is_zero_bit() {
        let thresholds = BinaryThresholds::from_values(vec![0.25], 1).unwrap();
        assert_eq!(encode_binary(&[0.25], &thresholds).unwrap(), vec![0]);
    }

    #[test]
    fn test_fixed_compression() {
        let thresholds = BinaryThresholds::from_values(vec![0.0; 1536], 1).unwrap();
        let bits = encode_binary(&vec![0.3; 1536], &thresholds).unwrap();
        assert_eq!(bits.len(), 192);
        assert_eq!(1536 * 4 / bits.len(), 32);
    }

    #[test]
    fn test_dimension_checks() {
        let thresholds = BinaryThresholds::from_values(vec![0.0; 16], 1).unwrap();
        assert!(encode_binary(&[0.0; 8], &thresholds).is_err());
        assert!(decode_binary(&[0u8; 3], &thresholds).is_err());
        assert!(thresholds.ensure_dimension(8).is_err());
        assert!(BinaryThresholds::from_values(Vec::new(), 0).is_err());
    }

    proptest! {
        #[test]
        fn prop_sign_pattern_preserved(values in proptest::collection::vec(-10.0f32..10.0, 1..200)) {
            let thresholds = BinaryThresholds::from_values(vec![0.0; values.len()], 1).unwrap();
            let bits = encode_binary(&values, &thresholds).unwrap();
            prop_assert_eq!(bits.len(), binary_len(values.len()));

            let decoded = decode_binary(&bits, &thresholds).unwrap();
            for (original, restored) in values.iter().zip(decoded.iter()) {
                prop_assert_eq!(*original > 0.0, *restored > 0.0);
            }
        }
    }
}
