//! IEEE-754 half-precision codec (warm tier)
//!
//! Each `f32` is narrowed to a 16-bit half with round-to-nearest-even and
//! stored little-endian, two bytes per dimension.

use crate::error::Result;
use vectier_core::CoreError;

const F16_SIGN_MASK: u16 = 0x8000;
const F16_EXP_MASK: u16 = 0x7C00;
const F16_MAN_MASK: u16 = 0x03FF;
/// Largest finite half (65504).
const F16_MAX_FINITE: u16 = 0x7BFF;
/// 2^-24, the value of the least significant subnormal half bit.
const F16_SUBNORMAL_UNIT: f32 = 5.960_464_5e-8;

/// Convert an `f32` to half precision bits.
///
/// - Inf/NaN map to half Inf/NaN (NaN stays NaN).
/// - Finite values beyond the half range clamp to ±65504.
/// - Values below the smallest normal become subnormals or signed zero.
pub fn f32_to_f16(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) as u16) & F16_SIGN_MASK;
    let exponent = ((bits >> 23) & 0xFF) as i32;
    let mantissa = bits & 0x007F_FFFF;

    if exponent == 0xFF {
        if mantissa == 0 {
            return sign | F16_EXP_MASK;
        }
        // Keep the top payload bits and force the quiet bit so NaN survives.
        return sign | F16_EXP_MASK | 0x0200 | ((mantissa >> 13) as u16);
    }

    let half_exponent = exponent - 127 + 15;

    if half_exponent >= 0x1F {
        return sign | F16_MAX_FINITE;
    }

    if half_exponent <= 0 {
        // Subnormal half: value = m * 2^-24
        if half_exponent < -10 {
            return sign;
        }
        let full_mantissa = mantissa | 0x0080_0000;
        let shift = (14 - half_exponent) as u32;
        let truncated = full_mantissa >> shift;
        let halfway = 1u32 << (shift - 1);
        let remainder = full_mantissa & ((1u32 << shift) - 1);
        let rounded = if remainder > halfway || (remainder == halfway && truncated & 1 == 1) {
            truncated + 1
        } else {
            truncated
        };
        // A carry into bit 10 yields the smallest normal, which is the right encoding.
        return sign | rounded as u16;
    }

    let mut out = ((half_exponent as u32) << 10) | (mantissa >> 13);
    let remainder = mantissa & 0x1FFF;
    if remainder > 0x1000 || (remainder == 0x1000 && out & 1 == 1) {
        out += 1;
    }

    if out >= u32::from(F16_EXP_MASK) {
        // Rounding carried into the infinity exponent.
        return sign | F16_MAX_FINITE;
    }

    sign | out as u16
}

/// Expand half precision bits to `f32` exactly.
pub fn f16_to_f32(half: u16) -> f32 {
    let negative = half & F16_SIGN_MASK != 0;
    let exponent = u32::from((half & F16_EXP_MASK) >> 10);
    let mantissa = u32::from(half & F16_MAN_MASK);

    let magnitude = match exponent {
        0 => mantissa as f32 * F16_SUBNORMAL_UNIT,
        0x1F => f32::from_bits(0x7F80_0000 | (mantissa << 13)),
        _ => f32::from_bits(((exponent + 127 - 15) << 23) | (mantissa << 13)),
    };

    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Encode a vector as little-endian halves (`2 * len` bytes).
pub fn encode_float16(vector: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(vector.len() * 2);
    for &value in vector {
        out.extend_from_slice(&f32_to_f16(value).to_le_bytes());
    }
    out
}

/// Decode little-endian halves back to `f32`.
///
/// # Errors
///
/// Returns an error if `bytes` does not hold exactly `dimension` halves.
pub fn decode_float16(bytes: &[u8], dimension: usize) -> Result<Vec<f32>> {
    if bytes.len() != dimension * 2 {
        return Err(CoreError::dimension_mismatch(dimension * 2, bytes.len()));
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| f16_to_f32(u16::from_le_bytes([pair[0], pair[1]])))
        .collect())
}
