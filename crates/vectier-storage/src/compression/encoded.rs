use super::binary::{binary_len, decode_binary, encode_binary, BinaryThresholds};
use super::float16::{decode_float16, encode_float16};
use super::pq::{decode_pq4, decode_pq8, encode_pq4, encode_pq8, pq4_len, PqCodebook};
use crate::error::Result;
use bytes::Bytes;
use vectier_core::{CoreError, Tier};

/// Trained codecs available to encode/decode calls.
///
/// Missing entries make the corresponding tier unusable.
#[derive(Debug, Clone, Copy)]
pub struct CodecContext<'a> {
    pub dimension: usize,
    pub pq8: Option<&'a PqCodebook>,
    pub pq4: Option<&'a PqCodebook>,
    pub binary: Option<&'a BinaryThresholds>,
}

impl<'a> CodecContext<'a> {
    /// Context with no trained codecs (hot and warm only).
    pub fn untrained(dimension: usize) -> Self {
        Self {
            dimension,
            pq8: None,
            pq4: None,
            binary: None,
        }
    }

    /// True when `tier` can be encoded and decoded with this context.
    pub fn is_ready(&self, tier: Tier) -> bool {
        !tier.requires_training() || self.has_trained_codec(tier)
    }

    /// True when the trained codec backing `tier` is present.
    pub fn has_trained_codec(&self, tier: Tier) -> bool {
        match tier {
            Tier::Cool => self.pq8.is_some(),
            Tier::Cold => self.pq4.is_some(),
            Tier::Frozen => self.binary.is_some(),
            Tier::Hot | Tier::Warm => false,
        }
    }

    fn pq8(&self) -> Result<&'a PqCodebook> {
        let codebook = self
            .pq8
            .ok_or(CoreError::CodebookNotTrained { tier: Tier::Cool })?;
        codebook.ensure_dimension(self.dimension)?;
        Ok(codebook)
    }

    fn pq4(&self) -> Result<&'a PqCodebook> {
        let codebook = self
            .pq4
            .ok_or(CoreError::CodebookNotTrained { tier: Tier::Cold })?;
        codebook.ensure_dimension(self.dimension)?;
        Ok(codebook)
    }

    fn binary(&self) -> Result<&'a BinaryThresholds> {
        let thresholds = self
            .binary
            .ok_or(CoreError::CodebookNotTrained { tier: Tier::Frozen })?;
        thresholds.ensure_dimension(self.dimension)?;
        Ok(thresholds)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(CoreError::dimension_mismatch(self.dimension, vector.len()));
        }
        Ok(())
    }
}

type EncodeFn = fn(&[f32], &CodecContext<'_>) -> Result<Bytes>;
type DecodeFn = fn(&[u8], &CodecContext<'_>) -> Result<Vec<f32>>;

/// Encode/decode pair for one tier.
pub struct TierCodec {
    pub tier: Tier,
    pub encode: EncodeFn,
    pub decode: DecodeFn,
    /// Encoded size for `(dimension, num_subvectors)`.
    pub encoded_len: fn(usize, usize) -> usize,
}

/// Codec lookup table indexed by `Tier::index()`.
pub static TIER_CODECS: [TierCodec; Tier::COUNT] = [
    TierCodec {
        tier: Tier::Hot,
        encode: encode_hot,
        decode: decode_hot,
        encoded_len: hot_len,
    },
    TierCodec {
        tier: Tier::Warm,
        encode: encode_warm,
        decode: decode_warm,
        encoded_len: warm_len,
    },
    TierCodec {
        tier: Tier::Cool,
        encode: encode_cool,
        decode: decode_cool,
        encoded_len: cool_len,
    },
    TierCodec {
        tier: Tier::Cold,
        encode: encode_cold,
        decode: decode_cold,
        encoded_len: cold_len,
    },
    TierCodec {
        tier: Tier::Frozen,
        encode: encode_frozen,
        decode: decode_frozen,
        encoded_len: frozen_len,
    },
];

fn hot_len(dimension: usize, _subvectors: usize) -> usize {
    dimension * 4
}

fn warm_len(dimension: usize, _subvectors: usize) -> usize {
    dimension * 2
}

fn cool_len(_dimension: usize, subvectors: usize) -> usize {
    subvectors
}

fn cold_len(_dimension: usize, subvectors: usize) -> usize {
    pq4_len(subvectors)
}

fn frozen_len(dimension: usize, _subvectors: usize) -> usize {
    binary_len(dimension)
}

/// Codec for `tier`.
pub fn codec_for(tier: Tier) -> &'static TierCodec {
    &TIER_CODECS[tier.index()]
}

fn encode_hot(vector: &[f32], ctx: &CodecContext<'_>) -> Result<Bytes> {
    ctx.check_dimension(vector)?;
    let mut out = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        out.extend_from_slice(&value.to_le_bytes());
    }
    Ok(Bytes::from(out))
}

fn decode_hot(bytes: &[u8], ctx: &CodecContext<'_>) -> Result<Vec<f32>> {
    if bytes.len() != ctx.dimension * 4 {
        return Err(CoreError::dimension_mismatch(ctx.dimension * 4, bytes.len()));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|word| f32::from_le_bytes([word[0], word[1], word[2], word[3]]))
        .collect())
}

fn encode_warm(vector: &[f32], ctx: &CodecContext<'_>) -> Result<Bytes> {
    ctx.check_dimension(vector)?;
    Ok(Bytes::from(encode_float16(vector)))
}

fn decode_warm(bytes: &[u8], ctx: &CodecContext<'_>) -> Result<Vec<f32>> {
    decode_float16(bytes, ctx.dimension)
}

fn encode_cool(vector: &[f32], ctx: &CodecContext<'_>) -> Result<Bytes> {
    ctx.check_dimension(vector)?;
    encode_pq8(vector, ctx.pq8()?).map(Bytes::from)
}

fn decode_cool(bytes: &[u8], ctx: &CodecContext<'_>) -> Result<Vec<f32>> {
    decode_pq8(bytes, ctx.pq8()?)
}

fn encode_cold(vector: &[f32], ctx: &CodecContext<'_>) -> Result<Bytes> {
    ctx.check_dimension(vector)?;
    encode_pq4(vector, ctx.pq4()?).map(Bytes::from)
}

fn decode_cold(bytes: &[u8], ctx: &CodecContext<'_>) -> Result<Vec<f32>> {
    decode_pq4(bytes, ctx.pq4()?)
}

fn encode_frozen(vector: &[f32], ctx: &CodecContext<'_>) -> Result<Bytes> {
    ctx.check_dimension(vector)?;
    encode_binary(vector, ctx.binary()?).map(Bytes::from)
}

fn decode_frozen(bytes: &[u8], ctx: &CodecContext<'_>) -> Result<Vec<f32>> {
    decode_binary(bytes, ctx.binary()?)
}

/// Stored bytes tagged with the tier whose wire format they follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedVector {
    /// `4 * dim` bytes of little-endian `f32`.
    Hot(Bytes),
    /// `2 * dim` bytes of little-endian half floats.
    Warm(Bytes),
    /// One PQ8 code per subvector.
    Cool(Bytes),
    /// Two PQ4 codes per byte.
    Cold(Bytes),
    /// One bit per dimension.
    Frozen(Bytes),
}

impl EncodedVector {
    /// Encode `vector` into `tier`'s wire format.
    ///
    /// # Errors
    ///
    /// Returns an error on a dimension mismatch or a missing codec.
    pub fn encode(tier: Tier, vector: &[f32], ctx: &CodecContext<'_>) -> Result<Self> {
        let bytes = (codec_for(tier).encode)(vector, ctx)?;
        Ok(Self::from_parts(tier, bytes))
    }

    /// Decode back to a full-length `f32` vector.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed payload or a missing codec.
    pub fn decode(&self, ctx: &CodecContext<'_>) -> Result<Vec<f32>> {
        (codec_for(self.tier()).decode)(self.as_bytes(), ctx)
    }

    /// Tags raw bytes with a tier without validating them.
    pub fn from_parts(tier: Tier, bytes: Bytes) -> Self {
        match tier {
            Tier::Hot => Self::Hot(bytes),
            Tier::Warm => Self::Warm(bytes),
            Tier::Cool => Self::Cool(bytes),
            Tier::Cold => Self::Cold(bytes),
            Tier::Frozen => Self::Frozen(bytes),
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            Self::Hot(_) => Tier::Hot,
            Self::Warm(_) => Tier::Warm,
            Self::Cool(_) => Tier::Cool,
            Self::Cold(_) => Tier::Cold,
            Self::Frozen(_) => Tier::Frozen,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Hot(bytes)
            | Self::Warm(bytes)
            | Self::Cool(bytes)
            | Self::Cold(bytes)
            | Self::Frozen(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}
