//! Vector codecs, one per tier
//!
//! | Tier   | Bytes              | Encoding                                  |
//! |--------|--------------------|-------------------------------------------|
//! | Hot    | `4 * dim`          | raw little-endian `f32`                   |
//! | Warm   | `2 * dim`          | IEEE-754 half precision                   |
//! | Cool   | `n`                | PQ8, one centroid index per subvector     |
//! | Cold   | `ceil(n / 2)`      | PQ4, two packed 4-bit indices per byte    |
//! | Frozen | `ceil(dim / 8)`    | one bit per dimension vs. trained mean    |
//!
//! `n` is the number of PQ subvectors. PQ and binary codecs must be trained
//! before their tiers can be used.

pub mod binary;
pub mod encoded;
pub mod float16;
pub mod pq;

pub use binary::{
    binary_len, decode_binary, encode_binary, train_binary_thresholds, BinaryThresholds,
};
pub use encoded::{codec_for, CodecContext, EncodedVector, TierCodec, TIER_CODECS};
pub use float16::{decode_float16, encode_float16, f16_to_f32, f32_to_f16};
pub use pq::{
    decode_pq4, decode_pq8, encode_pq4, encode_pq8, pq4_len, train_pq_codebook, PqCodebook,
    PQ4_MAX_CENTROIDS, PQ8_MAX_CENTROIDS,
};
