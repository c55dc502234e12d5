//! Codec encode/decode throughput
//!
//! Measures each tier's codec on a single vector across common embedding
//! widths, plus PQ codebook training cost.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vectier_benchmarks::{generate_random_vectors, training_vectors, DEFAULT_DIMENSION};
use vectier_core::config::default_num_subvectors;
use vectier_core::Tier;
use vectier_storage::compression::{
    decode_float16, encode_float16, train_binary_thresholds, train_pq_codebook, CodecContext,
    EncodedVector,
};

fn bench_float16_by_dimension(c: &mut Criterion) {
    let mut group = c.benchmark_group("float16_by_dimension");

    for dim in [384, 768, 1536, 3072] {
        let vector = generate_random_vectors(1, dim).remove(0);
        let encoded = encode_float16(&vector);
        group.throughput(Throughput::Elements(dim as u64));

        group.bench_with_input(BenchmarkId::new("encode", dim), &dim, |bencher, _| {
            bencher.iter(|| encode_float16(black_box(&vector)));
        });

        group.bench_with_input(BenchmarkId::new("decode", dim), &dim, |bencher, &dim| {
            bencher.iter(|| decode_float16(black_box(&encoded), dim));
        });
    }

    group.finish();
}

fn bench_tier_codecs(c: &mut Criterion) {
    let training = training_vectors();
    let subvectors = default_num_subvectors(DEFAULT_DIMENSION);
    let pq8 = train_pq_codebook(training, subvectors, 256, 10, 42).expect("pq8 training");
    let pq4 = train_pq_codebook(training, subvectors, 16, 10, 42).expect("pq4 training");
    let binary = train_binary_thresholds(training).expect("binary training");
    let ctx = CodecContext {
        dimension: DEFAULT_DIMENSION,
        pq8: Some(&pq8),
        pq4: Some(&pq4),
        binary: Some(&binary),
    };
    let vector = &training[0];

    let mut group = c.benchmark_group("tier_codecs");
    group.throughput(Throughput::Elements(DEFAULT_DIMENSION as u64));

    for tier in Tier::ALL {
        let encoded = EncodedVector::encode(tier, vector, &ctx).expect("encode");

        group.bench_function(BenchmarkId::new("encode", tier), |bencher| {
            bencher.iter(|| EncodedVector::encode(tier, black_box(vector), &ctx));
        });

        group.bench_function(BenchmarkId::new("decode", tier), |bencher| {
            bencher.iter(|| black_box(&encoded).decode(&ctx));
        });
    }

    group.finish();
}

fn bench_pq_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("pq_training");
    group.sample_size(10);

    for samples in [64, 256] {
        let vectors = generate_random_vectors(samples, DEFAULT_DIMENSION);
        let subvectors = default_num_subvectors(DEFAULT_DIMENSION);

        group.bench_with_input(BenchmarkId::new("pq4", samples), &samples, |bencher, _| {
            bencher.iter(|| train_pq_codebook(black_box(&vectors), subvectors, 16, 10, 42));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_float16_by_dimension,
    bench_tier_codecs,
    bench_pq_training
);
criterion_main!(benches);
