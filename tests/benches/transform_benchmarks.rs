//! # Image-Transform Benchmarks
//!
//! | Component | Operation |
//! |-----------|-----------|
//! | it-04 Transform Worker | filter chain per image size |
//! | it-04 Transform Worker | bounded decode + encode |
//! | it-02 Object Storage | capability presign / verify |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{Rgba, RgbaImage};
use std::sync::Arc;
use std::time::Duration;

use it_02_object_storage::{CapabilityClaims, CapabilitySigner, SystemTimeSource};
use it_04_transform_worker::{decode_bounded, encode, DimensionLimits, FilterRegistry};
use shared_types::{CapabilityOperation, ContentType, Transform};

fn sample(side: u32) -> RgbaImage {
    RgbaImage::from_fn(side, side, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8, 255])
    })
}

// ============================================================================
// it-04: Filter chains
// ============================================================================

fn bench_filter_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("it-04-filter-chain");
    group.measurement_time(Duration::from_secs(5));

    let registry = FilterRegistry::standard();
    let chains: [(&str, Vec<Transform>); 3] = [
        ("grayscale", vec![Transform::named("grayscale")]),
        (
            "grayscale_sepia_invert",
            vec![
                Transform::named("grayscale"),
                Transform::named("sepia"),
                Transform::named("invert"),
            ],
        ),
        ("median_2", vec![Transform::new("median", ["2"])]),
    ];

    for side in [64u32, 256, 512] {
        let image = sample(side);
        group.throughput(Throughput::Elements(u64::from(side * side)));
        for (name, chain) in &chains {
            group.bench_with_input(BenchmarkId::new(*name, side), &image, |b, image| {
                b.iter(|| black_box(registry.apply_chain(image.clone(), chain).is_ok()))
            });
        }
    }
    group.finish();
}

// ============================================================================
// it-04: Codec
// ============================================================================

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("it-04-codec");

    let image = sample(256);
    for content_type in [ContentType::Png, ContentType::Jpeg] {
        let encoded = encode(image.clone(), content_type).unwrap_or_default();
        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_function(BenchmarkId::new("decode", content_type.suffix()), |b| {
            b.iter(|| black_box(decode_bounded(&encoded, DimensionLimits::default()).is_ok()))
        });
        group.bench_function(BenchmarkId::new("encode", content_type.suffix()), |b| {
            b.iter(|| black_box(encode(image.clone(), content_type).is_ok()))
        });
    }
    group.finish();
}

// ============================================================================
// it-02: Capabilities
// ============================================================================

fn bench_capabilities(c: &mut Criterion) {
    let mut group = c.benchmark_group("it-02-capability");

    let Ok(signer) = CapabilitySigner::new(&[7u8; 32], "http://bench", Arc::new(SystemTimeSource))
    else {
        return;
    };
    let ttl = Duration::from_secs(60);
    let key = "image-00000000-0000-0000-0000-000000000000.png";

    group.bench_function("presign", |b| {
        b.iter(|| black_box(signer.presign(CapabilityOperation::Write, "input", key, ttl)))
    });

    let cap = signer.presign(CapabilityOperation::Read, "output", key, ttl);
    let claims = CapabilityClaims {
        operation: cap.operation.as_str().to_string(),
        expires_at: cap.expires_at,
        signature: cap.signature,
    };
    group.bench_function("verify", |b| {
        b.iter(|| {
            black_box(
                signer
                    .verify(CapabilityOperation::Read, "output", key, &claims)
                    .is_ok(),
            )
        })
    });
    group.finish();
}

criterion_group!(benches, bench_filter_chain, bench_codec, bench_capabilities);
criterion_main!(benches);
