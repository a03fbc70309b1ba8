//! Benchmarks for protomodel encode/decode.
//!
//! Run with: cargo bench

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use protomodel::codec::{decode_value, encode_value};
use protomodel::codec::wire::{decode_varint, encode_varint};
use protomodel::{decode, encode, ProtoMessage, ProtoType};
use serde::{Deserialize, Serialize};

// ============================================================================
// Test Data Structures
// ============================================================================

/// Simple record for benchmarking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ProtoMessage)]
struct Person {
    name: String,
    age: i64,
    active: bool,
}

/// Record with more fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ProtoMessage)]
struct UserProfile {
    id: u64,
    username: String,
    email: String,
    age: u32,
    verified: bool,
    score: f64,
    nickname: Option<String>,
}

/// Record with repeated fields, a map and nested messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ProtoMessage)]
struct DataSet {
    numbers: Vec<i64>,
    values: Vec<f64>,
    labels: BTreeMap<String, u32>,
    members: Vec<Person>,
}

fn sample_person() -> Person {
    Person {
        name: "Alice".into(),
        age: 30,
        active: true,
    }
}

fn sample_profile() -> UserProfile {
    UserProfile {
        id: 12345,
        username: "alice_wonder".into(),
        email: "alice@example.com".into(),
        age: 28,
        verified: true,
        score: 98.5,
        nickname: Some("al".into()),
    }
}

fn sample_dataset(size: usize) -> DataSet {
    DataSet {
        numbers: (0..size as i64).map(|i| i * 1000 - 500).collect(),
        values: (0..size).map(|i| i as f64 * 0.25).collect(),
        labels: (0..size.min(64))
            .map(|i| (format!("label{}", i), i as u32))
            .collect(),
        members: (0..size.min(32))
            .map(|i| Person {
                name: format!("member{}", i),
                age: i as i64,
                active: i % 2 == 0,
            })
            .collect(),
    }
}

// ============================================================================
// Varint Benchmarks
// ============================================================================

fn bench_varint(c: &mut Criterion) {
    let mut group = c.benchmark_group("varint");

    for value in [1u64, 300, 1 << 35, u64::MAX] {
        group.bench_with_input(BenchmarkId::new("encode", value), &value, |b, &value| {
            let mut out = Vec::with_capacity(16);
            b.iter(|| {
                out.clear();
                encode_varint(black_box(value), &mut out);
            })
        });

        let mut encoded = Vec::new();
        encode_varint(value, &mut encoded);
        group.bench_with_input(BenchmarkId::new("decode", value), &encoded, |b, data| {
            b.iter(|| {
                let mut offset = 0;
                decode_varint(black_box(data), &mut offset).unwrap()
            })
        });
    }

    group.finish();
}

// ============================================================================
// Encode Benchmarks
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(1));

    let person = sample_person();
    group.bench_function("person", |b| b.iter(|| encode(black_box(&person)).unwrap()));

    let profile = sample_profile();
    group.bench_function("user_profile", |b| {
        b.iter(|| encode(black_box(&profile)).unwrap())
    });

    for size in [10usize, 100, 1000] {
        let dataset = sample_dataset(size);
        group.bench_with_input(BenchmarkId::new("dataset", size), &dataset, |b, dataset| {
            b.iter(|| encode(black_box(dataset)).unwrap())
        });
    }

    group.finish();
}

/// Encode from an already built value, isolating the wire writer.
fn bench_encode_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_value");

    let schema = DataSet::schema().unwrap();
    let value = sample_dataset(100).to_value();
    group.bench_function("dataset_100", |b| {
        b.iter(|| encode_value(&schema, black_box(&value)).unwrap())
    });

    group.finish();
}

fn bench_encode_serde(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_serde_json");
    group.throughput(Throughput::Elements(1));

    let person = sample_person();
    group.bench_function("person", |b| {
        b.iter(|| serde_json::to_vec(black_box(&person)).unwrap())
    });

    let dataset = sample_dataset(100);
    group.bench_function("dataset_100", |b| {
        b.iter(|| serde_json::to_vec(black_box(&dataset)).unwrap())
    });

    group.finish();
}

// ============================================================================
// Decode Benchmarks
// ============================================================================

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    let person_bytes = encode(&sample_person()).unwrap();
    group.throughput(Throughput::Bytes(person_bytes.len() as u64));
    group.bench_function("person", |b| {
        b.iter(|| decode::<Person>(black_box(&person_bytes)).unwrap())
    });

    let profile_bytes = encode(&sample_profile()).unwrap();
    group.throughput(Throughput::Bytes(profile_bytes.len() as u64));
    group.bench_function("user_profile", |b| {
        b.iter(|| decode::<UserProfile>(black_box(&profile_bytes)).unwrap())
    });

    for size in [10usize, 100, 1000] {
        let bytes = encode(&sample_dataset(size)).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("dataset", size), &bytes, |b, bytes| {
            b.iter(|| decode::<DataSet>(black_box(bytes)).unwrap())
        });
    }

    group.finish();
}

fn bench_decode_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_value");

    let schema = DataSet::schema().unwrap();
    let bytes = encode(&sample_dataset(100)).unwrap();
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("dataset_100", |b| {
        b.iter(|| decode_value(&schema, black_box(&bytes)).unwrap())
    });

    group.finish();
}

fn bench_decode_serde(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_serde_json");

    let person_json = serde_json::to_vec(&sample_person()).unwrap();
    group.throughput(Throughput::Bytes(person_json.len() as u64));
    group.bench_function("person", |b| {
        b.iter(|| serde_json::from_slice::<Person>(black_box(&person_json)).unwrap())
    });

    let dataset_json = serde_json::to_vec(&sample_dataset(100)).unwrap();
    group.throughput(Throughput::Bytes(dataset_json.len() as u64));
    group.bench_function("dataset_100", |b| {
        b.iter(|| serde_json::from_slice::<DataSet>(black_box(&dataset_json)).unwrap())
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_varint,
    bench_encode,
    bench_encode_value,
    bench_encode_serde,
    bench_decode,
    bench_decode_value,
    bench_decode_serde,
);
criterion_main!(benches);
