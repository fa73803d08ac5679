//! Wire encoding benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stepsync_bench::{random_doc, random_history};
use stepsync_protocol::codec::{from_cbor, from_json_str, to_cbor, to_json_string};
use stepsync_protocol::{Commit, PullResponse};
use stepsync_transform::TextStep;

fn response(count: usize) -> PullResponse<TextStep> {
    let (commits, _) = random_history(&random_doc(500, 1), count, 5);
    PullResponse::new(commits, count as u64, false)
}

/// Benchmark encoding pull responses.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_pull_response");

    for count in [1, 10, 100] {
        let response = response(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("cbor", count), &response, |b, response| {
            b.iter(|| black_box(to_cbor(black_box(response)).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("json", count), &response, |b, response| {
            b.iter(|| black_box(to_json_string(black_box(response)).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark decoding pull responses.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_pull_response");

    for count in [1, 10, 100] {
        let response = response(count);
        let cbor = to_cbor(&response).unwrap();
        let json = to_json_string(&response).unwrap();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("cbor", count), &cbor, |b, bytes| {
            b.iter(|| {
                let decoded: PullResponse<TextStep> = from_cbor(black_box(bytes)).unwrap();
                black_box(decoded);
            });
        });
        group.bench_with_input(BenchmarkId::new("json", count), &json, |b, text| {
            b.iter(|| {
                let decoded: PullResponse<TextStep> = from_json_str(black_box(text)).unwrap();
                black_box(decoded);
            });
        });
    }

    group.finish();
}

/// Benchmark a single commit round trip.
fn bench_commit(c: &mut Criterion) {
    let commit = Commit::new(1, "bench", vec![TextStep::insert(0, "hello")]);
    c.bench_function("commit_cbor_roundtrip", |b| {
        b.iter(|| {
            let bytes = to_cbor(black_box(&commit)).unwrap();
            let decoded: Commit<TextStep> = from_cbor(&bytes).unwrap();
            black_box(decoded);
        });
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_commit);
criterion_main!(benches);
