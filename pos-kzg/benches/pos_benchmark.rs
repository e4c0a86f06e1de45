//! Benchmarks for packing and commitment operations.
//!
//! Run with: cargo bench -p pos-kzg

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use pos_kzg::config::Fr;
use pos_kzg::{FileCommitment, Srs, commit, open, pack, verify};

/// Benchmark packing of different data sizes.
fn bench_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack");

    for size in [127, 1024, 4096, 16 * 1024].iter() {
        let data = vec![0xABu8; *size];
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| pack(black_box(data)));
        });
    }

    group.finish();
}

/// Benchmark commitment generation for different file sizes.
fn bench_commit(c: &mut Criterion) {
    let srs = Srs::insecure(2048, 985).unwrap();
    let mut group = c.benchmark_group("commit");

    for size_kb in [4, 16, 32].iter() {
        let data = vec![0x12u8; size_kb * 1024];
        let coeffs = pack(&data);
        group.throughput(Throughput::Bytes((size_kb * 1024) as u64));
        group.bench_with_input(BenchmarkId::new("kb", size_kb), &coeffs, |b, coeffs| {
            b.iter(|| commit(black_box(&srs), black_box(coeffs)));
        });
    }

    group.finish();
}

/// Benchmark opening and verification of a 32 KB file.
fn bench_open_verify(c: &mut Criterion) {
    let srs = Srs::insecure(2048, 985).unwrap();
    let data = vec![0x34u8; 32 * 1024];
    let file = FileCommitment::generate(&srs, &data).unwrap();
    let point = Fr::from(0x5eed_u64);

    c.bench_function("open_32kb", |b| {
        b.iter(|| open(black_box(&srs), black_box(&file.coefficients), black_box(point)));
    });

    let proof = file.open(&srs, point).unwrap();
    c.bench_function("verify", |b| {
        b.iter(|| verify(black_box(&srs), &file.commitment, point, black_box(&proof)));
    });
}

criterion_group!(benches, bench_pack, bench_commit, bench_open_verify);
criterion_main!(benches);
