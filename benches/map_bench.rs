use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mmap_reader::MapExecutor;
use std::fs;
use std::path::PathBuf;

// Simple helper to build a unique temp path per bench
fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("mmap_reader_bench_{}_{}", name, std::process::id()));
    p
}

const SIZES: [usize; 3] = [4 * 1024, 1024 * 1024, 16 * 1024 * 1024];

fn bench_map_vs_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_vs_read");
    let executor = MapExecutor::new();

    for &size in &SIZES {
        let path = tmp_path(&format!("file_{size}"));
        fs::write(&path, vec![0x5A_u8; size]).expect("write");
        group.throughput(Throughput::Bytes(size as u64));

        // Map, touch every page, release.
        group.bench_with_input(BenchmarkId::new("map_sync", size), &path, |b, p| {
            b.iter(|| {
                let view = executor.map_sync(p).expect("map");
                let sum: u64 = view.iter().step_by(4096).map(|&x| u64::from(x)).sum();
                criterion::black_box(sum);
            });
        });

        // Baseline: copy the whole file into a buffer.
        group.bench_with_input(BenchmarkId::new("fs_read", size), &path, |b, p| {
            b.iter(|| {
                let bytes = fs::read(p).expect("read");
                let sum: u64 = bytes.iter().step_by(4096).map(|&x| u64::from(x)).sum();
                criterion::black_box(sum);
            });
        });

        let _ = fs::remove_file(&path);
    }
    group.finish();
}

fn bench_background_request(c: &mut Criterion) {
    let path = tmp_path("background");
    fs::write(&path, vec![1_u8; 64 * 1024]).expect("write");
    let executor = MapExecutor::new();

    c.bench_function("request_wait_64k", |b| {
        b.iter(|| {
            let view = executor.request(&path).wait().expect("map");
            criterion::black_box(view.len());
        });
    });

    let _ = fs::remove_file(&path);
}

criterion_group!(benches, bench_map_vs_read, bench_background_request);
criterion_main!(benches);
