//! Benchmarks for timeshard ingestion and range queries

use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::TempDir;
use timeshard::ingest::Ingestor;
use timeshard::query;
use timeshard::record::format_rfc3339;

const BASE_TS: i64 = 994_620_570; // 2001-07-08T19:29:30Z

fn source_lines(count: usize) -> String {
    let mut out = String::with_capacity(count * 80);
    for i in 0..count {
        out.push_str(&format!(
            "{} user{}@example.com session-{:08}\n",
            format_rfc3339(BASE_TS + i as i64),
            i % 97,
            i
        ));
    }
    out
}

fn storage_benchmarks(c: &mut Criterion) {
    let input = source_lines(50_000);

    c.bench_function("ingest_50k_records", |b| {
        b.iter_batched(
            || TempDir::new().unwrap(),
            |dir| {
                let ingestor = Ingestor::new(4096, dir.path()).unwrap();
                let partitions = ingestor
                    .process(Cursor::new(input.as_bytes()), "bench.txt")
                    .unwrap();
                black_box(partitions.len());
            },
            BatchSize::PerIteration,
        )
    });

    let dir = TempDir::new().unwrap();
    let ingestor = Ingestor::new(4096, dir.path()).unwrap();
    let partitions = ingestor
        .process(Cursor::new(input.as_bytes()), "bench.txt")
        .unwrap();

    c.bench_function("select_narrow_range", |b| {
        b.iter(|| {
            let records =
                query::select_all(&partitions, BASE_TS + 20_000, BASE_TS + 20_100).unwrap();
            black_box(records.len());
        })
    });

    c.bench_function("select_wide_range", |b| {
        b.iter(|| {
            let records = query::select_all(&partitions, BASE_TS, BASE_TS + 50_000).unwrap();
            black_box(records.len());
        })
    });

    c.bench_function("select_out_of_range", |b| {
        b.iter(|| {
            let records = query::select_all(&partitions, 0, BASE_TS - 1).unwrap();
            black_box(records.len());
        })
    });
}

criterion_group!(benches, storage_benchmarks);
criterion_main!(benches);
