//! Similarity search benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use regledger_bench::generate_births;
use regledger_core::{edit_distance, Matcher, Query};

fn bench_edit_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("edit_distance");

    group.bench_function("surname", |b| {
        b.iter(|| black_box(edit_distance(black_box("Sharma"), black_box("Shrestha"))));
    });

    group.bench_function("full_name", |b| {
        b.iter(|| {
            black_box(edit_distance(
                black_box("Arjun Kumar Sharma"),
                black_box("Arun Kumari Sarma"),
            ))
        });
    });

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    let matcher = Matcher::default();

    for count in [100, 1_000, 10_000] {
        let records = generate_births(count);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("surname", count), &records, |b, records| {
            let query = Query::new("Sharma");
            b.iter(|| black_box(matcher.search(&query, records.iter().cloned())));
        });

        group.bench_with_input(BenchmarkId::new("name_and_dob", count), &records, |b, records| {
            let query = Query::new("Maya Rai").with_dob("2020-06-22");
            b.iter(|| black_box(matcher.search(&query, records.iter().cloned())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_edit_distance, bench_search);
criterion_main!(benches);
