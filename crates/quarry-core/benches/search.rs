//! Benchmarks for indexing and query operations.
//!
//! Run with: `cargo bench -p quarry-core --bench search`
//!
//! These benchmarks measure the performance of:
//! - Batch upsert (tokenize + every index)
//! - Single-record re-index of an existing id
//! - Ranked search with and without filters
//! - Whole-store recommendations

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use quarry_core::config::EngineConfig;
use quarry_core::search::{IndexableRecord, RecordEngine, RecordId, SearchFilters};

const CATEGORIES: [&str; 4] = ["Scenarios", "Demos", "Guides", "Templates"];

// =============================================================================
// Test Data Generation
// =============================================================================

/// Deterministic record whose text and tags vary by id.
fn sample_record(id: usize) -> IndexableRecord {
    let topics = [
        ("cloud credential abuse", "cloud"),
        ("ransomware containment", "ransomware"),
        ("lateral movement detection", "endpoint"),
        ("trr validation evidence", "trr"),
        ("pov success criteria", "pov"),
        ("identity provider sign-in anomalies", "identity"),
    ];
    let (topic, tag) = topics[id % topics.len()];
    let difficulty = ["beginner", "intermediate", "advanced", "expert"][id % 4];

    IndexableRecord::new(format!("rec_{id:05}"))
        .with_name(format!("rec_{id:05}"))
        .with_field("title", format!("{topic} {id}"), 10.0)
        .with_field("tags", format!("{tag} lab"), 8.0)
        .with_field(
            "body",
            format!(
                "Record {id} covers {topic}. It walks through preparation, execution and \
                 review, with notes on telemetry sources and tuning for {tag} workloads."
            ),
            5.0,
        )
        .with_category(CATEGORIES[id % CATEGORIES.len()])
        .with_tags([tag, "lab"])
        .with_attribute("difficulty", difficulty)
        .with_attribute("rating", (id % 5) as f64)
}

fn build_engine(size: usize) -> RecordEngine {
    let mut engine = RecordEngine::new(EngineConfig::default(), CATEGORIES);
    engine.upsert_batch((0..size).map(sample_record));
    engine
}

// =============================================================================
// Indexing
// =============================================================================

fn bench_upsert_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("index/upsert_batch");

    for size in [100, 500, 2000] {
        let records: Vec<IndexableRecord> = (0..size).map(sample_record).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter_batched(
                || records.clone(),
                |records| {
                    let mut engine = RecordEngine::new(EngineConfig::default(), CATEGORIES);
                    engine.upsert_batch(records);
                    engine
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_reindex_existing(c: &mut Criterion) {
    let mut engine = build_engine(2000);
    let replacement = sample_record(1000);

    c.bench_function("index/reindex_existing", |b| {
        b.iter(|| engine.upsert(black_box(replacement.clone())));
    });
}

// =============================================================================
// Query
// =============================================================================

fn bench_search_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("query/search_by_size");
    let filters = SearchFilters::default();

    for size in [100, 500, 2000] {
        let engine = build_engine(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| engine.search(black_box("cloud credential detection"), &filters));
        });
    }
    group.finish();
}

fn bench_search_filtered(c: &mut Criterion) {
    let engine = build_engine(2000);
    let filters = SearchFilters::default().category("Scenarios").tag("cloud");

    c.bench_function("query/search_filtered", |b| {
        b.iter(|| engine.search(black_box("cloud credential"), &filters));
    });
}

fn bench_recommend_for(c: &mut Criterion) {
    let engine = build_engine(2000);
    let id = RecordId::from("rec_00042");

    c.bench_function("recommend/whole_store", |b| {
        b.iter(|| engine.recommend_for(black_box(&id), 5));
    });
}

criterion_group!(
    benches,
    bench_upsert_batch,
    bench_reindex_existing,
    bench_search_by_size,
    bench_search_filtered,
    bench_recommend_for
);
criterion_main!(benches);
