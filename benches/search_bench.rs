//! Benchmarks for isa-docs search, comparison and index construction

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use isa_docs::{
    ComparisonResolver, DataStore, Instruction, IsaService, MemoryStore, SearchLimits,
    SearchResolver, Snapshot,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

fn sample_snapshot() -> Snapshot {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("sample_isa.json");
    Snapshot::load(&path).expect("sample snapshot loads")
}

/// Sample snapshot with every instruction cloned `copies` times as extra variants.
fn scaled_snapshot(copies: usize) -> Snapshot {
    let mut snapshot = sample_snapshot();
    let base: Vec<Instruction> = snapshot.instructions.clone();
    for n in 0..copies {
        for instr in &base {
            let mut clone = instr.clone();
            clone.variant = Some(format!("{}_bench{}", instr.variant_tag(), n));
            snapshot.instructions.push(clone);
        }
    }
    snapshot
}

fn store(copies: usize) -> Arc<dyn DataStore> {
    Arc::new(MemoryStore::from_snapshot(scaled_snapshot(copies)).expect("valid snapshot"))
}

/// Benchmark ranked search over growing corpora
fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for &copies in &[0, 10, 100] {
        let snapshot = scaled_snapshot(copies);
        let docs = snapshot.instructions.len();
        let store = Arc::new(MemoryStore::from_snapshot(snapshot).expect("valid snapshot"));
        let search = SearchResolver::new(store, SearchLimits::default());
        group.throughput(Throughput::Elements(docs as u64));

        group.bench_function(format!("mov_prefix_x{}", copies), |b| {
            b.iter(|| black_box(search.search(black_box("mov"), None)))
        });
        group.bench_function(format!("two_terms_filtered_x{}", copies), |b| {
            b.iter(|| black_box(search.search(black_box("move zero"), Some("x86_64"))))
        });
    }

    group.finish();
}

/// Benchmark cross-architecture comparison
fn bench_compare(c: &mut Criterion) {
    let compare = ComparisonResolver::new(store(10));

    c.bench_function("compare_add_all", |b| {
        b.iter(|| black_box(compare.compare(black_box("ADD"), None)))
    });
}

/// Benchmark full request handling including formatting
fn bench_service(c: &mut Criterion) {
    let service = IsaService::new(store(0), SearchLimits::default());

    c.bench_function("service_search_tool", |b| {
        b.iter(|| black_box(service.call("search_instructions", json!({"query": "add"}))))
    });
    c.bench_function("service_architecture_detail", |b| {
        b.iter(|| black_box(service.read("isa://architecture/x86_64")))
    });
}

/// Benchmark store construction (sort + index build)
fn bench_index_build(c: &mut Criterion) {
    let snapshot = scaled_snapshot(100);

    c.bench_function("index_build_x100", |b| {
        b.iter(|| black_box(MemoryStore::from_snapshot(snapshot.clone())))
    });
}

criterion_group!(
    benches,
    bench_search,
    bench_compare,
    bench_service,
    bench_index_build
);
criterion_main!(benches);
