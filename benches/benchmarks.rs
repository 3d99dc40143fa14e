//! Benchmark suite for taskstream.
//!
//! This module provides performance benchmarks for:
//! - Full pipeline classification (context, scoring, routing)
//! - Context mapping on person-heavy batches
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Save baseline for comparison
//! cargo bench -- --save-baseline main
//!
//! # Compare against baseline
//! cargo bench -- --baseline main
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use taskstream::model::{IdeaAnalysis, TaskCandidate};
use taskstream::pipeline::{classify, map_context};

const TIMEFRAMES: &[&str] = &["today", "tomorrow", "this week", "someday", "later"];

const TITLES: &[&str] = &[
    "Buy milk",
    "Call mom tonight",
    "Draft the project plan for the spring garden renovation with Alex",
    "Email Sam about the invoice",
    "Book flights for next week",
    "Read a chapter",
];

fn candidates(count: usize) -> Vec<TaskCandidate> {
    (0..count)
        .map(|i| {
            let candidate = TaskCandidate::new(
                TITLES[i % TITLES.len()],
                TIMEFRAMES[i % TIMEFRAMES.len()],
            )
            .with_category("Personal");
            if i % 3 == 0 {
                candidate.with_person_name()
            } else {
                candidate
            }
        })
        .collect()
}

// ============================================================================
// Pipeline Benchmarks
// ============================================================================

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    let analysis = IdeaAnalysis::with_tone("stressed")
        .with_topics(vec!["Work".into(), "Garden".into(), "Travel".into()]);

    for size in [10, 100, 1000] {
        let batch = candidates(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("full_pipeline", size), &batch, |b, batch| {
            b.iter(|| black_box(classify(black_box(batch), &analysis)));
        });
    }

    group.finish();
}

fn bench_context_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("context_mapping");
    let analysis = IdeaAnalysis::default();

    for size in [10, 100, 1000] {
        let batch: Vec<TaskCandidate> = candidates(size)
            .into_iter()
            .map(TaskCandidate::with_person_name)
            .collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("people", size), &batch, |b, batch| {
            b.iter(|| black_box(map_context(black_box(batch), &analysis)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_context_mapping);
criterion_main!(benches);
