//! Performance benchmarks for codepulse
//!
//! Measures the hot paths of the pipeline on synthetic source trees.
//!
//! **Benchmarks Included:**
//! - `search`: query latency per mode at 100, 1000 and 5000 documents
//! - `index_file`: tokenizing and indexing one file
//! - `analyze_file`: structural analysis of one file
//! - `generate_report`: analytics report over 500 files
//!
//! **Run benchmarks:**
//! ```bash
//! cargo bench                       # Run all benchmarks
//! cargo bench -- search             # Search only
//! cargo bench -- --baseline main    # Compare to baseline
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use codepulse::search::{SearchMode, SearchQuery};
use codepulse::{AnalyticsEngine, FileAnalyzer, SearchIndex};

/// Synthetic TypeScript module with a few functions and imports.
fn synthetic_source(i: usize) -> String {
    format!(
        "import {{ helper{prev} }} from './module_{prev}';\n\
         \n\
         export class Service{i} {{\n\
         \x20 private cache{i}: Map<string, number> = new Map();\n\
         \n\
         \x20 calculateTotal{i}(items: number[], discount: number) {{\n\
         \x20   let total = 0;\n\
         \x20   for (const item of items) {{\n\
         \x20     if (item > 0 && discount < 1) {{\n\
         \x20       total += item * discount;\n\
         \x20     }} else {{\n\
         \x20       total += item;\n\
         \x20     }}\n\
         \x20   }}\n\
         \x20   // TODO: cache the result\n\
         \x20   return total;\n\
         \x20 }}\n\
         }}\n\
         \n\
         export function helper{i}(value: string): string {{\n\
         \x20 return value.trim().toLowerCase();\n\
         }}\n",
        prev = i.saturating_sub(1),
    )
}

fn path_for(i: usize) -> PathBuf {
    PathBuf::from(format!("/bench/src/dir_{}/module_{i}.ts", i % 20))
}

fn populated_index(count: usize) -> SearchIndex {
    let analyzer = FileAnalyzer::new();
    let index = SearchIndex::new();
    for i in 0..count {
        let path = path_for(i);
        let content = synthetic_source(i);
        let analysis = analyzer.analyze_file(&path, content.as_bytes());
        index.index_file(&path, &content, Some(&analysis));
    }
    index
}

/// Benchmark: query latency per mode at various index sizes.
fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);
    group.measurement_time(std::time::Duration::from_secs(5));

    for count in [100, 1000, 5000] {
        let index = populated_index(count);
        let queries = [
            ("full_text", SearchQuery::new("calculate total")),
            ("exact", SearchQuery::new("TODO").with_mode(SearchMode::Exact)),
            (
                "regex",
                SearchQuery::new(r"calculateTotal\d+").with_mode(SearchMode::Regex),
            ),
            ("fuzzy", SearchQuery::new("calculat helpr").with_mode(SearchMode::Fuzzy)),
            ("semantic", SearchQuery::new("Service").with_mode(SearchMode::Semantic)),
        ];

        for (name, query) in &queries {
            group.bench_with_input(BenchmarkId::new(*name, count), query, |b, query| {
                b.iter(|| black_box(index.search(query).expect("search failed")));
            });
        }
    }

    group.finish();
}

/// Benchmark: indexing one file into a warm index.
fn bench_index_file(c: &mut Criterion) {
    let index = populated_index(1000);
    let analyzer = FileAnalyzer::new();
    let path = Path::new("/bench/src/fresh.ts");
    let versions: Vec<String> = (0..2).map(|i| synthetic_source(10_000 + i)).collect();
    let analyses: Vec<_> = versions
        .iter()
        .map(|v| analyzer.analyze_file(path, v.as_bytes()))
        .collect();

    let mut flip = 0;
    c.bench_function("index_file", |b| {
        b.iter(|| {
            // Alternate content so every iteration re-tokenizes.
            flip ^= 1;
            black_box(index.index_file(path, &versions[flip], Some(&analyses[flip])));
        });
    });
}

/// Benchmark: structural analysis of one file.
fn bench_analyze_file(c: &mut Criterion) {
    let analyzer = FileAnalyzer::new();
    let content = synthetic_source(7).repeat(10);
    let path = Path::new("/bench/src/large.ts");

    c.bench_function("analyze_file", |b| {
        b.iter(|| black_box(analyzer.analyze_file(path, content.as_bytes())));
    });
}

/// Benchmark: full analytics report over 500 files.
fn bench_generate_report(c: &mut Criterion) {
    let analyzer = FileAnalyzer::new();
    let engine = AnalyticsEngine::new();
    for i in 0..500 {
        let path = path_for(i);
        let content = synthetic_source(i);
        engine.process_file_analysis(Arc::new(analyzer.analyze_file(&path, content.as_bytes())), None);
    }

    let mut group = c.benchmark_group("generate_report");
    group.sample_size(10);
    group.bench_function("500_files", |b| {
        b.iter(|| black_box(engine.generate_report()));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_search,
    bench_index_file,
    bench_analyze_file,
    bench_generate_report
);
criterion_main!(benches);
