//! # Search Benchmarks
//!
//! Linear search cost against growing content stores.
//!
//! Run with: `cargo bench -p playbook-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use playbook_core::content::{Faq, GlossaryTerm, Resource, Template};
use playbook_core::{ContentId, ContentStore, ProgressRecord, global_search};
use std::hint::black_box;
use time::macros::datetime;
use time::Duration;

/// Content store with `size` items in each searchable collection.
fn create_content(size: usize) -> ContentStore {
    ContentStore {
        templates: (0..size)
            .map(|i| Template {
                id: ContentId::new(format!("template-{}", i)),
                title: format!("Controls template {}", i),
                description: format!("Material controls documentation pack {}", i),
                category: "documentation".to_string(),
                roles: Vec::new(),
                phase: None,
                format: "docx".to_string(),
            })
            .collect(),
        faqs: (0..size)
            .map(|i| Faq {
                id: ContentId::new(format!("faq-{}", i)),
                question: format!("How does the board declare effectiveness {}?", i),
                answer: "By reviewing evidence from the assurance map.".to_string(),
                category: "declaration".to_string(),
            })
            .collect(),
        glossary: (0..size)
            .map(|i| GlossaryTerm {
                id: ContentId::new(format!("term-{}", i)),
                term: format!("Term {}", i),
                definition: "A definition mentioning material controls.".to_string(),
            })
            .collect(),
        resources: (0..size)
            .map(|i| Resource {
                id: ContentId::new(format!("article-{}", i)),
                title: format!("Article {}", i),
                summary: "Guidance for audit committees".to_string(),
                url: String::new(),
                tags: vec!["guidance".to_string(), "controls".to_string()],
            })
            .collect(),
        ..ContentStore::default()
    }
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_global_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("global_search");

    for size in [50, 500, 5000].iter() {
        let content = create_content(*size);

        group.bench_with_input(BenchmarkId::new("title_prefix", size), &content, |b, content| {
            b.iter(|| black_box(global_search(content, "controls", 5)));
        });

        group.bench_with_input(BenchmarkId::new("per_word", size), &content, |b, content| {
            b.iter(|| black_box(global_search(content, "board evidence review", 5)));
        });
    }

    group.finish();
}

fn bench_streak(c: &mut Criterion) {
    let mut group = c.benchmark_group("streak");
    let today = datetime!(2026-10-19 09:00 UTC);

    for days in [7, 90, 365].iter() {
        let mut record = ProgressRecord::new();
        for d in (0..*days).rev() {
            let _ = record.track_visit(today - Duration::days(d));
        }

        group.bench_with_input(BenchmarkId::from_parameter(days), &record, |b, record| {
            b.iter(|| black_box(record.streak(today.date())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_global_search, bench_streak);
criterion_main!(benches);
