//! Benchmarks for page reconstruction.
//!
//! Run with: cargo bench
//!
//! Pages are synthetic in-memory pages, so only the reconstruction engine
//! is measured, not PDF parsing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pagedown::model::{Annotation, AnnotationKind, FontFlags, Rect, TableGrid, VectorPath};
use pagedown::{ConvertOptions, MemoryDocument, MemoryPage, PageReconstructor, RenderOptions};

/// A letter page with a heading, body lines, a table and some decorations.
fn create_test_page(number: u32, lines: usize) -> MemoryPage {
    let mut page = MemoryPage::letter(number).with_text(
        "Quarterly results",
        22.0,
        FontFlags::BOLD,
        72.0,
        60.0,
    );

    for i in 0..lines {
        let y = 100.0 + i as f32 * 14.0;
        let text = match i % 4 {
            0 => format!("• Item {} with details at https://example.com/{}", i, i),
            1 => format!("{}. Numbered entry for line {}", i, i),
            _ => format!("Body text line {} for benchmark measurement", i),
        };
        page = page.with_text(&text, 10.0, FontFlags::NONE, 72.0, y);
    }

    page.with_table(TableGrid::from_strings(
        &[
            vec!["Region", "Q1", "Q2"],
            vec!["North", "10", "12"],
            vec!["South", "8", "9"],
        ],
        Some(Rect::new(72.0, 700.0, 400.0, 760.0)),
    ))
    .with_annotation(Annotation {
        kind: AnnotationKind::Highlight,
        content: Some("Important".to_string()),
        rect: Rect::new(72.0, 100.0, 300.0, 110.0),
    })
    .with_link("https://example.org", Rect::new(400.0, 80.0, 500.0, 90.0))
    .with_drawing(VectorPath {
        rect: Rect::new(50.0, 90.0, 560.0, 91.0),
        stroke_width: Some(1.0),
    })
}

/// Benchmark single-page reconstruction at various densities.
fn bench_page_reconstruction(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_reconstruction");
    let options = RenderOptions::default();

    for lines in [10, 40, 100].iter() {
        let page = create_test_page(1, *lines);
        group.bench_function(format!("{}_lines", lines), |b| {
            let reconstructor = PageReconstructor::new(&options);
            b.iter(|| reconstructor.reconstruct(black_box(&page)));
        });
    }

    group.finish();
}

/// Benchmark whole-document assembly.
fn bench_document_conversion(c: &mut Criterion) {
    let mut doc = MemoryDocument::new();
    for number in 1..=10 {
        doc = doc.with_page(create_test_page(number, 40));
    }
    let options = ConvertOptions::new().with_toc(true);

    c.bench_function("document_10_pages", |b| {
        b.iter(|| pagedown::convert_document(black_box(&mut doc), &options).unwrap());
    });
}

criterion_group!(benches, bench_page_reconstruction, bench_document_conversion);
criterion_main!(benches);
