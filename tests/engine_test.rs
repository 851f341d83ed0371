//! End-to-end tests over in-memory documents.

use pagedown::model::{Annotation, AnnotationKind, FontFlags, Rect, TableGrid, VectorPath};
use pagedown::{
    convert_document, ConvertOptions, Error, MemoryDocument, MemoryPage, PageReconstructor,
    RenderOptions,
};

fn bare() -> ConvertOptions {
    ConvertOptions::new()
        .without_front_matter()
        .with_document_sections(false)
}

fn page_markdown(page: MemoryPage) -> String {
    let options = RenderOptions::default();
    PageReconstructor::new(&options).reconstruct(&page).markdown
}

#[test]
fn test_large_text_becomes_title() {
    let mut page = MemoryPage::letter(1).with_text("Report", 24.0, FontFlags::NONE, 72.0, 50.0);
    for i in 0..7 {
        page = page.with_text("body text", 8.0, FontFlags::NONE, 72.0, 100.0 + i as f32 * 20.0);
    }

    let markdown = page_markdown(page);
    let first = markdown.lines().next().unwrap();
    assert_eq!(first, "# Report");
    assert!(!markdown.contains("# body"));
}

#[test]
fn test_table_only_page() {
    let table = TableGrid::from_strings(
        &[vec!["A", "B"], vec!["1", "2"]],
        Some(Rect::new(72.0, 100.0, 300.0, 140.0)),
    );
    let mut doc = MemoryDocument::new().with_page(MemoryPage::letter(1).with_table(table));

    let conversion = convert_document(&mut doc, &bare()).unwrap();
    assert_eq!(
        conversion.markdown,
        "\n## 📄 Page 1\n\n\n| A | B |\n| --- | --- |\n| 1 | 2 |\n"
    );
    assert_eq!(conversion.stats.tables, 1);
    assert_eq!(conversion.stats.text_lines, 0);
}

#[test]
fn test_text_under_table_is_not_repeated() {
    let table = TableGrid::from_strings(
        &[vec!["Name", "Qty"], vec!["Bolt", "4"]],
        Some(Rect::new(72.0, 100.0, 300.0, 140.0)),
    );
    let page = MemoryPage::letter(1)
        .with_text("Name Qty", 10.0, FontFlags::NONE, 72.0, 105.0)
        .with_text("After the table", 10.0, FontFlags::NONE, 72.0, 200.0)
        .with_table(table);

    let markdown = page_markdown(page);
    assert_eq!(markdown.matches("Name").count(), 1);
    assert!(markdown.ends_with("| Bolt | 4 |\n\nAfter the table"));
}

#[test]
fn test_encrypted_document_without_password() {
    let mut doc = MemoryDocument::new()
        .with_page(MemoryPage::letter(1).with_text("secret", 10.0, FontFlags::NONE, 72.0, 72.0))
        .with_password("pw");

    let err = convert_document(&mut doc, &bare()).unwrap_err();
    assert!(err.is_access_denied());
    assert!(matches!(err, Error::PasswordRequired));

    let conversion = convert_document(&mut doc, &bare().with_password("pw")).unwrap();
    assert!(conversion.markdown.ends_with("secret"));
}

#[test]
fn test_link_annotation_for_visible_url_is_dropped() {
    let page = MemoryPage::letter(1)
        .with_text(
            "Visit https://example.com today",
            10.0,
            FontFlags::NONE,
            72.0,
            100.0,
        )
        .with_link("https://example.com", Rect::new(100.0, 100.0, 200.0, 110.0))
        .with_link("https://other.org", Rect::new(400.0, 300.0, 500.0, 310.0));

    let markdown = page_markdown(page);
    assert_eq!(
        markdown,
        "Visit [https://example.com](https://example.com) today\n\
         \n[https://other.org](https://other.org)\n"
    );
}

#[test]
fn test_equal_positions_keep_extractor_order() {
    let page = MemoryPage::letter(1)
        .with_text("Later", 10.0, FontFlags::NONE, 72.0, 300.0)
        .with_text("Earlier", 10.0, FontFlags::NONE, 72.0, 100.0)
        .with_annotation(Annotation {
            kind: AnnotationKind::Text,
            content: Some("side note".to_string()),
            rect: Rect::new(500.0, 100.0, 520.0, 120.0),
        })
        .with_drawing(VectorPath {
            rect: Rect::new(50.0, 100.0, 560.0, 101.0),
            stroke_width: Some(1.0),
        });

    let markdown = page_markdown(page);
    assert_eq!(
        markdown,
        "Earlier\n\n> 📝 Note: side note\n\n\n---\n\nLater"
    );
}

#[test]
fn test_failures_do_not_abort_the_page() {
    let page = MemoryPage::letter(1)
        .with_text("Still here", 10.0, FontFlags::NONE, 72.0, 72.0)
        .with_failing_tables("broken table grid")
        .with_broken_image("bad filter")
        .with_broken_annotation("dangling reference")
        .with_failing_drawings("bad operator");

    let options = RenderOptions::default();
    let output = PageReconstructor::new(&options).reconstruct(&page);
    assert_eq!(output.markdown, "Still here");
    assert_eq!(output.stats.skipped, 4);
}

#[test]
fn test_lists_and_styles() {
    let page = MemoryPage::letter(1)
        .with_text("• first", 10.0, FontFlags::NONE, 72.0, 100.0)
        .with_text("b) second", 10.0, FontFlags::NONE, 72.0, 120.0)
        .with_text("strong", 10.0, FontFlags::BOLD, 72.0, 140.0);

    assert_eq!(page_markdown(page), "- first\nb. second\n**strong**");
}
