//! Markup annotations as blockquotes.

use crate::backend::PdfPage;
use crate::model::{Annotation, AnnotationKind, Element, ElementKind};

/// Blockquote label for annotation kinds that are rendered.
pub fn annotation_label(kind: &AnnotationKind) -> Option<&'static str> {
    match kind {
        AnnotationKind::Text | AnnotationKind::FreeText => Some("📝 Note"),
        AnnotationKind::Highlight => Some("🔆 Highlight"),
        AnnotationKind::Underline => Some("📎 Underline"),
        AnnotationKind::StrikeOut => Some("✂️ Strikeout"),
        AnnotationKind::Stamp => Some("🔖 Stamp"),
        AnnotationKind::Link | AnnotationKind::Other(_) => None,
    }
}

/// Render one annotation as `> {label}: {content}`.
///
/// The author comment wins; highlights without one quote the page text
/// under their rectangle. Returns `None` when there is nothing to show.
pub fn render_annotation(annotation: &Annotation, page: &dyn PdfPage) -> Option<Element> {
    let label = annotation_label(&annotation.kind)?;

    let mut content = annotation
        .content
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if content.is_empty() && annotation.kind == AnnotationKind::Highlight {
        content = page.text_in_rect(&annotation.rect).trim().to_string();
    }
    if content.is_empty() {
        return None;
    }

    // Keep multi-line comments inside the blockquote
    let content = content.lines().collect::<Vec<_>>().join("\n> ");
    Some(
        Element::new(
            ElementKind::Annotation,
            annotation.rect.y0,
            format!("> {}: {}", label, content),
        )
        .with_bbox(Some(annotation.rect)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryPage;
    use crate::model::{FontFlags, Rect};

    fn annotation(kind: AnnotationKind, content: Option<&str>) -> Annotation {
        Annotation {
            kind,
            content: content.map(str::to_string),
            rect: Rect::new(72.0, 100.0, 300.0, 112.0),
        }
    }

    #[test]
    fn test_comment_is_rendered() {
        let page = MemoryPage::letter(1);
        let element =
            render_annotation(&annotation(AnnotationKind::Text, Some(" Check this ")), &page)
                .unwrap();
        assert_eq!(element.content, "> 📝 Note: Check this");
        assert_eq!(element.y, 100.0);
        assert_eq!(element.kind, ElementKind::Annotation);
    }

    #[test]
    fn test_highlight_falls_back_to_page_text() {
        let page = MemoryPage::letter(1).with_text(
            "important words",
            10.0,
            FontFlags::NONE,
            80.0,
            101.0,
        );
        let element =
            render_annotation(&annotation(AnnotationKind::Highlight, None), &page).unwrap();
        assert_eq!(element.content, "> 🔆 Highlight: important words");
    }

    #[test]
    fn test_only_highlights_fall_back() {
        let page =
            MemoryPage::letter(1).with_text("words", 10.0, FontFlags::NONE, 80.0, 101.0);
        assert!(render_annotation(&annotation(AnnotationKind::Underline, None), &page).is_none());
        assert!(
            render_annotation(&annotation(AnnotationKind::Highlight, Some("  ")), &page).is_some()
        );
    }

    #[test]
    fn test_empty_highlight_is_dropped() {
        let page = MemoryPage::letter(1);
        assert!(render_annotation(&annotation(AnnotationKind::Highlight, None), &page).is_none());
    }

    #[test]
    fn test_unlabelled_kinds_are_skipped() {
        let page = MemoryPage::letter(1);
        assert!(render_annotation(&annotation(AnnotationKind::Link, Some("x")), &page).is_none());
        assert!(render_annotation(
            &annotation(AnnotationKind::Other("Widget".into()), Some("x")),
            &page
        )
        .is_none());
    }

    #[test]
    fn test_labels() {
        assert_eq!(annotation_label(&AnnotationKind::FreeText), Some("📝 Note"));
        assert_eq!(annotation_label(&AnnotationKind::StrikeOut), Some("✂️ Strikeout"));
        assert_eq!(annotation_label(&AnnotationKind::Stamp), Some("🔖 Stamp"));
    }

    #[test]
    fn test_multiline_comment_stays_quoted() {
        let page = MemoryPage::letter(1);
        let element = render_annotation(
            &annotation(AnnotationKind::Stamp, Some("Approved\nby QA")),
            &page,
        )
        .unwrap();
        assert_eq!(element.content, "> 🔖 Stamp: Approved\n> by QA");
    }
}
