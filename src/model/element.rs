//! The unit of page output: one positioned, already-rendered piece of Markdown.

use super::Rect;

/// What produced an [`Element`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Table,
    Text,
    Image,
    Annotation,
    Link,
    Rule,
}

/// A rendered page fragment positioned by its top edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    /// Top edge in page space; smaller values come first
    pub y: f32,
    pub content: String,
    pub bbox: Option<Rect>,
}

impl Element {
    pub fn new(kind: ElementKind, y: f32, content: impl Into<String>) -> Self {
        Self {
            kind,
            y,
            content: content.into(),
            bbox: None,
        }
    }

    pub fn with_bbox(mut self, bbox: Option<Rect>) -> Self {
        self.bbox = bbox;
        self
    }

    /// Markdown for this element as one entry of the page's output lines.
    ///
    /// Block-level kinds are padded with blank lines so they never merge
    /// with a neighbouring paragraph.
    pub fn render(&self) -> String {
        match self.kind {
            ElementKind::Rule => "\n---\n".to_string(),
            ElementKind::Table | ElementKind::Image | ElementKind::Annotation | ElementKind::Link => {
                format!("\n{}\n", self.content)
            }
            ElementKind::Text => self.content.clone(),
        }
    }
}
