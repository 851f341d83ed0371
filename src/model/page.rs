//! Page-level primitives as delivered by a PDF library.

use super::Rect;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Span style bits, numbered the way MuPDF reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct FontFlags(pub u32);

impl FontFlags {
    pub const NONE: FontFlags = FontFlags(0);
    pub const SUPERSCRIPT: FontFlags = FontFlags(1);
    pub const ITALIC: FontFlags = FontFlags(2);
    pub const SERIFED: FontFlags = FontFlags(4);
    pub const MONOSPACED: FontFlags = FontFlags(8);
    pub const BOLD: FontFlags = FontFlags(16);

    /// Whether every bit of `other` is set.
    pub fn contains(self, other: FontFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_bold(self) -> bool {
        self.contains(Self::BOLD)
    }

    pub fn is_italic(self) -> bool {
        self.contains(Self::ITALIC)
    }

    /// Infer style from a PostScript base font name such as `Helvetica-BoldOblique`.
    pub fn from_font_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        let mut flags = Self::NONE;
        if lower.contains("bold") || lower.contains("black") || lower.contains("heavy") {
            flags = flags | Self::BOLD;
        }
        if lower.contains("italic") || lower.contains("oblique") {
            flags = flags | Self::ITALIC;
        }
        if lower.contains("courier") || lower.contains("mono") {
            flags = flags | Self::MONOSPACED;
        }
        if lower.contains("times") || (lower.contains("serif") && !lower.contains("sans")) {
            flags = flags | Self::SERIFED;
        }
        flags
    }
}

impl BitOr for FontFlags {
    type Output = FontFlags;

    fn bitor(self, rhs: FontFlags) -> FontFlags {
        FontFlags(self.0 | rhs.0)
    }
}

/// A run of text sharing one font, size and style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    /// Font size in points
    pub size: f32,
    pub flags: FontFlags,
    pub bbox: Rect,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, size: f32, flags: FontFlags, bbox: Rect) -> Self {
        Self {
            text: text.into(),
            size,
            flags,
            bbox,
        }
    }
}

/// Spans sharing a baseline, in left-to-right order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextLine {
    pub bbox: Rect,
    pub spans: Vec<TextSpan>,
}

impl TextLine {
    /// Build a line whose box covers all of its spans.
    pub fn from_spans(spans: Vec<TextSpan>) -> Self {
        let bbox = union_all(spans.iter().map(|s| s.bbox));
        Self { bbox, spans }
    }
}

/// A paragraph-like group of lines.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextBlock {
    pub bbox: Rect,
    pub lines: Vec<TextLine>,
}

impl TextBlock {
    /// Build a block whose box covers all of its lines.
    pub fn from_lines(lines: Vec<TextLine>) -> Self {
        let bbox = union_all(lines.iter().map(|l| l.bbox));
        Self { bbox, lines }
    }

    pub fn spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.lines.iter().flat_map(|l| l.spans.iter())
    }
}

fn union_all(mut rects: impl Iterator<Item = Rect>) -> Rect {
    match rects.next() {
        Some(first) => rects.fold(first, |acc, r| acc.union(&r)),
        None => Rect::default(),
    }
}

/// A detected table: a grid of optional cell strings and where it sits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableGrid {
    pub rows: Vec<Vec<Option<String>>>,
    pub bbox: Option<Rect>,
}

impl TableGrid {
    pub fn new(rows: Vec<Vec<Option<String>>>, bbox: Option<Rect>) -> Self {
        Self { rows, bbox }
    }

    /// Convenience constructor for grids with every cell present.
    pub fn from_strings<S: AsRef<str>>(rows: &[Vec<S>], bbox: Option<Rect>) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|c| Some(c.as_ref().to_string())).collect())
            .collect();
        Self { rows, bbox }
    }
}

/// Decoded 8-bit interleaved pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    /// Color channels per pixel, not counting alpha (1 gray, 3 RGB, 4 CMYK)
    pub components: u8,
    pub has_alpha: bool,
    pub samples: Vec<u8>,
}

impl PixelBuffer {
    /// Samples per pixel including alpha.
    pub fn channels(&self) -> usize {
        self.components as usize + usize::from(self.has_alpha)
    }

    /// Whether `samples` holds exactly `width * height * channels` bytes.
    pub fn is_consistent(&self) -> bool {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(self.channels()))
            == Some(self.samples.len())
    }
}

/// One raster image drawn on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageImage {
    /// Position among the page's images, used in file names
    pub index: usize,
    /// First rectangle the image is painted into, when known
    pub placement: Option<Rect>,
    pub pixels: PixelBuffer,
}

/// Annotation sub-types the renderer distinguishes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    Text,
    FreeText,
    Highlight,
    Underline,
    StrikeOut,
    Stamp,
    Link,
    Other(String),
}

impl AnnotationKind {
    /// Map a PDF `/Subtype` name.
    pub fn from_subtype(name: &str) -> Self {
        match name {
            "Text" => AnnotationKind::Text,
            "FreeText" => AnnotationKind::FreeText,
            "Highlight" => AnnotationKind::Highlight,
            "Underline" => AnnotationKind::Underline,
            "StrikeOut" => AnnotationKind::StrikeOut,
            "Stamp" => AnnotationKind::Stamp,
            "Link" => AnnotationKind::Link,
            other => AnnotationKind::Other(other.to_string()),
        }
    }
}

/// A markup annotation with an optional author comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub content: Option<String>,
    pub rect: Rect,
}

/// A clickable link annotation pointing at a URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLink {
    pub uri: String,
    pub rect: Rect,
}

/// Bounding box of one painted vector path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorPath {
    pub rect: Rect,
    pub stroke_width: Option<f32>,
}

/// Text of the spans whose centers fall inside `rect`.
///
/// Spans on the same line are joined with a space, lines with a space, so
/// the result always fits on one Markdown line.
pub fn text_in_rect(blocks: &[TextBlock], rect: &Rect) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for line in blocks.iter().flat_map(|b| b.lines.iter()) {
        for span in &line.spans {
            let (cx, cy) = span.bbox.center();
            if rect.contains_point(cx, cy) {
                let text = span.text.trim();
                if !text.is_empty() {
                    parts.push(text);
                }
            }
        }
    }
    parts.join(" ")
}
