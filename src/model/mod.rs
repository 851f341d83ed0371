//! Data model shared by the PDF backends and the Markdown renderers.
//!
//! Page types are immutable snapshots taken from a PDF library; the
//! reconstruction engine reads them and produces [`Element`]s.

mod document;
mod element;
mod geometry;
mod page;

pub use document::{Bookmark, DocumentInfo, EmbeddedFile, Metadata, Permissions};
pub use element::{Element, ElementKind};
pub use geometry::Rect;
pub use page::{
    text_in_rect, Annotation, AnnotationKind, FontFlags, PageImage, PageLink, PixelBuffer,
    TableGrid, TextBlock, TextLine, TextSpan, VectorPath,
};
