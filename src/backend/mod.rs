//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface over the PDF library, isolating
//! the concrete implementation (lopdf) from the Markdown reconstruction
//! logic. Every page is exposed as an immutable snapshot in top-left-origin
//! coordinates.

mod memory;
mod pdf;

pub use memory::{MemoryDocument, MemoryPage};
pub use pdf::{PdfFile, PdfFilePage};

use crate::error::{ExtractError, Result};
use crate::model::{
    text_in_rect, Annotation, Bookmark, DocumentInfo, EmbeddedFile, PageImage, PageLink,
    Permissions, Rect, TableGrid, TextBlock, VectorPath,
};

/// Abstract interface for an opened PDF document.
pub trait PdfDocument {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Load a page by number (1-indexed).
    fn page(&self, number: u32) -> Result<Box<dyn PdfPage + '_>>;

    /// Whether the document carries an encryption dictionary.
    fn is_encrypted(&self) -> bool;

    /// Whether content is still locked behind a user password.
    fn needs_password(&self) -> bool;

    /// Try a password; returns true when it unlocks the document.
    fn authenticate(&mut self, password: &str) -> bool;

    /// Raw `/Info` values.
    fn info(&self) -> DocumentInfo;

    /// Flattened outline in document order.
    fn outline(&self) -> Vec<Bookmark>;

    /// Attached files.
    fn embedded_files(&self) -> Vec<EmbeddedFile>;

    /// Permission flags; all granted for unencrypted documents.
    fn permissions(&self) -> Permissions;
}

/// Abstract interface for one page's primitives.
///
/// Element-level failures are reported per item so the caller can skip a
/// single image or annotation and keep the rest.
pub trait PdfPage {
    /// Page number (1-indexed).
    fn number(&self) -> u32;

    /// Page rectangle, origin at the top-left corner.
    fn bounds(&self) -> Rect;

    /// Text blocks in content order.
    fn text_blocks(&self) -> &[TextBlock];

    /// Detected tables.
    fn tables(&self) -> std::result::Result<Vec<TableGrid>, ExtractError>;

    /// Raster images; a failed entry still occupies its index.
    fn images(&self) -> Vec<std::result::Result<PageImage, ExtractError>>;

    /// Markup annotations, link annotations included.
    fn annotations(&self) -> Vec<std::result::Result<Annotation, ExtractError>>;

    /// URI link annotations.
    fn links(&self) -> std::result::Result<Vec<PageLink>, ExtractError>;

    /// Painted vector paths.
    fn drawings(&self) -> std::result::Result<Vec<VectorPath>, ExtractError>;

    /// Page text lying under `rect`.
    fn text_in_rect(&self, rect: &Rect) -> String {
        text_in_rect(self.text_blocks(), rect)
    }
}

impl<T: PdfPage + ?Sized> PdfPage for &T {
    fn number(&self) -> u32 {
        (**self).number()
    }

    fn bounds(&self) -> Rect {
        (**self).bounds()
    }

    fn text_blocks(&self) -> &[TextBlock] {
        (**self).text_blocks()
    }

    fn tables(&self) -> std::result::Result<Vec<TableGrid>, ExtractError> {
        (**self).tables()
    }

    fn images(&self) -> Vec<std::result::Result<PageImage, ExtractError>> {
        (**self).images()
    }

    fn annotations(&self) -> Vec<std::result::Result<Annotation, ExtractError>> {
        (**self).annotations()
    }

    fn links(&self) -> std::result::Result<Vec<PageLink>, ExtractError> {
        (**self).links()
    }

    fn drawings(&self) -> std::result::Result<Vec<VectorPath>, ExtractError> {
        (**self).drawings()
    }

    fn text_in_rect(&self, rect: &Rect) -> String {
        (**self).text_in_rect(rect)
    }
}
