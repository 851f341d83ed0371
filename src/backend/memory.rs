//! In-memory document snapshots.
//!
//! Lets callers that already extracted primitives with another PDF library
//! drive the reconstruction engine, and gives tests full control over
//! element failures.

use super::{PdfDocument, PdfPage};
use crate::error::{Error, ExtractError, Result};
use crate::model::{
    Annotation, Bookmark, DocumentInfo, EmbeddedFile, FontFlags, PageImage, PageLink,
    Permissions, Rect, TableGrid, TextBlock, TextLine, TextSpan, VectorPath,
};

/// A page held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    number: u32,
    bounds: Rect,
    blocks: Vec<TextBlock>,
    tables: std::result::Result<Vec<TableGrid>, String>,
    images: Vec<std::result::Result<PageImage, String>>,
    annotations: Vec<std::result::Result<Annotation, String>>,
    links: std::result::Result<Vec<PageLink>, String>,
    drawings: std::result::Result<Vec<VectorPath>, String>,
}

impl MemoryPage {
    /// Create an empty page of the given size.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            bounds: Rect::new(0.0, 0.0, width, height),
            blocks: Vec::new(),
            tables: Ok(Vec::new()),
            images: Vec::new(),
            annotations: Vec::new(),
            links: Ok(Vec::new()),
            drawings: Ok(Vec::new()),
        }
    }

    /// Create an empty US Letter page.
    pub fn letter(number: u32) -> Self {
        Self::new(number, 612.0, 792.0)
    }

    /// Add a text block.
    pub fn with_block(mut self, block: TextBlock) -> Self {
        self.blocks.push(block);
        self
    }

    /// Add a block holding a single line made of `spans`.
    pub fn with_line(self, spans: Vec<TextSpan>) -> Self {
        self.with_block(TextBlock::from_lines(vec![TextLine::from_spans(spans)]))
    }

    /// Add a single-span line of plain text at the given top edge.
    pub fn with_text(self, text: &str, size: f32, flags: FontFlags, x: f32, y: f32) -> Self {
        let width = text.chars().count() as f32 * size * 0.5;
        let bbox = Rect::new(x, y, x + width, y + size);
        self.with_line(vec![TextSpan::new(text, size, flags, bbox)])
    }

    /// Add a detected table.
    pub fn with_table(mut self, table: TableGrid) -> Self {
        if let Ok(tables) = &mut self.tables {
            tables.push(table);
        }
        self
    }

    /// Make table detection fail for this page.
    pub fn with_failing_tables(mut self, reason: impl Into<String>) -> Self {
        self.tables = Err(reason.into());
        self
    }

    /// Add an image; its index is taken from its position on the page.
    pub fn with_image(mut self, mut image: PageImage) -> Self {
        image.index = self.images.len();
        self.images.push(Ok(image));
        self
    }

    /// Add an image entry that fails to decode.
    pub fn with_broken_image(mut self, reason: impl Into<String>) -> Self {
        self.images.push(Err(reason.into()));
        self
    }

    /// Add an annotation.
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(Ok(annotation));
        self
    }

    /// Add an annotation entry that cannot be read.
    pub fn with_broken_annotation(mut self, reason: impl Into<String>) -> Self {
        self.annotations.push(Err(reason.into()));
        self
    }

    /// Add a URI link.
    pub fn with_link(mut self, uri: impl Into<String>, rect: Rect) -> Self {
        if let Ok(links) = &mut self.links {
            links.push(PageLink {
                uri: uri.into(),
                rect,
            });
        }
        self
    }

    /// Make link enumeration fail for this page.
    pub fn with_failing_links(mut self, reason: impl Into<String>) -> Self {
        self.links = Err(reason.into());
        self
    }

    /// Add a painted vector path.
    pub fn with_drawing(mut self, path: VectorPath) -> Self {
        if let Ok(drawings) = &mut self.drawings {
            drawings.push(path);
        }
        self
    }

    /// Make drawing enumeration fail for this page.
    pub fn with_failing_drawings(mut self, reason: impl Into<String>) -> Self {
        self.drawings = Err(reason.into());
        self
    }
}

impl PdfPage for MemoryPage {
    fn number(&self) -> u32 {
        self.number
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn text_blocks(&self) -> &[TextBlock] {
        &self.blocks
    }

    fn tables(&self) -> std::result::Result<Vec<TableGrid>, ExtractError> {
        self.tables.clone().map_err(ExtractError::Pdf)
    }

    fn images(&self) -> Vec<std::result::Result<PageImage, ExtractError>> {
        self.images
            .iter()
            .map(|i| i.clone().map_err(ExtractError::UnsupportedImage))
            .collect()
    }

    fn annotations(&self) -> Vec<std::result::Result<Annotation, ExtractError>> {
        self.annotations
            .iter()
            .map(|a| a.clone().map_err(ExtractError::Pdf))
            .collect()
    }

    fn links(&self) -> std::result::Result<Vec<PageLink>, ExtractError> {
        self.links.clone().map_err(ExtractError::Pdf)
    }

    fn drawings(&self) -> std::result::Result<Vec<VectorPath>, ExtractError> {
        self.drawings.clone().map_err(ExtractError::Geometry)
    }
}

/// A whole document held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pages: Vec<MemoryPage>,
    info: DocumentInfo,
    outline: Vec<Bookmark>,
    embedded: Vec<EmbeddedFile>,
    encryption: Option<Encryption>,
    unlocked: bool,
}

#[derive(Debug, Clone, Default)]
struct Encryption {
    user_password: Option<String>,
    owner_password: Option<String>,
    permissions: Permissions,
}

impl MemoryDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page. Pages are renumbered in insertion order.
    pub fn with_page(mut self, mut page: MemoryPage) -> Self {
        page.number = self.pages.len() as u32 + 1;
        self.pages.push(page);
        self
    }

    /// Set the raw document information.
    pub fn with_info(mut self, info: DocumentInfo) -> Self {
        self.info = info;
        self
    }

    /// Append an outline entry.
    pub fn with_bookmark(mut self, bookmark: Bookmark) -> Self {
        self.outline.push(bookmark);
        self
    }

    /// Attach a file.
    pub fn with_embedded_file(mut self, name: impl Into<String>, size: u64) -> Self {
        self.embedded.push(EmbeddedFile {
            name: name.into(),
            size,
        });
        self
    }

    /// Encrypt with a user password that must be supplied to read pages.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.encryption.get_or_insert_with(Encryption::default).user_password =
            Some(password.into());
        self
    }

    /// Encrypt with an owner password only; pages stay readable.
    pub fn with_owner_password(mut self, password: impl Into<String>) -> Self {
        self.encryption.get_or_insert_with(Encryption::default).owner_password =
            Some(password.into());
        self
    }

    /// Encrypt with the given permissions.
    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.encryption.get_or_insert_with(Encryption::default).permissions = permissions;
        self
    }
}

impl PdfDocument for MemoryDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page(&self, number: u32) -> Result<Box<dyn PdfPage + '_>> {
        if self.needs_password() {
            return Err(Error::PasswordRequired);
        }
        let index = number
            .checked_sub(1)
            .ok_or(Error::PageOutOfRange(number, self.page_count()))?;
        let page = self
            .pages
            .get(index as usize)
            .ok_or(Error::PageOutOfRange(number, self.page_count()))?;
        Ok(Box::new(page))
    }

    fn is_encrypted(&self) -> bool {
        self.encryption.is_some()
    }

    fn needs_password(&self) -> bool {
        !self.unlocked
            && self
                .encryption
                .as_ref()
                .is_some_and(|e| e.user_password.is_some())
    }

    fn authenticate(&mut self, password: &str) -> bool {
        let Some(encryption) = &self.encryption else {
            return true;
        };
        let matches = encryption.user_password.as_deref() == Some(password)
            || encryption.owner_password.as_deref() == Some(password);
        if matches {
            self.unlocked = true;
        }
        matches
    }

    fn info(&self) -> DocumentInfo {
        self.info.clone()
    }

    fn outline(&self) -> Vec<Bookmark> {
        self.outline.clone()
    }

    fn embedded_files(&self) -> Vec<EmbeddedFile> {
        self.embedded.clone()
    }

    fn permissions(&self) -> Permissions {
        self.encryption
            .as_ref()
            .map(|e| e.permissions)
            .unwrap_or_default()
    }
}
