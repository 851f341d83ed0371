//! Document assembly: password gating, metadata, page blocks and trailing
//! document sections.
//!
//! # Example
//!
//! ```no_run
//! use pagedown::convert::{ConvertOptions, Converter};
//!
//! fn main() -> pagedown::Result<()> {
//!     let options = ConvertOptions::new().with_password("secret");
//!     let conversion = Converter::new(options).convert_file("document.pdf")?;
//!     println!("{}", conversion.markdown);
//!     Ok(())
//! }
//! ```

mod sections;

pub use sections::{
    embedded_files_section, human_size, page_heading, security_section, table_of_contents,
};

use std::path::Path;
use std::sync::Arc;

use crate::backend::{PdfDocument, PdfFile};
use crate::error::{Error, Result};
use crate::model::Metadata;
use crate::render::{
    ConversionStats, FrontMatter, PageOutput, PageReconstructor, PageSelection, RenderOptions,
    YamlFrontMatter,
};

/// Options for document conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Password for encrypted documents
    pub password: Option<String>,

    /// Rendering options
    pub render: RenderOptions,

    /// Pages to reconstruct
    pub pages: PageSelection,

    /// Front matter formatter; `None` leaves it out
    pub front_matter: Option<Arc<dyn FrontMatter>>,

    /// Append the embedded-file listing and the security summary
    pub include_document_sections: bool,

    /// Insert a table of contents built from the outline
    pub include_toc: bool,
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set document password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set rendering options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render = options;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Set the front matter formatter.
    pub fn with_front_matter(mut self, front_matter: Arc<dyn FrontMatter>) -> Self {
        self.front_matter = Some(front_matter);
        self
    }

    /// Leave out the front matter block.
    pub fn without_front_matter(mut self) -> Self {
        self.front_matter = None;
        self
    }

    /// Enable or disable the trailing document sections.
    pub fn with_document_sections(mut self, include: bool) -> Self {
        self.include_document_sections = include;
        self
    }

    /// Enable or disable the table of contents.
    pub fn with_toc(mut self, include: bool) -> Self {
        self.include_toc = include;
        self
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            password: None,
            render: RenderOptions::default(),
            pages: PageSelection::All,
            front_matter: Some(Arc::new(YamlFrontMatter)),
            include_document_sections: true,
            include_toc: false,
        }
    }
}

/// Result of converting a document.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The assembled Markdown
    pub markdown: String,

    /// Document metadata, bookmarks included
    pub metadata: Metadata,

    /// Counts accumulated over every converted page
    pub stats: ConversionStats,
}

/// Unlock an encrypted document.
///
/// A supplied password must authenticate; without one, the document must
/// be readable with the empty user password.
pub fn unlock<D: PdfDocument + ?Sized>(doc: &mut D, password: Option<&str>) -> Result<()> {
    if !doc.is_encrypted() {
        return Ok(());
    }

    match password.filter(|p| !p.is_empty()) {
        Some(password) => {
            if doc.authenticate(password) {
                Ok(())
            } else {
                Err(Error::InvalidPassword)
            }
        }
        None if doc.needs_password() => Err(Error::PasswordRequired),
        None => Ok(()),
    }
}

/// Document metadata with the outline attached.
pub fn extract_metadata<D: PdfDocument + ?Sized>(doc: &D) -> Metadata {
    let mut metadata = Metadata::from_info(&doc.info(), doc.page_count(), doc.is_encrypted());
    metadata.bookmarks = doc.outline();
    metadata
}

/// Assembles a whole document from reconstructed pages.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    /// Create a converter with the given options.
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a PDF file.
    pub fn convert_file<P: AsRef<Path>>(&self, path: P) -> Result<Conversion> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let mut doc = PdfFile::open(path)?;
        self.convert_document(&mut doc)
    }

    /// Convert a PDF held in memory.
    pub fn convert_bytes(&self, data: &[u8]) -> Result<Conversion> {
        let mut doc = PdfFile::from_bytes(data)?;
        self.convert_document(&mut doc)
    }

    /// Convert an already opened document.
    pub fn convert_document<D: PdfDocument + ?Sized>(&self, doc: &mut D) -> Result<Conversion> {
        unlock(doc, self.options.password.as_deref())?;
        self.options.render.images.prepare()?;

        let metadata = extract_metadata(doc);
        let mut parts: Vec<String> = Vec::new();

        if let Some(front_matter) = &self.options.front_matter {
            parts.push(front_matter.render(&metadata));
        }
        if self.options.include_toc {
            parts.extend(table_of_contents(&metadata.bookmarks));
        }

        let reconstructor = PageReconstructor::new(&self.options.render);
        let mut stats = ConversionStats::new();
        for number in 1..=doc.page_count() {
            if !self.options.pages.includes(number) {
                continue;
            }
            let output = match self.convert_page(doc, &reconstructor, number) {
                Ok(output) => output,
                Err(e) if e.is_access_denied() => return Err(e),
                Err(e) => {
                    log::warn!("page {}: cannot load page: {}", number, e);
                    PageOutput {
                        number,
                        ..Default::default()
                    }
                }
            };
            stats.add_page(&output.stats);
            parts.push(page_heading(number));
            parts.push(output.markdown);
        }

        if self.options.include_document_sections {
            parts.extend(embedded_files_section(&doc.embedded_files()));
            parts.extend(security_section(doc.is_encrypted(), doc.permissions()));
        }

        log::debug!(
            "converted {} of {} pages: {} tables, {} images, {} skipped elements",
            stats.pages,
            metadata.pages,
            stats.tables,
            stats.images,
            stats.skipped
        );

        Ok(Conversion {
            markdown: parts.join("\n"),
            metadata,
            stats,
        })
    }

    fn convert_page<D: PdfDocument + ?Sized>(
        &self,
        doc: &D,
        reconstructor: &PageReconstructor<'_>,
        number: u32,
    ) -> Result<PageOutput> {
        let page = doc.page(number)?;
        Ok(reconstructor.reconstruct(&*page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryDocument, MemoryPage};
    use crate::model::{Bookmark, DocumentInfo, FontFlags, Permissions};
    use crate::render::JsonFrontMatter;

    fn document() -> MemoryDocument {
        MemoryDocument::new()
            .with_info(DocumentInfo {
                title: Some("Annual Report".to_string()),
                ..Default::default()
            })
            .with_page(MemoryPage::letter(1).with_text("First", 10.0, FontFlags::NONE, 72.0, 72.0))
            .with_page(MemoryPage::letter(2).with_text("Second", 10.0, FontFlags::NONE, 72.0, 72.0))
            .with_bookmark(Bookmark::new(1, "Start", Some(1)))
    }

    #[test]
    fn test_convert_document() {
        let mut doc = document();
        let conversion = Converter::default().convert_document(&mut doc).unwrap();

        assert_eq!(
            conversion.markdown,
            "---\ntitle: \"Annual Report\"\nauthor: \"Unknown\"\npages: 2\nencrypted: false\n---\n\n\
             \n\n## 📄 Page 1\n\nFirst\n\n## 📄 Page 2\n\nSecond"
        );
        assert_eq!(conversion.metadata.title, "Annual Report");
        assert_eq!(conversion.metadata.bookmark_titles(), vec!["Start"]);
        assert_eq!(conversion.stats.pages, 2);
        assert_eq!(conversion.stats.text_lines, 2);
    }

    #[test]
    fn test_page_selection_keeps_real_numbers() {
        let mut doc = document();
        let options = ConvertOptions::new()
            .without_front_matter()
            .with_pages(PageSelection::Pages(vec![2]));
        let conversion = Converter::new(options).convert_document(&mut doc).unwrap();
        assert_eq!(conversion.markdown, "\n## 📄 Page 2\n\nSecond");
        assert_eq!(conversion.stats.pages, 1);
        assert_eq!(conversion.metadata.pages, 2);
    }

    #[test]
    fn test_toc_and_json_front_matter() {
        let mut doc = document();
        let options = ConvertOptions::new()
            .with_front_matter(Arc::new(JsonFrontMatter))
            .with_toc(true);
        let conversion = Converter::new(options).convert_document(&mut doc).unwrap();
        assert!(conversion.markdown.starts_with("---\n{"));
        assert!(conversion
            .markdown
            .contains("## 📑 Table of Contents\n\n- [Start](#-page-1)\n"));
    }

    #[test]
    fn test_password_required() {
        let mut doc = document().with_password("secret");
        let err = Converter::default().convert_document(&mut doc).unwrap_err();
        assert!(matches!(err, Error::PasswordRequired));
        assert!(err.is_access_denied());
    }

    #[test]
    fn test_invalid_password() {
        let mut doc = document().with_password("secret");
        let options = ConvertOptions::new().with_password("guess");
        let err = Converter::new(options).convert_document(&mut doc).unwrap_err();
        assert!(matches!(err, Error::InvalidPassword));
    }

    #[test]
    fn test_encrypted_document_sections() {
        let mut doc = document()
            .with_password("secret")
            .with_permissions(Permissions {
                print: true,
                copy: false,
                modify: true,
            })
            .with_embedded_file("data.csv", 1536);
        let options = ConvertOptions::new()
            .with_password("secret")
            .without_front_matter();
        let conversion = Converter::new(options).convert_document(&mut doc).unwrap();

        assert!(conversion.metadata.encrypted);
        assert!(conversion
            .markdown
            .contains("\n## 📎 Embedded Files\n\n- **data.csv** (1.5 KB)\n"));
        assert!(conversion.markdown.contains("- **Can Copy:** No"));
        assert!(conversion.markdown.ends_with("- **Can Modify:** Yes\n"));
    }

    #[test]
    fn test_owner_only_encryption_needs_no_password() {
        let mut doc = document().with_owner_password("owner");
        let options = ConvertOptions::new().with_document_sections(false);
        let conversion = Converter::new(options).convert_document(&mut doc).unwrap();
        assert!(conversion.metadata.encrypted);
        assert!(conversion.markdown.contains("First"));
        assert!(!conversion.markdown.contains("Security Info"));
    }

    #[test]
    fn test_missing_file() {
        let err = Converter::default()
            .convert_file("/definitely/not/here.pdf")
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
