//! # pagedown
//!
//! Reconstructs PDF pages into reading-ordered Markdown.
//!
//! Each page's text, tables, images, annotations, links and ruling lines
//! are turned into positioned elements, sorted top to bottom and rendered
//! as one Markdown block per page.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagedown::convert_file;
//!
//! fn main() -> pagedown::Result<()> {
//!     let conversion = convert_file("document.pdf")?;
//!     println!("{}", conversion.markdown);
//!     println!("title: {}", conversion.metadata.title);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Headings** inferred from font size relative to the page average
//! - **Lists** normalized from bullet glyphs and ordinals
//! - **Tables** rendered as pipe tables, with overlapping text suppressed
//! - **Images** embedded as data URIs or written next to the output
//! - **Annotations** and **links** placed where they occur on the page
//! - **Encrypted documents** opened with a user or owner password

pub mod backend;
pub mod convert;
pub mod detect;
pub mod error;
pub mod model;
pub mod render;

// Re-export commonly used types
pub use backend::{MemoryDocument, MemoryPage, PdfDocument, PdfFile, PdfPage};
pub use convert::{Conversion, ConvertOptions, Converter};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, PdfFormat};
pub use error::{Error, ExtractError, Result};
pub use model::{Element, ElementKind, Metadata, Rect};
pub use render::{
    ConversionStats, FrontMatter, ImageMode, ImageOptions, JsonFrontMatter, PageReconstructor,
    PageSelection, RenderOptions, YamlFrontMatter,
};

use std::path::Path;

/// Convert a PDF file to Markdown with default options.
///
/// # Example
///
/// ```no_run
/// let conversion = pagedown::convert_file("document.pdf").unwrap();
/// std::fs::write("document.md", conversion.markdown).unwrap();
/// ```
pub fn convert_file<P: AsRef<Path>>(path: P) -> Result<Conversion> {
    Converter::default().convert_file(path)
}

/// Convert a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use pagedown::{convert_file_with_options, ConvertOptions, RenderOptions};
///
/// let options = ConvertOptions::new()
///     .with_password("secret")
///     .with_render_options(RenderOptions::new().with_image_dir("./images"));
/// let conversion = convert_file_with_options("encrypted.pdf", &options).unwrap();
/// ```
pub fn convert_file_with_options<P: AsRef<Path>>(
    path: P,
    options: &ConvertOptions,
) -> Result<Conversion> {
    Converter::new(options.clone()).convert_file(path)
}

/// Convert a PDF held in memory.
///
/// # Example
///
/// ```no_run
/// use pagedown::{convert_bytes, ConvertOptions};
///
/// let data = std::fs::read("document.pdf").unwrap();
/// let conversion = convert_bytes(&data, &ConvertOptions::default()).unwrap();
/// ```
pub fn convert_bytes(data: &[u8], options: &ConvertOptions) -> Result<Conversion> {
    Converter::new(options.clone()).convert_bytes(data)
}

/// Convert any [`PdfDocument`], e.g. a [`MemoryDocument`] built from
/// primitives extracted by another PDF library.
pub fn convert_document<D: PdfDocument + ?Sized>(
    doc: &mut D,
    options: &ConvertOptions,
) -> Result<Conversion> {
    Converter::new(options.clone()).convert_document(doc)
}
