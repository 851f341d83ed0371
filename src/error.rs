//! Error types for pagedown.
//!
//! Two layers: [`Error`] is fatal and crosses the public API, while
//! [`ExtractError`] describes a single page element that could not be read
//! and is absorbed by the page reconstruction engine.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pagedown operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors that abort a whole conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source document does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The document is encrypted and no password was supplied.
    #[error("Document is encrypted and requires a password")]
    PasswordRequired,

    /// The supplied password did not unlock the document.
    #[error("Invalid password")]
    InvalidPassword,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),
}

impl Error {
    /// True for the password failures (missing or wrong password).
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Error::PasswordRequired | Error::InvalidPassword)
    }

    /// True when the source document could not be located.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::Decryption(_) => Error::PasswordRequired,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

/// A failure while reading one page element.
///
/// Never returned to callers of the conversion API; the page engine logs it
/// and drops the element.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The PDF object backing the element is malformed.
    #[error("PDF object error: {0}")]
    Pdf(String),

    /// Pixel data could not be decoded or re-encoded.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The image uses an encoding this crate does not decode.
    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    /// The element's geometry is unusable.
    #[error("Invalid geometry: {0}")]
    Geometry(String),

    /// Writing a file-backed image failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<lopdf::Error> for ExtractError {
    fn from(err: lopdf::Error) -> Self {
        ExtractError::Pdf(err.to_string())
    }
}
