//! PDF header detection.
//!
//! Used before a document is handed to the PDF library so that a text file
//! or an HTML error page fails with a clear error instead of a parse error.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// PDF format information read from the file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Some producers emit junk (BOMs, HTTP headers) before the magic.
const HEADER_SCAN_LEN: usize = 1024;

/// Detect PDF format from a file path.
///
/// Returns [`Error::NotFound`] when the path does not exist.
///
/// # Example
/// ```no_run
/// use pagedown::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("document.pdf").unwrap();
/// println!("PDF version: {}", format.version);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<PdfFormat> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let mut header = Vec::with_capacity(HEADER_SCAN_LEN);
    BufReader::new(file)
        .take(HEADER_SCAN_LEN as u64)
        .read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect PDF format from the leading bytes of a file.
///
/// The magic is accepted anywhere in the first kilobyte, matching the
/// tolerance of common PDF readers.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    let window = &data[..data.len().min(HEADER_SCAN_LEN)];
    let start = window
        .windows(PDF_MAGIC_LEN)
        .position(|w| w == PDF_MAGIC)
        .ok_or(Error::UnknownFormat)?;

    let version_start = start + PDF_MAGIC_LEN;
    let version_bytes = data
        .get(version_start..version_start + VERSION_LEN)
        .ok_or(Error::UnknownFormat)?;
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(PdfFormat { version })
}

/// Check if a version string is valid.
fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

/// Check if a file is a valid PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes represent a valid PDF.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_valid_pdf() {
        let data = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3";
        let format = detect_format_from_bytes(data).unwrap();
        assert_eq!(format.version, "1.7");
        assert_eq!(format.to_string(), "PDF 1.7");
    }

    #[test]
    fn test_detect_with_leading_garbage() {
        let data = b"\xef\xbb\xbf%PDF-1.4\n";
        let format = detect_format_from_bytes(data).unwrap();
        assert_eq!(format.version, "1.4");
    }

    #[test]
    fn test_detect_invalid_format() {
        let result = detect_format_from_bytes(b"<!DOCTYPE html>");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_detect_too_short() {
        let result = detect_format_from_bytes(b"%PDF");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_detect_bad_version() {
        let result = detect_format_from_bytes(b"%PDF-x.y\n");
        assert!(matches!(result, Err(Error::UnsupportedVersion(_))));
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let result = detect_format_from_path("/definitely/not/here.pdf");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_version_validation() {
        assert!(is_valid_version("1.0"));
        assert!(is_valid_version("2.0"));
        assert!(!is_valid_version("10.0"));
        assert!(!is_valid_version("abc"));
    }
}
