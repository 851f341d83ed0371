//! Document-level types.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Raw document information as stored in the PDF `/Info` dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    /// Unparsed `/CreationDate`, e.g. `D:20240115103000+01'00'`
    pub creation_date: Option<String>,
    /// Unparsed `/ModDate`
    pub modified_date: Option<String>,
    /// PDF version (e.g., "1.7")
    pub pdf_version: String,
}

/// Document metadata returned alongside the Markdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title, "Untitled" when absent
    pub title: String,

    /// Document author, "Unknown" when absent
    pub author: String,

    pub subject: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// Creation date as RFC 3339, or the raw value when unparseable
    pub creation_date: Option<String>,

    /// Modification date as RFC 3339, or the raw value when unparseable
    pub modified_date: Option<String>,

    /// Total number of pages in the document
    pub pages: u32,

    /// Whether the document is encrypted
    pub encrypted: bool,

    /// PDF version (e.g., "1.7")
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub pdf_version: String,

    /// Outline entries, in document order
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub bookmarks: Vec<Bookmark>,
}

impl Metadata {
    /// Normalize raw `/Info` values into output metadata.
    pub fn from_info(info: &DocumentInfo, pages: u32, encrypted: bool) -> Self {
        Self {
            title: non_empty(info.title.as_deref()).unwrap_or_else(|| "Untitled".to_string()),
            author: non_empty(info.author.as_deref()).unwrap_or_else(|| "Unknown".to_string()),
            subject: non_empty(info.subject.as_deref()),
            creator: non_empty(info.creator.as_deref()),
            creation_date: info.creation_date.as_deref().and_then(normalize_pdf_date),
            modified_date: info.modified_date.as_deref().and_then(normalize_pdf_date),
            pages,
            encrypted,
            pdf_version: info.pdf_version.clone(),
            bookmarks: Vec::new(),
        }
    }

    /// Bookmark titles in document order.
    pub fn bookmark_titles(&self) -> Vec<&str> {
        self.bookmarks.iter().map(|b| b.title.as_str()).collect()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// One outline (bookmark) entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Nesting depth, 1 for top-level entries
    pub level: u32,
    pub title: String,
    /// Target page (1-indexed), when the destination resolves to a page
    pub page: Option<u32>,
}

impl Bookmark {
    pub fn new(level: u32, title: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            level,
            title: title.into(),
            page,
        }
    }
}

/// A file attached to the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedFile {
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
}

/// What an encrypted document allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub print: bool,
    pub copy: bool,
    pub modify: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            print: true,
            copy: true,
            modify: true,
        }
    }
}

impl Permissions {
    /// Decode the `/P` entry of an encryption dictionary.
    pub fn from_p(p: i64) -> Self {
        Self {
            print: p & (1 << 2) != 0,
            modify: p & (1 << 3) != 0,
            copy: p & (1 << 4) != 0,
        }
    }
}

/// Clean a PDF date and render it as RFC 3339 when it parses.
///
/// Unparseable dates are returned with the `D:` prefix and apostrophes
/// removed; blank dates yield `None`.
pub fn normalize_pdf_date(raw: &str) -> Option<String> {
    let cleaned = raw.trim().replace("D:", "").replace('\'', "");
    if cleaned.is_empty() {
        return None;
    }
    Some(match parse_pdf_date(&cleaned) {
        Some(date) => date.to_rfc3339(),
        None => cleaned,
    })
}

/// Parse a cleaned PDF date (`YYYYMMDDHHmmSS[+-]HHmm` or `...Z`).
fn parse_pdf_date(s: &str) -> Option<DateTime<Utc>> {
    if s.len() < 4 || !s.is_char_boundary(4) {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let field = |range: std::ops::Range<usize>, default: u32| -> Option<u32> {
        match s.get(range) {
            Some(v) if v.chars().all(|c| c.is_ascii_digit()) => v.parse().ok(),
            Some(_) => None,
            None => Some(default),
        }
    };
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    let limit = |end: usize| digits >= end;

    let month = if limit(6) { field(4..6, 1)? } else { 1 };
    let day = if limit(8) { field(6..8, 1)? } else { 1 };
    let hour = if limit(10) { field(8..10, 0)? } else { 0 };
    let minute = if limit(12) { field(10..12, 0)? } else { 0 };
    let second = if limit(14) { field(12..14, 0)? } else { 0 };

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;

    let offset = parse_offset(s.get(digits..).unwrap_or(""))?;
    let local = offset.from_local_datetime(&naive).single()?;
    Some(local.with_timezone(&Utc))
}

/// Parse the timezone tail: empty, `Z`, or `+HHmm` / `-HHmm`.
fn parse_offset(tail: &str) -> Option<FixedOffset> {
    let tail = tail.trim();
    let mut chars = tail.chars();
    let sign = match chars.next() {
        None | Some('Z') | Some('z') => return FixedOffset::east_opt(0),
        Some('+') => 1,
        Some('-') => -1,
        Some(_) => return None,
    };
    let rest = chars.as_str();
    let hours: i32 = rest.get(0..2).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minutes: i32 = rest.get(2..4).and_then(|m| m.parse().ok()).unwrap_or(0);
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_defaults() {
        let meta = Metadata::from_info(&DocumentInfo::default(), 3, false);
        assert_eq!(meta.title, "Untitled");
        assert_eq!(meta.author, "Unknown");
        assert_eq!(meta.subject, None);
        assert_eq!(meta.pages, 3);
        assert!(!meta.encrypted);
    }

    #[test]
    fn test_metadata_blank_title_uses_default() {
        let info = DocumentInfo {
            title: Some("   ".to_string()),
            author: Some("Jane".to_string()),
            ..Default::default()
        };
        let meta = Metadata::from_info(&info, 1, true);
        assert_eq!(meta.title, "Untitled");
        assert_eq!(meta.author, "Jane");
        assert!(meta.encrypted);
    }

    #[test]
    fn test_normalize_pdf_date_utc() {
        assert_eq!(
            normalize_pdf_date("D:20240115103045Z").as_deref(),
            Some("2024-01-15T10:30:45+00:00")
        );
        assert_eq!(
            normalize_pdf_date("D:20240115103045").as_deref(),
            Some("2024-01-15T10:30:45+00:00")
        );
    }

    #[test]
    fn test_normalize_pdf_date_with_offset() {
        assert_eq!(
            normalize_pdf_date("D:20240115103000+02'00'").as_deref(),
            Some("2024-01-15T08:30:00+00:00")
        );
    }

    #[test]
    fn test_normalize_pdf_date_minimal() {
        assert_eq!(
            normalize_pdf_date("D:2024").as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_normalize_pdf_date_unparseable_passes_through() {
        assert_eq!(
            normalize_pdf_date("D:yesterday'ish").as_deref(),
            Some("yesterdayish")
        );
        assert_eq!(normalize_pdf_date("  "), None);
    }

    #[test]
    fn test_permissions_from_p() {
        // print + copy, no modify
        let perms = Permissions::from_p(0b1_0100);
        assert!(perms.print);
        assert!(perms.copy);
        assert!(!perms.modify);

        let all = Permissions::from_p(-4);
        assert!(all.print && all.copy && all.modify);
    }

    #[test]
    fn test_metadata_serializes_without_empty_bookmarks() {
        let meta = Metadata::from_info(&DocumentInfo::default(), 1, false);
        let json = serde_json::to_string(&meta).unwrap();
        assert!(!json.contains("bookmarks"));
        assert!(json.contains("\"title\":\"Untitled\""));
    }
}
