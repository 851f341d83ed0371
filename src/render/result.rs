//! Per-page output and statistics.

use serde::{Deserialize, Serialize};

/// Markdown for one page together with what went into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageOutput {
    pub number: u32,
    pub markdown: String,
    pub stats: PageStats,
}

/// Counts collected while reconstructing one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStats {
    /// Text lines emitted, headings and list items included
    pub text_lines: u32,

    pub headings: u32,

    pub list_items: u32,

    pub tables: u32,

    pub images: u32,

    pub annotations: u32,

    pub links: u32,

    /// Horizontal rules detected from vector paths
    pub rules: u32,

    /// Text blocks dropped because they overlap a table
    pub suppressed_blocks: u32,

    /// Elements that failed to extract or render
    pub skipped: u32,
}

/// Statistics for a whole conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Total number of pages processed
    pub pages: u32,

    pub text_lines: u32,

    pub headings: u32,

    pub list_items: u32,

    pub tables: u32,

    pub images: u32,

    pub annotations: u32,

    pub links: u32,

    pub rules: u32,

    pub suppressed_blocks: u32,

    pub skipped: u32,
}

impl ConversionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one page's counts.
    pub fn add_page(&mut self, page: &PageStats) {
        self.pages += 1;
        self.text_lines += page.text_lines;
        self.headings += page.headings;
        self.list_items += page.list_items;
        self.tables += page.tables;
        self.images += page.images;
        self.annotations += page.annotations;
        self.links += page.links;
        self.rules += page.rules;
        self.suppressed_blocks += page.suppressed_blocks;
        self.skipped += page.skipped;
    }
}
