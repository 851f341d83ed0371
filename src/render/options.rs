//! Rendering options and configuration.

use std::io;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Options for reconstructing pages as Markdown.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Font-size ratios that promote a line to a heading
    pub headings: HeadingThresholds,

    /// Average font size assumed for pages without any text
    pub default_font_size: f32,

    /// How images are emitted
    pub images: ImageOptions,

    /// Which vector strokes count as thematic breaks
    pub rules: RuleConfig,

    /// Render markup annotations as blockquotes
    pub include_annotations: bool,

    /// Render link annotations not already present as bare URLs
    pub include_links: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the heading thresholds.
    pub fn with_headings(mut self, headings: HeadingThresholds) -> Self {
        self.headings = headings;
        self
    }

    /// Set the image options.
    pub fn with_images(mut self, images: ImageOptions) -> Self {
        self.images = images;
        self
    }

    /// Write images under `dir` instead of embedding them.
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.images.mode = ImageMode::Files {
            dir: dir.into(),
            link_prefix: String::new(),
        };
        self
    }

    /// Drop images from the output.
    pub fn without_images(mut self) -> Self {
        self.images.mode = ImageMode::Omit;
        self
    }

    /// Set the rule detection policy.
    pub fn with_rules(mut self, rules: RuleConfig) -> Self {
        self.rules = rules;
        self
    }

    /// Enable or disable annotation blockquotes.
    pub fn with_annotations(mut self, include: bool) -> Self {
        self.include_annotations = include;
        self
    }

    /// Enable or disable link annotation elements.
    pub fn with_links(mut self, include: bool) -> Self {
        self.include_links = include;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            headings: HeadingThresholds::default(),
            default_font_size: 12.0,
            images: ImageOptions::default(),
            rules: RuleConfig::default(),
            include_annotations: true,
            include_links: true,
        }
    }
}

/// Font-size ratios (line size / page average) for each heading level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingThresholds {
    /// Minimum ratio for `# `
    pub h1: f32,

    /// Minimum ratio for `## `
    pub h2: f32,

    /// Minimum ratio for `### `, which also requires bold text
    pub h3_bold: f32,
}

impl Default for HeadingThresholds {
    fn default() -> Self {
        Self {
            h1: 1.8,
            h2: 1.35,
            h3_bold: 1.15,
        }
    }
}

/// Where rendered images go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageMode {
    /// Base64 data URIs inside the Markdown
    #[default]
    Embedded,
    /// Files written under `dir`, referenced as `{link_prefix}{file name}`
    Files { dir: PathBuf, link_prefix: String },
    /// No image output at all
    Omit,
}

/// Image output configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOptions {
    pub mode: ImageMode,

    /// Largest width kept after downsampling
    pub max_width: u32,

    /// Largest height kept after downsampling
    pub max_height: u32,

    /// Shrink images that exceed the bounds
    pub downsample: bool,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            mode: ImageMode::Embedded,
            max_width: 800,
            max_height: 1000,
            downsample: true,
        }
    }
}

impl ImageOptions {
    /// Output directory for file-backed images, if any.
    pub fn output_dir(&self) -> Option<&Path> {
        match &self.mode {
            ImageMode::Files { dir, .. } => Some(dir),
            _ => None,
        }
    }

    /// Create the image directory. Call once before rendering any page.
    pub fn prepare(&self) -> io::Result<()> {
        if let Some(dir) = self.output_dir() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Which vector paths are rendered as `---`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleConfig {
    /// Path width as a fraction of page width must exceed this
    pub min_width_ratio: f32,

    /// Path height in points must stay below this
    pub max_height: f32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            min_width_ratio: 0.6,
            max_height: 5.0,
        }
    }
}

/// Page selection for conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Convert all pages
    #[default]
    All,
    /// Convert a range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Convert specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        // Check for simple range (e.g., "1-10")
        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                return Ok(PageSelection::Range(parse_range(start, end)?));
            }
        }

        // Parse comma-separated list with possible ranges
        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                for p in parse_range(start, end)? {
                    if !pages.contains(&p) {
                        pages.push(p);
                    }
                }
            } else {
                let p = parse_page(part)?;
                if !pages.contains(&p) {
                    pages.push(p);
                }
            }
        }

        pages.sort_unstable();
        Ok(PageSelection::Pages(pages))
    }
}

fn parse_page(s: &str) -> Result<u32> {
    match s.trim().parse::<u32>() {
        Ok(0) => Err(Error::InvalidPageRange(
            "page numbers start at 1".to_string(),
        )),
        Ok(n) => Ok(n),
        Err(_) => Err(Error::InvalidPageRange(format!(
            "invalid page number '{}'",
            s.trim()
        ))),
    }
}

fn parse_range(start: &str, end: &str) -> Result<RangeInclusive<u32>> {
    let start = parse_page(start)?;
    let end = parse_page(end)?;
    if start > end {
        return Err(Error::InvalidPageRange(format!(
            "range {}-{} is reversed",
            start, end
        )));
    }
    Ok(start..=end)
}
