//! Heading levels inferred from relative font size.

use super::HeadingThresholds;
use crate::model::TextBlock;

/// Heading level assigned to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Markdown prefix including the trailing space.
    pub fn prefix(self) -> &'static str {
        match self {
            HeadingLevel::H1 => "# ",
            HeadingLevel::H2 => "## ",
            HeadingLevel::H3 => "### ",
        }
    }
}

/// Maps a line's font size, relative to the page average, to a heading level.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingClassifier {
    thresholds: HeadingThresholds,
}

impl HeadingClassifier {
    pub fn new(thresholds: HeadingThresholds) -> Self {
        Self { thresholds }
    }

    /// Classify a line. Rules are tried from H1 down; the first match wins.
    pub fn classify(&self, size: f32, page_average: f32, bold: bool) -> Option<HeadingLevel> {
        if page_average <= 0.0 {
            return None;
        }

        let ratio = size / page_average;
        if ratio >= self.thresholds.h1 {
            Some(HeadingLevel::H1)
        } else if ratio >= self.thresholds.h2 {
            Some(HeadingLevel::H2)
        } else if ratio >= self.thresholds.h3_bold && bold {
            Some(HeadingLevel::H3)
        } else {
            None
        }
    }
}

/// Arithmetic mean of every span size on the page, or `default` without spans.
pub fn average_font_size(blocks: &[TextBlock], default: f32) -> f32 {
    let (sum, count) = blocks
        .iter()
        .flat_map(|b| b.spans())
        .fold((0.0f64, 0usize), |(sum, count), span| {
            (sum + f64::from(span.size), count + 1)
        });

    if count == 0 {
        default
    } else {
        (sum / count as f64) as f32
    }
}
