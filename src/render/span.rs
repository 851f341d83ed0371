//! Inline emphasis for styled text runs.

use crate::model::TextSpan;

/// One line after inline formatting, with what the heading classifier needs.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedLine {
    pub text: String,
    /// Largest span size on the line, empty spans included
    pub max_size: f32,
    /// Whether any span on the line is bold
    pub bold: bool,
}

/// Wrap a span's text in `***`, `**` or `*` according to its style.
///
/// Trailing whitespace is dropped first; a span that is empty afterwards
/// yields an empty string.
pub fn format_span(span: &TextSpan) -> String {
    let text = span.text.trim_end();
    if text.is_empty() {
        return String::new();
    }

    match (span.flags.is_bold(), span.flags.is_italic()) {
        (true, true) => format!("***{}***", text),
        (true, false) => format!("**{}**", text),
        (false, true) => format!("*{}*", text),
        (false, false) => text.to_string(),
    }
}

/// Format every span of a line and join the non-empty results with a space.
pub fn format_line(spans: &[TextSpan]) -> FormattedLine {
    let mut parts = Vec::with_capacity(spans.len());
    let mut max_size = 0.0f32;
    let mut bold = false;

    for span in spans {
        let formatted = format_span(span);
        if !formatted.is_empty() {
            parts.push(formatted);
        }
        max_size = max_size.max(span.size);
        bold |= span.flags.is_bold();
    }

    FormattedLine {
        text: parts.join(" "),
        max_size,
        bold,
    }
}
