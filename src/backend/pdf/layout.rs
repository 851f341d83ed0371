//! Grouping of positioned spans into lines and blocks.

use super::content::is_spaceless_script_char;
use crate::model::{TextBlock, TextLine, TextSpan};

/// Baseline variance allowed within one line, as a fraction of font size.
const LINE_TOLERANCE: f32 = 0.3;

/// Line spacing beyond this multiple of the average starts a new block.
const BLOCK_GAP_FACTOR: f32 = 1.5;

/// Font size change (points) that starts a new block.
const BLOCK_SIZE_CHANGE: f32 = 1.0;

/// Left margin shift (points) that starts a new block.
const BLOCK_INDENT_CHANGE: f32 = 20.0;

fn baseline(span: &TextSpan) -> f32 {
    span.bbox.y1 - span.size * 0.2
}

/// Group spans into blocks of lines in reading order.
pub(super) fn build_blocks(spans: Vec<TextSpan>) -> Vec<TextBlock> {
    let lines = group_spans_into_lines(spans);
    group_lines_into_blocks(lines)
}

/// Simple baseline grouping, top to bottom then left to right.
fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    if spans.is_empty() {
        return vec![];
    }

    spans.sort_by(|a, b| {
        baseline(a)
            .partial_cmp(&baseline(b))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                a.bbox
                    .x0
                    .partial_cmp(&b.bbox.x0)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let y = baseline(&span);
        match current_y {
            Some(line_y) if (y - line_y).abs() <= span.size * LINE_TOLERANCE => {
                current.push(span);
            }
            _ => {
                if !current.is_empty() {
                    lines.push(finish_line(std::mem::take(&mut current)));
                }
                current_y = Some(y);
                current.push(span);
            }
        }
    }

    if !current.is_empty() {
        lines.push(finish_line(current));
    }

    lines
}

/// Order a line's spans left to right and merge same-style neighbours.
///
/// Spans further apart than one em stay separate so column gaps survive
/// for table detection.
fn finish_line(mut spans: Vec<TextSpan>) -> TextLine {
    spans.sort_by(|a, b| {
        a.bbox
            .x0
            .partial_cmp(&b.bbox.x0)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut merged: Vec<TextSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(prev) if same_style(prev, &span) && span.bbox.x0 - prev.bbox.x1 < prev.size => {
                if needs_space(prev, &span) {
                    prev.text.push(' ');
                }
                prev.text.push_str(&span.text);
                prev.bbox = prev.bbox.union(&span.bbox);
            }
            _ => merged.push(span),
        }
    }

    TextLine::from_spans(merged)
}

fn same_style(a: &TextSpan, b: &TextSpan) -> bool {
    a.flags == b.flags && (a.size - b.size).abs() < 0.5
}

/// Whether the gap between two spans reads as a word break.
///
/// No space is inserted between two CJK characters.
fn needs_space(prev: &TextSpan, span: &TextSpan) -> bool {
    let prev_ends_with_space = prev.text.ends_with(' ') || prev.text.ends_with('\u{00A0}');
    let curr_starts_with_space = span.text.starts_with(' ') || span.text.starts_with('\u{00A0}');
    if prev_ends_with_space || curr_starts_with_space {
        return false;
    }

    let char_count = span.text.chars().count();
    let avg_char_width = if char_count > 0 && span.bbox.width() > 0.0 {
        span.bbox.width() / char_count as f32
    } else {
        span.size * 0.5
    };

    let gap = span.bbox.x0 - prev.bbox.x1;
    if gap <= avg_char_width * 0.2 {
        return false;
    }

    let prev_is_cjk = prev.text.chars().last().is_some_and(is_spaceless_script_char);
    let curr_is_cjk = span.text.chars().next().is_some_and(is_spaceless_script_char);
    !(prev_is_cjk && curr_is_cjk)
}

fn line_size(line: &TextLine) -> f32 {
    line.spans.iter().map(|s| s.size).fold(0.0, f32::max)
}

fn line_baseline(line: &TextLine) -> f32 {
    line.spans.first().map(baseline).unwrap_or(line.bbox.y1)
}

fn calculate_avg_line_spacing(lines: &[TextLine]) -> f32 {
    let spacings: Vec<f32> = lines
        .windows(2)
        .map(|w| (line_baseline(&w[1]) - line_baseline(&w[0])).abs())
        .filter(|s| *s > 0.1)
        .collect();

    if spacings.is_empty() {
        return 12.0;
    }
    spacings.iter().sum::<f32>() / spacings.len() as f32
}

fn should_break_block(prev: &TextLine, curr: &TextLine, avg_spacing: f32) -> bool {
    let spacing = (line_baseline(curr) - line_baseline(prev)).abs();
    spacing > avg_spacing * BLOCK_GAP_FACTOR
        || (line_size(prev) - line_size(curr)).abs() > BLOCK_SIZE_CHANGE
        || (prev.bbox.x0 - curr.bbox.x0).abs() > BLOCK_INDENT_CHANGE
}

fn group_lines_into_blocks(lines: Vec<TextLine>) -> Vec<TextBlock> {
    if lines.is_empty() {
        return vec![];
    }

    let avg_spacing = calculate_avg_line_spacing(&lines);
    let mut blocks: Vec<TextBlock> = Vec::new();
    let mut current: Vec<TextLine> = Vec::new();

    for line in lines {
        if let Some(prev) = current.last() {
            if should_break_block(prev, &line, avg_spacing) {
                blocks.push(TextBlock::from_lines(std::mem::take(&mut current)));
            }
        }
        current.push(line);
    }

    if !current.is_empty() {
        blocks.push(TextBlock::from_lines(current));
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FontFlags, Rect};

    fn span(text: &str, x: f32, top: f32, size: f32, flags: FontFlags) -> TextSpan {
        let width = text.chars().count() as f32 * size * 0.5;
        TextSpan::new(text, size, flags, Rect::new(x, top, x + width, top + size))
    }

    #[test]
    fn test_same_baseline_forms_one_line() {
        let spans = vec![
            span("World", 106.0, 100.0, 12.0, FontFlags::NONE),
            span("Hello", 72.0, 100.5, 12.0, FontFlags::NONE),
        ];
        let blocks = build_blocks(spans);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines.len(), 1);
        let line = &blocks[0].lines[0];
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].text, "Hello World");
    }

    #[test]
    fn test_adjacent_fragments_merge_without_space() {
        // "Hel" ends at 72 + 18 = 90
        let spans = vec![
            span("Hel", 72.0, 100.0, 12.0, FontFlags::NONE),
            span("lo", 90.0, 100.0, 12.0, FontFlags::NONE),
        ];
        let blocks = build_blocks(spans);
        assert_eq!(blocks[0].lines[0].spans[0].text, "Hello");
    }

    #[test]
    fn test_wide_gap_keeps_separate_spans() {
        let spans = vec![
            span("Name", 72.0, 100.0, 12.0, FontFlags::NONE),
            span("Age", 200.0, 100.0, 12.0, FontFlags::NONE),
        ];
        let blocks = build_blocks(spans);
        assert_eq!(blocks[0].lines[0].spans.len(), 2);
    }

    #[test]
    fn test_style_change_keeps_separate_spans() {
        let spans = vec![
            span("Bold", 72.0, 100.0, 12.0, FontFlags::BOLD),
            span("plain", 110.0, 100.0, 12.0, FontFlags::NONE),
        ];
        let blocks = build_blocks(spans);
        let line = &blocks[0].lines[0];
        assert_eq!(line.spans.len(), 2);
        assert!(line.spans[0].flags.is_bold());
    }

    #[test]
    fn test_blocks_split_on_gap_and_size() {
        let spans = vec![
            span("Title", 72.0, 50.0, 24.0, FontFlags::BOLD),
            span("First line", 72.0, 100.0, 12.0, FontFlags::NONE),
            span("Second line", 72.0, 114.0, 12.0, FontFlags::NONE),
            span("Far below", 72.0, 300.0, 12.0, FontFlags::NONE),
        ];
        let blocks = build_blocks(spans);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].lines.len(), 1);
        assert_eq!(blocks[1].lines.len(), 2);
        assert_eq!(blocks[2].lines[0].spans[0].text, "Far below");
    }

    #[test]
    fn test_empty_input() {
        assert!(build_blocks(Vec::new()).is_empty());
    }
}
