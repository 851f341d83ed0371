//! Table detection using text position analysis (Stream mode algorithm).
//!
//! Inspired by Camelot's Stream mode, this module detects tables by analyzing
//! text alignment patterns without relying on graphical lines.

use std::collections::{HashMap, HashSet};

use crate::model::{Rect, TableGrid, TextBlock, TextSpan};

/// A row of text spans in a table.
#[derive(Debug, Clone)]
struct TableRowData {
    /// Spans in this row, sorted by X
    spans: Vec<TextSpan>,
}

/// Table detector configuration.
#[derive(Debug, Clone)]
pub(super) struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Bucket width when collecting column edges.
const EDGE_BUCKET: f32 = 5.0;

/// Detects tables among a page's text spans.
pub(super) struct TableDetector {
    config: TableDetectorConfig,
}

impl Default for TableDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl TableDetector {
    pub(super) fn new() -> Self {
        Self {
            config: TableDetectorConfig::default(),
        }
    }

    /// Detect tables in the page's laid-out blocks.
    pub(super) fn detect(&self, blocks: &[TextBlock]) -> Vec<TableGrid> {
        let spans: Vec<TextSpan> = blocks
            .iter()
            .flat_map(|b| b.spans())
            .filter(|s| !s.text.trim().is_empty())
            .cloned()
            .collect();

        log::debug!("TableDetector: starting with {} spans", spans.len());
        if spans.len() < self.config.min_rows * self.config.min_columns {
            return vec![];
        }

        let rows = self.group_into_rows(&spans);
        if rows.len() < self.config.min_rows {
            return vec![];
        }

        let columns = self.detect_columns(&rows);
        log::debug!(
            "TableDetector: detected {} columns at positions: {:?}",
            columns.len(),
            columns
        );
        if columns.len() < self.config.min_columns {
            return vec![];
        }

        let regions = self.find_table_regions(&rows, &columns);
        log::debug!("TableDetector: found {} table regions", regions.len());

        let mut tables = Vec::new();
        for (start_row, end_row) in regions {
            let table_rows = &rows[start_row..=end_row];
            let table_columns = self.detect_columns(table_rows);

            if table_columns.len() < self.config.min_columns {
                continue;
            }
            if table_columns.len() > self.config.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({} > {})",
                    table_columns.len(),
                    self.config.max_columns
                );
                continue;
            }
            if self.is_list_pattern(table_rows, &table_columns) {
                log::debug!("TableDetector: skipping region, detected as list pattern");
                continue;
            }

            tables.push(self.to_grid(table_rows, &table_columns));
        }

        tables
    }

    /// Group spans into rows by baseline, top to bottom.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<TableRowData> {
        let mut sorted = spans.to_vec();
        sorted.sort_by(|a, b| {
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

        let mut rows: Vec<TableRowData> = Vec::new();
        let mut current: Vec<TextSpan> = Vec::new();
        let mut current_y: Option<f32> = None;

        for span in sorted {
            let y = baseline(&span);
            let tolerance = span.size * self.config.y_tolerance_factor;
            match current_y {
                Some(row_y) if (y - row_y).abs() <= tolerance => current.push(span),
                _ => {
                    if !current.is_empty() {
                        rows.push(make_row(std::mem::take(&mut current)));
                    }
                    current_y = Some(y);
                    current.push(span);
                }
            }
        }

        if !current.is_empty() {
            rows.push(make_row(current));
        }

        rows
    }

    /// Detect column boundaries from left text edges that align across rows.
    fn detect_columns(&self, rows: &[TableRowData]) -> Vec<f32> {
        let multi_span_rows: Vec<&TableRowData> =
            rows.iter().filter(|r| r.spans.len() >= 2).collect();

        let mut edge_counts: HashMap<i32, usize> = HashMap::new();
        let sample_rows = if multi_span_rows.len() >= self.config.min_rows {
            for row in &multi_span_rows {
                // Each bucket counts once per row
                let buckets: HashSet<i32> = row.spans.iter().map(|s| bucket(s.bbox.x0)).collect();
                for b in buckets {
                    *edge_counts.entry(b).or_insert(0) += 1;
                }
            }
            multi_span_rows.len()
        } else {
            for span in rows.iter().flat_map(|r| r.spans.iter()) {
                *edge_counts.entry(bucket(span.bbox.x0)).or_insert(0) += 1;
            }
            rows.len()
        };

        let min_occurrences =
            ((sample_rows as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = edge_counts
            .iter()
            .filter(|(_, count)| **count >= min_occurrences)
            .map(|(b, _)| *b as f32 * EDGE_BUCKET)
            .collect();
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut merged: Vec<f32> = Vec::new();
        for edge in edges {
            match merged.last() {
                Some(last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Find contiguous row regions that align with the columns.
    fn find_table_regions(&self, rows: &[TableRowData], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut current_start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            let aligned = row.spans.len() >= 2
                && self.calculate_alignment_score(row, columns) >= self.config.min_alignment_ratio;

            if aligned {
                current_start.get_or_insert(i);
            } else if let Some(start) = current_start.take() {
                if i - start >= self.config.min_rows {
                    regions.push((start, i - 1));
                }
            }
        }

        if let Some(start) = current_start {
            if rows.len() - start >= self.config.min_rows {
                regions.push((start, rows.len() - 1));
            }
        }

        regions
    }

    /// Fraction of a row's spans that start on a column edge.
    fn calculate_alignment_score(&self, row: &TableRowData, columns: &[f32]) -> f32 {
        if row.spans.is_empty() || columns.is_empty() {
            return 0.0;
        }

        let aligned = row
            .spans
            .iter()
            .filter(|span| {
                columns
                    .iter()
                    .any(|col| (span.bbox.x0 - col).abs() <= EDGE_BUCKET)
            })
            .count();

        aligned as f32 / row.spans.len() as f32
    }

    fn to_grid(&self, rows: &[TableRowData], columns: &[f32]) -> TableGrid {
        let right_x = rows
            .iter()
            .flat_map(|r| r.spans.iter())
            .map(|s| s.bbox.x1)
            .fold(f32::MIN, f32::max);

        let mut bbox: Option<Rect> = None;
        let grid = rows
            .iter()
            .map(|row| {
                let mut cells: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
                for span in &row.spans {
                    bbox = Some(bbox.map_or(span.bbox, |b| b.union(&span.bbox)));
                    let col = find_column_for_span(span.bbox.x0, columns, right_x);
                    if let Some(cell) = cells.get_mut(col) {
                        cell.push(span.text.trim());
                    }
                }
                cells.into_iter().map(|c| Some(c.join(" "))).collect()
            })
            .collect();

        TableGrid::new(grid, bbox)
    }

    /// Whether the rows are really a bulleted or numbered list.
    ///
    /// The marker and the item text often land in separate spans, which
    /// looks like a two-column table.
    fn is_list_pattern(&self, rows: &[TableRowData], columns: &[f32]) -> bool {
        if columns.len() < 2 || rows.is_empty() {
            return false;
        }

        let mut bullet_count = 0;
        let mut number_count = 0;
        for row in rows {
            if let Some(first) = row.spans.first() {
                let text = first.text.trim();
                if is_bullet_marker(text) {
                    bullet_count += 1;
                } else if is_number_marker(text) {
                    number_count += 1;
                }
            }
        }

        let bullet_ratio = bullet_count as f32 / rows.len() as f32;
        let total_ratio = (bullet_count + number_count) as f32 / rows.len() as f32;

        // Numbered first columns only disqualify two-column grids
        bullet_ratio >= 0.5 || (columns.len() == 2 && total_ratio >= 0.5)
    }
}

fn baseline(span: &TextSpan) -> f32 {
    span.bbox.y1 - span.size * 0.2
}

fn bucket(x: f32) -> i32 {
    (x / EDGE_BUCKET).round() as i32
}

fn make_row(mut spans: Vec<TextSpan>) -> TableRowData {
    spans.sort_by(|a, b| {
        a.bbox
            .x0
            .partial_cmp(&b.bbox.x0)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    TableRowData { spans }
}

/// Column whose `[start - 10, next_start - 10)` range holds `x`, else the nearest.
fn find_column_for_span(x: f32, columns: &[f32], right_x: f32) -> usize {
    for (i, &start) in columns.iter().enumerate() {
        let end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
        if x >= start - 10.0 && x < end - 10.0 {
            return i;
        }
    }

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (x - **a)
                .abs()
                .partial_cmp(&(x - **b).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Check if text is a bullet marker (•, -, etc.).
fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "▹" | "►" | "■" | "●" | "※" | "□" | "◆" | "◇" | "▶" | "▷" | "☞" | "➤" | "➜"
    )
}

/// Check if text is a number-style list marker (1., 2), a., etc.).
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    if let Some(pos) = cleaned.find(|c: char| !c.is_ascii_digit()) {
        let (prefix, suffix) = cleaned.split_at(pos);
        if !prefix.is_empty() && (suffix == "." || suffix == ")") {
            return true;
        }
    }

    if cleaned.parse::<u32>().is_ok() {
        return true;
    }

    let chars: Vec<char> = cleaned.chars().collect();
    chars.len() == 2 && chars[0].is_alphabetic() && (chars[1] == '.' || chars[1] == ')')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FontFlags, TextLine};

    /// One block per span; the detector only looks at positions.
    fn blocks(spans: &[(&str, f32, f32)]) -> Vec<TextBlock> {
        spans
            .iter()
            .map(|&(text, x, top)| {
                let bbox = Rect::new(x, top, x + text.chars().count() as f32 * 6.0, top + 12.0);
                let span = TextSpan::new(text, 12.0, FontFlags::NONE, bbox);
                TextBlock::from_lines(vec![TextLine::from_spans(vec![span])])
            })
            .collect()
    }

    #[test]
    fn test_detect_simple_table() {
        let detector = TableDetector::new();
        let tables = detector.detect(&blocks(&[
            ("Name", 10.0, 100.0),
            ("Age", 60.0, 100.0),
            ("Alice", 10.0, 115.0),
            ("30", 60.0, 115.0),
            ("Bob", 10.0, 130.0),
            ("25", 60.0, 130.0),
        ]));

        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.rows.len(), 3);
        assert_eq!(
            table.rows[0],
            vec![Some("Name".to_string()), Some("Age".to_string())]
        );
        assert_eq!(
            table.rows[2],
            vec![Some("Bob".to_string()), Some("25".to_string())]
        );
        let bbox = table.bbox.unwrap();
        assert_eq!(bbox.y0, 100.0);
        assert_eq!(bbox.x0, 10.0);
    }

    #[test]
    fn test_no_table_single_column() {
        let detector = TableDetector::new();
        let tables = detector.detect(&blocks(&[
            ("Line 1", 10.0, 100.0),
            ("Line 2", 10.0, 115.0),
            ("Line 3", 10.0, 130.0),
            ("Line 4", 10.0, 145.0),
        ]));
        assert!(tables.is_empty());
    }

    #[test]
    fn test_numbered_list_not_detected_as_table() {
        let detector = TableDetector::new();
        let tables = detector.detect(&blocks(&[
            ("1.", 50.0, 100.0),
            ("장비관리설정", 80.0, 100.0),
            ("2.", 50.0, 130.0),
            ("Object관리", 80.0, 130.0),
            ("3.", 50.0, 160.0),
            ("VPN", 80.0, 160.0),
        ]));
        assert!(tables.is_empty(), "Numbered list should not be detected as a table");
    }

    #[test]
    fn test_bullet_list_not_detected_as_table() {
        let detector = TableDetector::new();
        let tables = detector.detect(&blocks(&[
            ("-", 50.0, 100.0),
            ("Management", 80.0, 100.0),
            ("-", 50.0, 130.0),
            ("Interface/Service Option", 80.0, 130.0),
            ("-", 50.0, 160.0),
            ("Firmware", 80.0, 160.0),
        ]));
        assert!(tables.is_empty(), "Bullet list should not be detected as a table");
    }

    #[test]
    fn test_find_column_for_span() {
        let columns = [10.0, 60.0, 120.0];
        assert_eq!(find_column_for_span(12.0, &columns, 200.0), 0);
        assert_eq!(find_column_for_span(55.0, &columns, 200.0), 1);
        assert_eq!(find_column_for_span(150.0, &columns, 200.0), 2);
    }

    #[test]
    fn test_list_markers() {
        assert!(is_number_marker("1."));
        assert!(is_number_marker("12."));
        assert!(is_number_marker("1)"));
        assert!(is_number_marker("1 ."));
        assert!(is_number_marker("3"));
        assert!(is_number_marker("a."));
        assert!(is_number_marker("B)"));
        assert!(is_bullet_marker("-"));
        assert!(is_bullet_marker("•"));

        assert!(!is_number_marker("Name"));
        assert!(!is_number_marker(""));
        assert!(!is_bullet_marker("Alice"));
    }
}
