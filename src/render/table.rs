//! Markdown pipe tables.

use crate::model::{Element, ElementKind, Rect, TableGrid};

/// A rendered table and the region it covers on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTable {
    pub element: Element,
    /// Text blocks intersecting this region are suppressed
    pub region: Option<Rect>,
}

/// Flatten a cell to one line so it cannot break the table row.
fn clean_cell(cell: Option<&str>) -> String {
    let Some(cell) = cell else {
        return String::new();
    };
    cell.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

fn push_row<'a>(output: &mut String, cells: impl Iterator<Item = &'a str>) {
    output.push('|');
    for cell in cells {
        output.push(' ');
        output.push_str(cell);
        output.push_str(" |");
    }
}

/// Render a grid as a Markdown table.
///
/// The first row is the header. Short rows are padded to the widest row.
/// Returns `None` for a grid with no rows or an empty first row.
pub fn render_table(grid: &TableGrid) -> Option<String> {
    let header = grid.rows.first()?;
    if header.is_empty() {
        return None;
    }

    let columns = grid.rows.iter().map(Vec::len).max().unwrap_or(0);
    let rows: Vec<Vec<String>> = grid
        .rows
        .iter()
        .map(|row| {
            let mut cells: Vec<String> = row.iter().map(|c| clean_cell(c.as_deref())).collect();
            cells.resize(columns, String::new());
            cells
        })
        .collect();

    let mut output = String::new();
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        push_row(&mut output, row.iter().map(String::as_str));

        // Separator after header row
        if i == 0 {
            output.push('\n');
            push_row(&mut output, std::iter::repeat("---").take(columns));
        }
    }

    Some(output)
}

/// Render every grid, skipping the ones that produce nothing.
///
/// A table is positioned at the top of its region, or at 0 when the
/// detector reported no region.
pub fn render_tables(grids: &[TableGrid]) -> Vec<RenderedTable> {
    grids
        .iter()
        .filter_map(|grid| {
            let markdown = render_table(grid)?;
            let y = grid.bbox.map(|b| b.y0).unwrap_or(0.0);
            Some(RenderedTable {
                element: Element::new(ElementKind::Table, y, markdown).with_bbox(grid.bbox),
                region: grid.bbox,
            })
        })
        .collect()
}
