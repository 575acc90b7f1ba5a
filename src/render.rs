//! Text rendering for pivot tables and facet counts.
//!
//! Two-dimensional pivots render as a grid (first dimension down, second
//! across) with row and column totals. Higher-dimensional pivots render in
//! long format: one line per non-zero cell.

use isamples_core::facets::FacetCounts;
use isamples_core::pivot::PivotTable;
use ndarray::IxDyn;

pub fn render_pivot_table(table: &PivotTable) -> String {
    if table.dimensions().len() == 2 {
        render_grid(table)
    } else {
        render_long(table)
    }
}

fn render_grid(table: &PivotTable) -> String {
    let coords = table.coordinate_map();
    let (row_dim, rows) = coords[0];
    let (col_dim, cols) = coords[1];
    let values = table.values();

    let mut grid: Vec<Vec<String>> = Vec::with_capacity(rows.len() + 2);

    let mut header = vec![format!("{} \\ {}", row_dim, col_dim)];
    header.extend(cols.iter().cloned());
    header.push("total".to_string());
    grid.push(header);

    let mut col_totals = vec![0u64; cols.len()];
    for (i, row) in rows.iter().enumerate() {
        let mut line = vec![row.clone()];
        let mut row_total = 0u64;
        for (j, col_total) in col_totals.iter_mut().enumerate() {
            let v = values[IxDyn(&[i, j])];
            row_total += v;
            *col_total += v;
            line.push(v.to_string());
        }
        line.push(row_total.to_string());
        grid.push(line);
    }

    let mut footer = vec!["total".to_string()];
    footer.extend(col_totals.iter().map(|t| t.to_string()));
    footer.push(table.total().to_string());
    grid.push(footer);

    format_grid(&grid)
}

fn render_long(table: &PivotTable) -> String {
    let mut grid: Vec<Vec<String>> = Vec::new();

    let mut header: Vec<String> = table.dimensions().to_vec();
    header.push("count".to_string());
    grid.push(header);

    for (labels, count) in table.nonzero_cells() {
        let mut line: Vec<String> = labels.into_iter().map(String::from).collect();
        line.push(count.to_string());
        grid.push(line);
    }

    let mut out = format_grid(&grid);
    out.push_str(&format!("total: {}\n", table.total()));
    out
}

/// Left-align the first column, right-align the rest.
fn format_grid(grid: &[Vec<String>]) -> String {
    let ncols = grid.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut widths = vec![0usize; ncols];
    for row in grid {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in grid {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &w))| {
                if i == 0 {
                    format!("{:<w$}", cell, w = w)
                } else {
                    format!("{:>w$}", cell, w = w)
                }
            })
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    out
}

pub fn render_facets(counts: &FacetCounts) -> String {
    let mut out = String::new();
    for field in &counts.fields {
        out.push_str(&format!("{} ({} values)\n", field.field, field.counts.len()));
        let width = field
            .counts
            .iter()
            .map(|(v, _)| v.chars().count())
            .max()
            .unwrap_or(0);
        for (value, count) in &field.counts {
            out.push_str(&format!("  {:<w$}  {}\n", value, count, w = width));
        }
    }
    out
}
