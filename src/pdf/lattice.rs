//! Ruled-table detection.
//!
//! Horizontal and vertical rulings are clustered into grid lines; the cells
//! between consecutive grid lines receive the text fragments whose origin
//! falls inside them.

use super::{group_by_baseline, PageLayout, TextFragment};

/// Rulings shorter than this are ignored (tick marks, underline dashes).
const MIN_LINE_LENGTH: f64 = 5.0;
/// Maximum slope, in points, for a ruling to count as horizontal/vertical.
const AXIS_TOLERANCE: f64 = 1.0;
/// Rulings closer than this collapse into one grid line.
const SNAP_TOLERANCE: f64 = 3.0;

/// Rows of cell text, top to bottom. Every row has the same number of cells.
pub type Table = Vec<Vec<String>>;

/// Merges sorted positions closer than `tolerance` into their mean.
pub fn cluster_positions(mut values: Vec<f64>, tolerance: f64) -> Vec<f64> {
    values.sort_by(f64::total_cmp);

    let mut clusters: Vec<Vec<f64>> = Vec::new();
    for value in values {
        match clusters.last_mut() {
            Some(cluster) if value - cluster[cluster.len() - 1] <= tolerance => cluster.push(value),
            _ => clusters.push(vec![value]),
        }
    }

    clusters
        .into_iter()
        .map(|c| c.iter().sum::<f64>() / c.len() as f64)
        .collect()
}

fn grid_lines(layout: &PageLayout) -> (Vec<f64>, Vec<f64>) {
    let rulings = layout
        .segments
        .iter()
        .filter(|s| s.length() >= MIN_LINE_LENGTH);

    let mut rows = Vec::new();
    let mut cols = Vec::new();
    for segment in rulings {
        if segment.is_horizontal(AXIS_TOLERANCE) {
            rows.push((segment.y0 + segment.y1) / 2.0);
        } else if segment.is_vertical(AXIS_TOLERANCE) {
            cols.push((segment.x0 + segment.x1) / 2.0);
        }
    }

    (
        cluster_positions(rows, SNAP_TOLERANCE),
        cluster_positions(cols, SNAP_TOLERANCE),
    )
}

/// Anchor used to place a fragment: its origin, lifted off the baseline so
/// text sitting on a rule lands in the cell above it.
fn anchor(fragment: &TextFragment) -> (f64, f64) {
    (fragment.x + 0.5, fragment.y + fragment.font_size * 0.3)
}

/// Concatenates a cell's fragments: same baseline joins directly unless the
/// glyphs are visibly apart, different baselines join with a newline.
fn cell_text(fragments: Vec<&TextFragment>) -> String {
    group_by_baseline(fragments)
        .into_iter()
        .map(|line| {
            let mut text = String::new();
            let mut prev_right: Option<f64> = None;
            for fragment in line {
                if let Some(right) = prev_right {
                    if fragment.x - right > fragment.font_size * 0.25 {
                        text.push(' ');
                    }
                }
                text.push_str(fragment.text.trim());
                prev_right = Some(fragment.right());
            }
            text
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Finds the ruled table on a page. A table needs at least two distinct
/// horizontal and two distinct vertical grid lines, and more than one cell:
/// a lone frame such as a page border is not a table.
pub fn detect_tables(layout: &PageLayout) -> Vec<Table> {
    let (mut rows, cols) = grid_lines(layout);
    if rows.len() < 2 || cols.len() < 2 || (rows.len() == 2 && cols.len() == 2) {
        return Vec::new();
    }
    // top to bottom
    rows.reverse();

    let n_rows = rows.len() - 1;
    let n_cols = cols.len() - 1;
    let mut cells: Vec<Vec<Vec<&TextFragment>>> = vec![vec![Vec::new(); n_cols]; n_rows];

    for fragment in &layout.fragments {
        let (x, y) = anchor(fragment);
        let row = rows.windows(2).position(|band| y <= band[0] && y >= band[1]);
        let col = cols.windows(2).position(|band| x >= band[0] && x <= band[1]);
        if let (Some(row), Some(col)) = (row, col) {
            cells[row][col].push(fragment);
        }
    }

    let table: Table = cells
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect();

    vec![table]
}
