use super::{Extraction, RawLine};
use crate::labels::{canonicalize_label, clean_label, is_header_cell, is_numeric_artifact};
use crate::numeric::{is_numeric_cell, parse_amount};
use crate::period::FISCAL_YEAR_START_MONTH;
use crate::schema::{ExtractionMode, ParserOptions};

/// Label columns searched when the preferred column is empty.
const LABEL_SEARCH_COLUMNS: usize = 3;

/// Picks the item label from a trial balance row.
///
/// The preferred column wins when it has text. Otherwise the non-numeric cells
/// among the first few columns are joined, which catches section totals such
/// as `【流動資産】` that sit in an outer hierarchy column.
pub fn row_label(cells: &[String], label_column: usize) -> String {
    let preferred = cells.get(label_column).map(|c| c.trim()).unwrap_or("");
    let raw = if !preferred.is_empty() {
        preferred.to_string()
    } else {
        cells
            .iter()
            .take(LABEL_SEARCH_COLUMNS)
            .map(|c| c.trim())
            .filter(|c| !c.is_empty() && !is_numeric_cell(c))
            .collect::<Vec<_>>()
            .join(" ")
    };
    clean_label(&raw)
}

/// Splits a row's figures into `(flow, cumulative)`.
///
/// The figures run `[previous balance, debits/credits..., current balance,
/// ratio]`. In the first fiscal month the previous balance belongs to the
/// prior fiscal year, so the current balance is the month's flow.
pub fn flow_and_cumulative(numbers: &[f64], month: u32) -> Option<(f64, f64)> {
    if numbers.len() < 3 {
        return None;
    }
    let previous = numbers[0];
    let current = numbers[numbers.len() - 2];
    let flow = if month == FISCAL_YEAR_START_MONTH {
        current
    } else {
        current - previous
    };
    Some((flow, current))
}

fn parse_row(cells: &[String], month: u32, options: &ParserOptions) -> Option<RawLine> {
    if cells.len() < options.min_table_columns {
        return None;
    }

    let label = row_label(cells, options.label_column);
    if label.is_empty() || is_numeric_artifact(&label) {
        return None;
    }
    let item = canonicalize_label(label);

    let numbers: Vec<f64> = cells.iter().filter_map(|c| parse_amount(c)).collect();
    let (flow_value, cumulative_value) = flow_and_cumulative(&numbers, month)?;

    Some(RawLine {
        item,
        flow_value,
        cumulative_value,
        previous_value: None,
        mode: ExtractionMode::Table,
    })
}

/// Reads every row of one table. Empty and header rows are passed over;
/// other rows that cannot be read are counted in `skipped`.
pub fn extract_rows(rows: &[Vec<String>], month: u32, options: &ParserOptions) -> Extraction {
    let mut extraction = Extraction::default();

    for cells in rows {
        if cells.iter().all(|c| c.trim().is_empty()) || cells.iter().any(|c| is_header_cell(c)) {
            continue;
        }
        match parse_row(cells, month, options) {
            Some(line) => extraction.lines.push(line),
            None => extraction.skipped += 1,
        }
    }

    extraction
}
