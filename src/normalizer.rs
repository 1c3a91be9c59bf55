use crate::extract::RawLine;
use crate::schema::StatementRecord;

/// Attaches period and provenance to an extracted line.
///
/// Only surrounding whitespace is removed from the label here; labels that
/// differ by inner spacing stay distinct.
pub fn normalize(line: RawLine, year: i32, month: u32, source_file: &str) -> StatementRecord {
    StatementRecord {
        year,
        month,
        item: line.item.trim().to_string(),
        flow_value: line.flow_value,
        cumulative_value: line.cumulative_value,
        prior_year_flow_value: 0.0,
        prior_year_cumulative_value: 0.0,
        source_file: source_file.to_string(),
        extraction_mode: line.mode,
    }
}

pub fn normalize_all(
    lines: Vec<RawLine>,
    year: i32,
    month: u32,
    source_file: &str,
) -> Vec<StatementRecord> {
    lines
        .into_iter()
        .map(|line| normalize(line, year, month, source_file))
        .collect()
}
