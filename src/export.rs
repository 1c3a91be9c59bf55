//! The reconciled dataset and its flat renderings.

use crate::error::Result;
use crate::period::FiscalPeriod;
use crate::schema::StatementRecord;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Write;

/// Reconciled records of one load, in fiscal order.
///
/// An empty dataset is the "no data" state: no files were found or none could
/// be parsed. It is not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialBalanceDataset {
    records: Vec<StatementRecord>,
}

/// What a dataset spans, for the operator log view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub fiscal_years: Vec<i32>,
    pub first_month_end: Option<NaiveDate>,
    pub last_month_end: Option<NaiveDate>,
    pub source_files: usize,
    pub records: usize,
}

/// One output row under the column names the reporting layer reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DatasetRow {
    #[serde(rename = "Year")]
    #[schemars(description = "Calendar year")]
    pub year: i32,

    #[serde(rename = "Month")]
    #[schemars(description = "Calendar month, 1-12")]
    pub month: u32,

    #[serde(rename = "FiscalYear")]
    #[schemars(description = "April-start fiscal year")]
    pub fiscal_year: i32,

    #[serde(rename = "FiscalMonth")]
    #[schemars(description = "Position within the fiscal year, 1 = April, 12 = March")]
    pub fiscal_month: u32,

    #[serde(rename = "Item")]
    pub item: String,

    #[serde(rename = "Current")]
    #[schemars(description = "Flow value for the month")]
    pub current: f64,

    #[serde(rename = "Cumulative")]
    #[schemars(description = "Fiscal year-to-date value")]
    pub cumulative: f64,

    #[serde(rename = "Prev_Current")]
    pub prev_current: f64,

    #[serde(rename = "Prev_Cumulative")]
    pub prev_cumulative: f64,

    #[serde(rename = "Source")]
    pub source: String,

    #[serde(rename = "Type")]
    #[schemars(description = "Extraction mode, Table or Text")]
    pub mode: String,
}

impl From<&StatementRecord> for DatasetRow {
    fn from(record: &StatementRecord) -> Self {
        let fiscal = record.fiscal_period();
        Self {
            year: record.year,
            month: record.month,
            fiscal_year: fiscal.fiscal_year,
            fiscal_month: fiscal.fiscal_month,
            item: record.item.clone(),
            current: record.flow_value,
            cumulative: record.cumulative_value,
            prev_current: record.prior_year_flow_value,
            prev_cumulative: record.prior_year_cumulative_value,
            source: record.source_file.clone(),
            mode: record.extraction_mode.as_str().to_string(),
        }
    }
}

impl TrialBalanceDataset {
    pub fn new(records: Vec<StatementRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[StatementRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows(&self) -> Vec<DatasetRow> {
        self.records.iter().map(DatasetRow::from).collect()
    }

    /// Fiscal years present, newest first.
    pub fn fiscal_years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self
            .records
            .iter()
            .map(|r| r.fiscal_period().fiscal_year)
            .collect();
        years.into_iter().rev().collect()
    }

    /// Latest period with data inside the given fiscal year.
    pub fn latest_period_in(&self, fiscal_year: i32) -> Option<FiscalPeriod> {
        self.records
            .iter()
            .map(|r| r.fiscal_period())
            .filter(|p| p.fiscal_year == fiscal_year)
            .max()
    }

    /// Records of one calendar period, in dataset order.
    pub fn period(&self, year: i32, month: u32) -> impl Iterator<Item = &StatementRecord> {
        self.records
            .iter()
            .filter(move |r| r.year == year && r.month == month)
    }

    pub fn coverage(&self) -> CoverageSummary {
        let first = self.records.iter().map(|r| r.fiscal_period()).min();
        let last = self.records.iter().map(|r| r.fiscal_period()).max();
        let sources: BTreeSet<&str> = self
            .records
            .iter()
            .map(|r| r.source_file.as_str())
            .collect();

        CoverageSummary {
            fiscal_years: self.fiscal_years(),
            first_month_end: first.and_then(|p| p.month_end()),
            last_month_end: last.and_then(|p| p.month_end()),
            source_files: sources.len(),
            records: self.records.len(),
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DatasetRow)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Writes the dataset as CSV with a header row. An empty dataset still gets
/// its header.
pub fn to_csv<W: Write>(dataset: &TrialBalanceDataset, writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record([
        "Year",
        "Month",
        "FiscalYear",
        "FiscalMonth",
        "Item",
        "Current",
        "Cumulative",
        "Prev_Current",
        "Prev_Cumulative",
        "Source",
        "Type",
    ])?;
    for row in dataset.rows() {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn to_csv_string(dataset: &TrialBalanceDataset) -> Result<String> {
    let mut buffer = Vec::new();
    to_csv(dataset, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn to_json(dataset: &TrialBalanceDataset) -> Result<String> {
    Ok(serde_json::to_string_pretty(&dataset.rows())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ExtractionMode;

    fn record(year: i32, month: u32, item: &str, flow: f64, source: &str) -> StatementRecord {
        StatementRecord {
            year,
            month,
            item: item.to_string(),
            flow_value: flow,
            cumulative_value: flow,
            prior_year_flow_value: 0.0,
            prior_year_cumulative_value: 0.0,
            source_file: source.to_string(),
            extraction_mode: ExtractionMode::Text,
        }
    }

    fn sample() -> TrialBalanceDataset {
        TrialBalanceDataset::new(vec![
            record(2024, 9, "売上高", 1000.0, "2024_09.pdf"),
            record(2025, 2, "売上高", 900.0, "2025_02.pdf"),
            record(2025, 4, "売上高", 1100.0, "2025_04.pdf"),
            record(2025, 9, "売上高", 1200.0, "2025_09.pdf"),
            record(2025, 9, "地代家賃", 300.0, "2025_09.pdf"),
        ])
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = TrialBalanceDataset::default();
        assert!(dataset.is_empty());
        assert!(dataset.fiscal_years().is_empty());

        let coverage = dataset.coverage();
        assert_eq!(coverage.first_month_end, None);
        assert_eq!(coverage.records, 0);

        let csv = to_csv_string(&dataset).unwrap();
        assert_eq!(
            csv.trim_end(),
            "Year,Month,FiscalYear,FiscalMonth,Item,Current,Cumulative,Prev_Current,Prev_Cumulative,Source,Type"
        );
    }

    #[test]
    fn test_fiscal_queries() {
        let dataset = sample();
        assert_eq!(dataset.fiscal_years(), vec![2025, 2024]);

        let latest = dataset.latest_period_in(2024).unwrap();
        assert_eq!((latest.calendar_year(), latest.calendar_month()), (2025, 2));
        assert!(dataset.latest_period_in(2023).is_none());

        assert_eq!(dataset.period(2025, 9).count(), 2);
    }

    #[test]
    fn test_coverage() {
        let coverage = sample().coverage();
        assert_eq!(coverage.fiscal_years, vec![2025, 2024]);
        assert_eq!(coverage.first_month_end, NaiveDate::from_ymd_opt(2024, 9, 30));
        assert_eq!(coverage.last_month_end, NaiveDate::from_ymd_opt(2025, 9, 30));
        assert_eq!(coverage.source_files, 4);
        assert_eq!(coverage.records, 5);
    }

    #[test]
    fn test_csv_rows() {
        let mut dataset = sample();
        dataset.records[3].prior_year_flow_value = 1000.0;

        let csv = to_csv_string(&dataset).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[2], "2025,2,2024,11,売上高,900.0,900.0,0.0,0.0,2025_02.pdf,Text");
        assert_eq!(lines[4], "2025,9,2025,6,売上高,1200.0,1200.0,1000.0,0.0,2025_09.pdf,Text");
    }

    #[test]
    fn test_json_rows() {
        let json = to_json(&sample()).unwrap();
        let rows: Vec<DatasetRow> = serde_json::from_str(&json).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].fiscal_month, 6);
        assert!(json.contains("\"Prev_Cumulative\""));
        assert!(json.contains("\"Type\": \"Text\""));
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = TrialBalanceDataset::schema_as_json().unwrap();
        assert!(schema_json.contains("FiscalMonth"));
        assert!(schema_json.contains("Prev_Current"));
    }
}
