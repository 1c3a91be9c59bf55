use crate::error::{Result, StatementError};
use crate::period::FiscalPeriod;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum ExtractionMode {
    #[schemars(
        description = "Read from a ruled table on the page. The cumulative figure is the statement's own current balance."
    )]
    Table,

    #[schemars(
        description = "Read from plain text lines. The cumulative figure is recomputed as a running sum within the fiscal year."
    )]
    Text,
}

impl ExtractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMode::Table => "Table",
            ExtractionMode::Text => "Text",
        }
    }
}

/// One line item of one monthly statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StatementRecord {
    #[schemars(description = "Calendar year read from the source filename")]
    pub year: i32,

    #[schemars(description = "Calendar month (1-12) read from the source filename")]
    pub month: u32,

    #[schemars(description = "Account item label, whitespace-stripped with full-width letters and digits folded")]
    pub item: String,

    #[schemars(description = "Amount attributable to this month alone")]
    pub flow_value: f64,

    #[schemars(description = "Year-to-date total through this month within the April-start fiscal year")]
    pub cumulative_value: f64,

    #[serde(default)]
    #[schemars(description = "Flow value of the same item and calendar month one year earlier, 0 when absent")]
    pub prior_year_flow_value: f64,

    #[serde(default)]
    #[schemars(description = "Cumulative value of the same item and calendar month one year earlier, 0 when absent")]
    pub prior_year_cumulative_value: f64,

    #[schemars(description = "Name of the PDF the record was read from")]
    pub source_file: String,

    #[schemars(description = "Which extractor produced the record")]
    pub extraction_mode: ExtractionMode,
}

impl StatementRecord {
    /// Always derived from the calendar month, never stored.
    pub fn fiscal_period(&self) -> FiscalPeriod {
        FiscalPeriod::from_calendar(self.year, self.month)
    }
}

/// Knobs for the extractors and the filename resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ParserOptions {
    #[schemars(description = "Year used when the filename carries no 20YY group")]
    pub default_year: i32,

    #[schemars(description = "Month used when no digit group in the filename is a valid month")]
    pub default_month: u32,

    #[schemars(description = "Zero-based table column preferred as the item label")]
    pub label_column: usize,

    #[schemars(description = "Table rows with fewer cells than this are ignored")]
    pub min_table_columns: usize,

    #[schemars(
        description = "Count rows and lines that were skipped during extraction and report them per file"
    )]
    pub strict: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            default_year: 2025,
            default_month: 1,
            label_column: 2,
            min_table_columns: 6,
            strict: false,
        }
    }
}

impl ParserOptions {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: ParserOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=12).contains(&self.default_month) {
            return Err(StatementError::InvalidDefaultMonth(self.default_month));
        }
        if self.label_column >= self.min_table_columns {
            return Err(StatementError::InvalidLabelColumn {
                column: self.label_column,
                min_columns: self.min_table_columns,
            });
        }
        Ok(())
    }
}
