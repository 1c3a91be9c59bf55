//! Diagnostics gathered during a load.
//!
//! A [`ParseTrace`] is created by the caller (one per load) and threaded through
//! every parse call, so nothing is shared between loads.

use crate::schema::ExtractionMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub source_file: String,
    pub year: i32,
    pub month: u32,
    pub table_pages: usize,
    pub text_pages: usize,
    pub records: usize,
    /// Rows or lines that could not be read. Only counted in strict mode.
    pub skipped_rows: Option<usize>,
    pub error: Option<String>,
}

impl FileReport {
    pub fn new(source_file: impl Into<String>, year: i32, month: u32) -> Self {
        Self {
            source_file: source_file.into(),
            year,
            month,
            ..Self::default()
        }
    }

    pub fn note_page(&mut self, mode: ExtractionMode) {
        match mode {
            ExtractionMode::Table => self.table_pages += 1,
            ExtractionMode::Text => self.text_pages += 1,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseTrace {
    entries: Vec<String>,
    files: Vec<FileReport>,
}

impl ParseTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_period(&mut self, filename: &str, year: i32, month: u32) {
        self.entries
            .push(format!("Parsing: {} -> Result: {}-{}", filename, year, month));
    }

    pub fn push_report(&mut self, report: FileReport) {
        self.files.push(report);
    }

    /// Operator-facing lines, in parse order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn files(&self) -> &[FileReport] {
        &self.files
    }

    pub fn failed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.is_failed())
    }

    pub fn total_skipped_rows(&self) -> Option<usize> {
        self.files
            .iter()
            .map(|f| f.skipped_rows)
            .try_fold(0usize, |acc, n| n.map(|n| acc + n))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.files.clear();
    }
}
