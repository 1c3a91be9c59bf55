//! Directory loading: one PDF at a time, failures isolated per file.

use crate::error::{Result, StatementError};
use crate::export::TrialBalanceDataset;
use crate::extract::{Extraction, ExtractionStrategy};
use crate::normalizer::normalize_all;
use crate::pdf::PdfDocument;
use crate::period::resolve_period;
use crate::reconciler::CorpusReconciler;
use crate::schema::{ParserOptions, StatementRecord};
use crate::trace::{FileReport, ParseTrace};
use log::{debug, info, warn};
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

pub const STATEMENT_EXTENSION: &str = ".pdf";

/// Result of a full load: the reconciled dataset plus the diagnostics
/// gathered along the way.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub dataset: TrialBalanceDataset,
    pub trace: ParseTrace,
}

pub struct StatementLoader {
    options: ParserOptions,
}

impl StatementLoader {
    pub fn new(options: ParserOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Parses every statement in `dir` and reconciles the result.
    ///
    /// Only an unreadable directory is an error. Files that fail to parse are
    /// logged, recorded in the trace and left out of the dataset.
    pub fn load_directory(&self, dir: impl AsRef<Path>) -> Result<LoadOutcome> {
        let dir = dir.as_ref();
        let files = list_statement_files(dir)?;
        info!(
            "Loading {} statement files from {}",
            files.len(),
            dir.display()
        );

        let mut trace = ParseTrace::new();
        let mut records = Vec::new();

        for path in &files {
            match parse_statement_file(path, &self.options, &mut trace) {
                Ok(parsed) => records.extend(parsed),
                Err(e) => warn!("Error parsing {}: {}", path.display(), e),
            }
        }

        let dataset = TrialBalanceDataset::new(CorpusReconciler::reconcile(records));
        info!(
            "Loaded {} records from {} files ({} failed)",
            dataset.len(),
            files.len(),
            trace.failed_files().count()
        );

        Ok(LoadOutcome { dataset, trace })
    }
}

/// Statement files in `dir`, in directory-listing order.
pub fn list_statement_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_statement = path
            .file_name()
            .map(|name| name.to_string_lossy().ends_with(STATEMENT_EXTENSION))
            .unwrap_or(false);
        if is_statement && path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Parses one statement into unreconciled records.
///
/// The filename period and a [`FileReport`] are always recorded in `trace`,
/// including when the file fails; the report then carries the error message.
pub fn parse_statement_file(
    path: impl AsRef<Path>,
    options: &ParserOptions,
    trace: &mut ParseTrace,
) -> Result<Vec<StatementRecord>> {
    let path = path.as_ref();
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let (year, month) = resolve_period(&filename, options, trace);
    let mut report = FileReport::new(filename.clone(), year, month);

    let outcome = isolate_panics(&filename, || {
        parse_pages(path, &filename, year, month, options, &mut report)
    });
    match &outcome {
        Ok(records) => {
            report.records = records.len();
            debug!("{}: {} records", filename, records.len());
        }
        Err(e) => report.error = Some(e.to_string()),
    }
    trace.push_report(report);

    outcome
}

/// Runs `parse` so that a panic inside the PDF stack fails only the current
/// file.
fn isolate_panics<T>(filename: &str, parse: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(parse)).unwrap_or_else(|payload| {
        Err(StatementError::ParserPanic {
            file: filename.to_string(),
            details: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn parse_pages(
    path: &Path,
    filename: &str,
    year: i32,
    month: u32,
    options: &ParserOptions,
    report: &mut FileReport,
) -> Result<Vec<StatementRecord>> {
    let document = PdfDocument::load(path)?;
    debug!("{}: {} pages", filename, document.page_count());
    let layouts = document
        .page_layouts()
        .map_err(|e| StatementError::MalformedContent {
            file: filename.to_string(),
            details: e.to_string(),
        })?;
    let mut extraction = Extraction::default();

    for layout in layouts {
        let strategy = ExtractionStrategy::for_page(&layout);
        debug!(
            "{} page {}: {} mode",
            filename,
            layout.page_number,
            strategy.mode().as_str()
        );
        report.note_page(strategy.mode());
        extraction.merge(strategy.extract(month, options));
    }

    if options.strict {
        report.skipped_rows = Some(extraction.skipped);
    }

    Ok(normalize_all(extraction.lines, year, month, filename))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn test_missing_directory_is_error() {
        let loader = StatementLoader::new(ParserOptions::default()).unwrap();
        assert!(loader
            .load_directory("/definitely/not/a/statement/dir")
            .is_err());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = ParserOptions {
            default_month: 0,
            ..ParserOptions::default()
        };
        assert!(StatementLoader::new(options).is_err());
    }

    #[test]
    fn test_listing_filters_extension() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a_2025_09.pdf", "notes.txt", "b_2025_10.PDF", "c.pdf.bak"] {
            File::create(dir.path().join(name)).unwrap();
        }
        fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let files = list_statement_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_2025_09.pdf".to_string()]);
    }

    #[test]
    fn test_corrupt_file_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2025_09_trial_balance.pdf");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"this is not a pdf").unwrap();

        let mut trace = ParseTrace::new();
        let result = parse_statement_file(&path, &ParserOptions::default(), &mut trace);
        assert!(result.is_err());

        assert_eq!(
            trace.entries(),
            &["Parsing: 2025_09_trial_balance.pdf -> Result: 2025-9".to_string()]
        );
        let report = &trace.files()[0];
        assert!(report.is_failed());
        assert_eq!((report.year, report.month), (2025, 9));
        assert_eq!(report.records, 0);
    }

    #[test]
    fn test_panics_become_file_errors() {
        let result: Result<()> = isolate_panics("2025_09.pdf", || panic!("attempt to add with overflow"));
        match result {
            Err(StatementError::ParserPanic { file, details }) => {
                assert_eq!(file, "2025_09.pdf");
                assert_eq!(details, "attempt to add with overflow");
            }
            other => panic!("expected a parser panic error, got {:?}", other),
        }

        let formatted: Result<()> = isolate_panics("a.pdf", || panic!("bad code {}", 7));
        assert!(formatted.unwrap_err().to_string().contains("bad code 7"));

        assert_eq!(isolate_panics("ok.pdf", || Ok(3)).unwrap(), 3);
    }

    #[test]
    fn test_corrupt_file_does_not_abort_load() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("broken_202509.pdf"))
            .unwrap()
            .write_all(b"not a pdf at all")
            .unwrap();

        let loader = StatementLoader::new(ParserOptions::default()).unwrap();
        let outcome = loader.load_directory(dir.path()).unwrap();
        assert!(outcome.dataset.is_empty());
        assert_eq!(outcome.trace.failed_files().count(), 1);
    }
}
