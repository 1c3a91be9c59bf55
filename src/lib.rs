//! # Trial Balance Reconciler
//!
//! Reads a directory of monthly trial balance PDFs and turns them into one
//! flat, fiscal-ordered dataset with month flows, year-to-date totals and
//! prior-year comparatives.
//!
//! ## Core Concepts
//!
//! - **Filename period**: each statement's year and month come from its filename, never its contents
//! - **Table mode**: pages with ruled tables are read cell by cell; the statement's own balance is the cumulative value
//! - **Text mode**: pages without tables are read line by line; cumulative values are recomputed
//! - **Fiscal year**: April-start; March belongs to the fiscal year that began the previous April
//! - **Prior year**: the same item and calendar month one year earlier, 0 when absent
//!
//! ## Example
//!
//! ```rust,ignore
//! use trial_balance_reconciler::*;
//!
//! let outcome = load_trial_balances("statements/")?;
//! for line in outcome.trace.entries() {
//!     println!("{}", line);
//! }
//!
//! if outcome.dataset.is_empty() {
//!     println!("No data");
//! } else {
//!     let sales = outcome
//!         .dataset
//!         .period(2025, 9)
//!         .find(|r| r.item == "売上高");
//!     println!("{:?}", sales);
//!     export::to_csv(&outcome.dataset, std::io::stdout())?;
//! }
//! ```

pub mod error;
pub mod export;
pub mod extract;
pub mod ingestion;
pub mod labels;
pub mod normalizer;
pub mod numeric;
pub mod pdf;
pub mod period;
pub mod reconciler;
pub mod schema;
pub mod trace;

pub use error::{Result, StatementError};
pub use export::{CoverageSummary, DatasetRow, TrialBalanceDataset};
pub use extract::{ExtractionStrategy, RawLine};
pub use ingestion::{list_statement_files, parse_statement_file, LoadOutcome, StatementLoader};
pub use numeric::parse_amount;
pub use period::{period_from_filename, FiscalPeriod, FISCAL_YEAR_START_MONTH};
pub use reconciler::{reconcile, CorpusReconciler};
pub use schema::*;
pub use trace::{FileReport, ParseTrace};

use std::path::Path;

/// Loads and reconciles every statement in `dir` with default options.
pub fn load_trial_balances(dir: impl AsRef<Path>) -> Result<LoadOutcome> {
    load_trial_balances_with(dir, ParserOptions::default())
}

pub fn load_trial_balances_with(
    dir: impl AsRef<Path>,
    options: ParserOptions,
) -> Result<LoadOutcome> {
    StatementLoader::new(options)?.load_directory(dir)
}
