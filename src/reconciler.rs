use crate::schema::{ExtractionMode, StatementRecord};
use log::debug;
use std::collections::HashMap;

/// Stitches per-file records into one fiscal-ordered series.
pub struct CorpusReconciler;

impl CorpusReconciler {
    /// Runs every reconciliation step in order: fiscal sort, text-mode
    /// cumulative recomputation, prior-year join.
    pub fn reconcile(mut records: Vec<StatementRecord>) -> Vec<StatementRecord> {
        Self::sort_fiscal(&mut records);
        Self::recompute_text_cumulative(&mut records);
        Self::join_prior_year(&mut records);

        debug!("Reconciled {} records", records.len());
        records
    }

    /// Stable sort by `(fiscal year, fiscal month)`. Records of the same
    /// period keep their input order.
    pub fn sort_fiscal(records: &mut [StatementRecord]) {
        records.sort_by_key(|r| r.fiscal_period());
    }

    /// Replaces the cumulative value of text-mode records with the running
    /// sum of their flows within `(fiscal year, item)`. Expects fiscal order.
    pub fn recompute_text_cumulative(records: &mut [StatementRecord]) {
        let mut running: HashMap<(i32, String), f64> = HashMap::new();

        for record in records
            .iter_mut()
            .filter(|r| r.extraction_mode == ExtractionMode::Text)
        {
            let key = (record.fiscal_period().fiscal_year, record.item.clone());
            let total = running.entry(key).or_insert(0.0);
            *total += record.flow_value;
            record.cumulative_value = *total;
        }
    }

    /// Copies the flow and cumulative values of the same item and calendar
    /// month one year earlier. When several records match, the first in
    /// current order wins; with none, both values are 0.
    pub fn join_prior_year(records: &mut [StatementRecord]) {
        let mut index: HashMap<(i32, u32, String), (f64, f64)> = HashMap::new();
        for record in records.iter() {
            index
                .entry((record.year, record.month, record.item.clone()))
                .or_insert((record.flow_value, record.cumulative_value));
        }

        let mut matched = 0usize;
        for record in records.iter_mut() {
            let key = (record.year - 1, record.month, record.item.clone());
            let (flow, cumulative) = match index.get(&key) {
                Some(values) => {
                    matched += 1;
                    *values
                }
                None => (0.0, 0.0),
            };
            record.prior_year_flow_value = flow;
            record.prior_year_cumulative_value = cumulative;
        }

        debug!(
            "Prior-year join matched {} of {} records",
            matched,
            records.len()
        );
    }
}

pub fn reconcile(records: Vec<StatementRecord>) -> Vec<StatementRecord> {
    CorpusReconciler::reconcile(records)
}
