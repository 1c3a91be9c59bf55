use crate::schema::ParserOptions;
use crate::trace::ParseTrace;
use chrono::{Days, NaiveDate};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Fiscal years begin in April.
pub const FISCAL_YEAR_START_MONTH: u32 = 4;

/// Position of a calendar month inside the April-start fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FiscalPeriod {
    pub fiscal_year: i32,
    /// April = 1 ... March = 12
    pub fiscal_month: u32,
}

impl FiscalPeriod {
    pub fn from_calendar(year: i32, month: u32) -> Self {
        if month >= FISCAL_YEAR_START_MONTH {
            Self {
                fiscal_year: year,
                fiscal_month: month - 3,
            }
        } else {
            Self {
                fiscal_year: year - 1,
                fiscal_month: month + 9,
            }
        }
    }

    pub fn calendar_month(&self) -> u32 {
        if self.fiscal_month <= 9 {
            self.fiscal_month + 3
        } else {
            self.fiscal_month - 9
        }
    }

    pub fn calendar_year(&self) -> i32 {
        if self.fiscal_month <= 9 {
            self.fiscal_year
        } else {
            self.fiscal_year + 1
        }
    }

    pub fn month_end(&self) -> Option<NaiveDate> {
        last_day_of_month(self.calendar_year(), self.calendar_month())
    }
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.checked_sub_days(Days::new(1))
}

fn year_month_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(20[0-9]{2})(0[1-9]|1[0-2])").expect("year-month regex"))
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"20[0-9]{2}").expect("year regex"))
}

fn digit_group_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+").expect("digit group regex"))
}

/// Derives `(year, month)` from a free-form statement filename.
///
/// A `20YYMM` run wins outright. Otherwise the first `20YY` group is the year
/// and the first other digit group in 1..=12 is the month. Missing parts fall
/// back to `options.default_year` / `options.default_month`.
pub fn period_from_filename(filename: &str, options: &ParserOptions) -> (i32, u32) {
    if let Some(caps) = year_month_re().captures(filename) {
        let year = caps[1].parse::<i32>().ok();
        let month = caps[2].parse::<u32>().ok();
        if let (Some(year), Some(month)) = (year, month) {
            return (year, month);
        }
    }

    let year = year_re()
        .find(filename)
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .unwrap_or(options.default_year);
    let year_text = year.to_string();

    let month = digit_group_re()
        .find_iter(filename)
        .map(|m| m.as_str())
        .filter(|group| *group != year_text)
        .filter_map(|group| group.parse::<u64>().ok())
        .find(|value| (1..=12).contains(value))
        .map(|value| value as u32)
        .unwrap_or(options.default_month);

    (year, month)
}

/// Same as [`period_from_filename`], recording the result in `trace`.
pub fn resolve_period(filename: &str, options: &ParserOptions, trace: &mut ParseTrace) -> (i32, u32) {
    let (year, month) = period_from_filename(filename, options);
    trace.record_period(filename, year, month);
    debug!("Filename: {} -> Parsed: {}-{}", filename, year, month);
    (year, month)
}
