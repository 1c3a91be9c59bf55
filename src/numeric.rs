//! Number handling for Japanese accounting output.
//!
//! Statements mark negatives in several ways: ASCII and full-width minus signs,
//! `△`/`▲` prefixes, parentheses, and a private-use glyph (U+E538) that the
//! accounting package's embedded font maps its minus sign to.

use crate::labels::fold_full_width;
use regex::Regex;
use std::sync::OnceLock;

pub const PRIVATE_USE_MINUS: char = '\u{E538}';

const MINUS_MARKERS: [char; 6] = ['-', '－', '−', '△', '▲', PRIVATE_USE_MINUS];

pub fn is_minus_marker(c: char) -> bool {
    MINUS_MARKERS.contains(&c)
}

/// Parses a statement cell into a number, or `None` when it is not one.
///
/// Empty cells are `None` rather than zero.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let folded = fold_full_width(raw.trim());
    if folded.is_empty() {
        return None;
    }

    let (body, bracketed) = strip_brackets(&folded);

    let mut cleaned = String::with_capacity(body.len());
    for c in body.chars() {
        match c {
            ',' | '%' => {}
            c if is_minus_marker(c) => cleaned.push('-'),
            c => cleaned.push(c),
        }
    }

    let value = cleaned.trim().parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some(if bracketed { -value.abs() } else { value })
}

fn strip_brackets(s: &str) -> (&str, bool) {
    for (open, close) in [('(', ')'), ('（', '）')] {
        if let Some(inner) = s.strip_prefix(open).and_then(|rest| rest.strip_suffix(close)) {
            return (inner, true);
        }
    }
    (s, false)
}

/// True when a table cell holds only digits once separators and minus
/// markers are removed. An empty remainder is not numeric.
pub fn is_numeric_cell(cell: &str) -> bool {
    let stripped: String = cell
        .chars()
        .filter(|c| !matches!(c, ',' | '.') && !is_minus_marker(*c))
        .collect();
    !stripped.is_empty() && stripped.chars().all(is_digit)
}

pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit() || ('０'..='９').contains(&c)
}

fn numeric_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?[\d,]+(\.\d+)?%?$").expect("numeric token regex"))
}

/// Whitespace-delimited token shape used by plain-text statements.
pub fn is_numeric_token(token: &str) -> bool {
    numeric_token_re().is_match(token)
}

/// Value of a plain-text token: commas removed, nothing else forgiven.
pub fn parse_token_value(token: &str) -> Option<f64> {
    let cleaned = fold_full_width(&token.replace(',', ""));
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_amounts() {
        assert_eq!(parse_amount("1,234"), Some(1234.0));
        assert_eq!(parse_amount("  12.5 "), Some(12.5));
        assert_eq!(parse_amount("45.2%"), Some(45.2));
        assert_eq!(parse_amount("-300"), Some(-300.0));
    }

    #[test]
    fn test_negative_markers() {
        assert_eq!(parse_amount("(1,234)"), Some(-1234.0));
        assert_eq!(parse_amount("（1,234）"), Some(-1234.0));
        assert_eq!(parse_amount("△1,234"), Some(-1234.0));
        assert_eq!(parse_amount("▲1,234"), Some(-1234.0));
        assert_eq!(parse_amount("\u{E538}1,234"), Some(-1234.0));
        assert_eq!(parse_amount("－1,234"), Some(-1234.0));
        assert_eq!(parse_amount("−1,234"), Some(-1234.0));
    }

    #[test]
    fn test_full_width_digits() {
        assert_eq!(parse_amount("１２３４"), Some(1234.0));
    }

    #[test]
    fn test_non_numbers() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("売上高"), None);
        assert_eq!(parse_amount("△"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_numeric_cell() {
        assert!(is_numeric_cell("1,234"));
        assert!(is_numeric_cell("△1,234"));
        assert!(is_numeric_cell("12.5"));
        assert!(is_numeric_cell("１２"));
        assert!(!is_numeric_cell("【流動資産】"));
        assert!(!is_numeric_cell("-"));
        assert!(!is_numeric_cell(""));
        assert!(!is_numeric_cell("45%"));
    }

    #[test]
    fn test_numeric_tokens() {
        assert!(is_numeric_token("1,000"));
        assert!(is_numeric_token("-250.75"));
        assert!(is_numeric_token("12.5%"));
        assert!(!is_numeric_token("Sales"));
        assert!(!is_numeric_token("1.2.3"));
        assert!(!is_numeric_token("+5"));
    }

    #[test]
    fn test_token_values() {
        assert_eq!(parse_token_value("1,000"), Some(1000.0));
        assert_eq!(parse_token_value("-250.75"), Some(-250.75));
        assert_eq!(parse_token_value("12.5%"), None);
        assert_eq!(parse_token_value(",,"), None);
    }
}
