use super::{Extraction, RawLine};
use crate::labels::translate_label;
use crate::numeric::{is_numeric_token, parse_token_value};
use crate::schema::ExtractionMode;

/// Reads `<label...> <current> <previous> <ratio>` from one text line.
///
/// The cumulative value is provisional: it equals the flow until the
/// reconciler recomputes it across the fiscal year.
pub fn parse_line(line: &str) -> Option<RawLine> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return None;
    }
    if parts.iter().filter(|p| is_numeric_token(p)).count() < 2 {
        return None;
    }

    let n = parts.len();
    if !is_numeric_token(parts[n - 3]) {
        return None;
    }
    let flow_value = parse_token_value(parts[n - 3])?;
    let previous_value = parse_token_value(parts[n - 2])?;

    let raw_label = parts[..n - 3].join(" ");
    let raw_label = raw_label.trim();
    let item = translate_label(raw_label)
        .map(str::to_string)
        .unwrap_or_else(|| raw_label.to_string());

    Some(RawLine {
        item,
        flow_value,
        cumulative_value: flow_value,
        previous_value: Some(previous_value),
        mode: ExtractionMode::Text,
    })
}

/// Reads every line of a text page. Blank lines are passed over; other lines
/// that do not parse are counted in `skipped`.
pub fn extract_lines(lines: &[String]) -> Extraction {
    let mut extraction = Extraction::default();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(raw) => extraction.lines.push(raw),
            None => extraction.skipped += 1,
        }
    }

    extraction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_line() {
        let line = parse_line("Sales 1,200,000 1,000,000 +20.0%").unwrap();
        assert_eq!(line.item, "売上高");
        assert_eq!(line.flow_value, 1_200_000.0);
        assert_eq!(line.cumulative_value, 1_200_000.0);
        assert_eq!(line.previous_value, Some(1_000_000.0));
        assert_eq!(line.mode, ExtractionMode::Text);
    }

    #[test]
    fn test_multi_word_label_translated() {
        let line = parse_line("EC Shipping 45,000 40,000 12.5%").unwrap();
        assert_eq!(line.item, "EC送料");
    }

    #[test]
    fn test_unknown_label_kept() {
        let line = parse_line("Special Bonus Pool 500 400 25.0%").unwrap();
        assert_eq!(line.item, "Special Bonus Pool");
    }

    #[test]
    fn test_negative_values() {
        let line = parse_line("Misc -1,500 2,000 -175.0%").unwrap();
        assert_eq!(line.item, "雑費");
        assert_eq!(line.flow_value, -1500.0);
    }

    #[test]
    fn test_rejected_lines() {
        assert!(parse_line("Account Item Current Previous YoY").is_none());
        assert!(parse_line("Monthly Trial Balance - Month 9 2025 Fiscal Year").is_none());
        assert!(parse_line("Sales 1,000").is_none());
        // third-from-last must be numeric
        assert!(parse_line("Sales Previous 1,000 2,000").is_none());
        // a percent on the previous figure does not parse
        assert!(parse_line("Rent 100 5% 3%").is_none());
    }

    #[test]
    fn test_extract_lines_counts_skips() {
        let lines = vec![
            "Monthly Trial Balance - Month 9".to_string(),
            "".to_string(),
            "Account Item Current Previous YoY".to_string(),
            "Sales 1,000 900 11.1%".to_string(),
            "Rent 300 300 0.0%".to_string(),
        ];
        let extraction = extract_lines(&lines);
        assert_eq!(extraction.lines.len(), 2);
        assert_eq!(extraction.skipped, 2);
        assert_eq!(extraction.lines[1].item, "地代家賃");
    }
}
