use crate::numeric::{is_digit, PRIVATE_USE_MINUS};

pub const SALES_KEYWORD: &str = "売上";
pub const OPERATING_PROFIT_LABEL: &str = "営業利益";
const OPERATING_PROFIT_MARKERS: [&str; 2] = ["営業損益金額", "営業利益"];

/// Cells that mark a header row rather than an account line.
pub const HEADER_MARKERS: [&str; 2] = ["Account Item", "勘 定 科 目"];

/// English placeholder labels used by synthetic statements, mapped onto the
/// production account vocabulary.
const SYNONYMS: &[(&str, &str)] = &[
    ("Sales", "売上高"),
    ("Advances Received", "前受金"),
    ("EC Sales", "EC売上高"),
    ("Material Cost", "素材費"),
    ("Purchases", "仕入高"),
    ("EC Purchases", "EC仕入高"),
    ("EC Materials", "EC資材"),
    ("EC Fees", "EC手数料"),
    ("EC Ads", "EC広告費"),
    ("EC Shipping", "EC送料"),
    ("EC Outsourcing", "EC内職"),
    ("EC Other", "ECその他"),
    ("Outsource Coding", "外注コーディング費"),
    ("Outsource Design", "外注デザイン費"),
    ("Printing", "印刷費"),
    ("Other Outsourcing", "その他外注費"),
    ("Director Comp", "役員報酬"),
    ("Salaries", "給与手当"),
    ("Bonuses", "賞与"),
    ("Legal Welfare", "法定福利費"),
    ("Welfare", "福利厚生費"),
    ("Travel", "旅費交通費"),
    ("Comm", "通信費"),
    ("Entertainment", "交際費"),
    ("Meetings", "会議費"),
    ("Rent", "地代家賃"),
    ("Insurance", "保険料"),
    ("Utilities", "水道光熱費"),
    ("Fuel", "燃料費"),
    ("Supplies", "消耗品費"),
    ("Taxes Public", "租税公課"),
    ("Freight", "運賃"),
    ("Consumption Tax", "消費税"),
    ("Office Supplies", "事務用品費"),
    ("Ad Expenses", "広告宣伝費"),
    ("Payment Fees", "支払手数料"),
    ("Dues", "諸会費"),
    ("Books", "新聞図書費"),
    ("Misc", "雑費"),
];

pub fn translate_label(label: &str) -> Option<&'static str> {
    SYNONYMS
        .iter()
        .find(|(english, _)| *english == label)
        .map(|(_, native)| *native)
}

/// Folds full-width Latin letters and digits (`ＥＣ`, `１２`) to ASCII.
/// Other characters, including full-width punctuation, are left alone.
pub fn fold_full_width(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '０'..='９' | 'Ａ'..='Ｚ' | 'ａ'..='ｚ' => {
                char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
            }
            _ => c,
        })
        .collect()
}

pub fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Whitespace removed, then full-width letters and digits folded.
pub fn clean_label(raw: &str) -> String {
    fold_full_width(&strip_whitespace(raw))
}

/// Detects labels that are really numbers glued together by the table reader.
///
/// A label is an artifact when, ignoring separators and minus markers, it is
/// longer than three characters, contains a digit, is not a sales line, and
/// more than half its characters are digits.
pub fn is_numeric_artifact(label: &str) -> bool {
    let check: Vec<char> = label
        .chars()
        .filter(|c| !matches!(c, ',' | '△' | '▲') && *c != PRIVATE_USE_MINUS)
        .collect();

    let digits = check.iter().filter(|c| is_digit(**c)).count();
    if digits == 0 || check.len() <= 3 {
        return false;
    }
    if check.iter().collect::<String>().contains(SALES_KEYWORD) {
        return false;
    }

    digits as f64 / check.len() as f64 > 0.5
}

/// Rewrites operating profit variants to the single canonical label.
pub fn canonicalize_label(label: String) -> String {
    if OPERATING_PROFIT_MARKERS.iter().any(|m| label.contains(m)) {
        OPERATING_PROFIT_LABEL.to_string()
    } else {
        label
    }
}

pub fn is_header_cell(cell: &str) -> bool {
    HEADER_MARKERS.contains(&cell.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_full_width() {
        assert_eq!(fold_full_width("ＥＣ売上高"), "EC売上高");
        assert_eq!(fold_full_width("ａｂｃ１２３"), "abc123");
        assert_eq!(fold_full_width("【流動資産】"), "【流動資産】");
    }

    #[test]
    fn test_clean_label() {
        assert_eq!(clean_label(" 売 上\n高 "), "売上高");
        assert_eq!(clean_label("ＥＣ　手数料"), "EC手数料");
    }

    #[test]
    fn test_artifact_three_characters_kept() {
        assert!(!is_numeric_artifact("123"));
        assert!(!is_numeric_artifact("1,2,3"));
    }

    #[test]
    fn test_artifact_all_digits_rejected() {
        assert!(is_numeric_artifact("1234"));
        assert!(is_numeric_artifact("1,234,567"));
        assert!(is_numeric_artifact("△1234"));
    }

    #[test]
    fn test_artifact_mixed_labels() {
        // exactly half digits is not enough
        assert!(!is_numeric_artifact("12ab"));
        assert!(is_numeric_artifact("123a"));
        assert!(!is_numeric_artifact("EC2"));
        assert!(!is_numeric_artifact("第2期繰越"));
    }

    #[test]
    fn test_artifact_sales_keyword_exempt() {
        assert!(!is_numeric_artifact("売上12345"));
        assert!(is_numeric_artifact("仕入12345"));
    }

    #[test]
    fn test_artifact_no_digits() {
        assert!(!is_numeric_artifact("現金預金"));
        assert!(!is_numeric_artifact(""));
    }

    #[test]
    fn test_canonicalize_operating_profit() {
        assert_eq!(canonicalize_label("営業損益金額".to_string()), "営業利益");
        assert_eq!(canonicalize_label("【営業利益】".to_string()), "営業利益");
        assert_eq!(canonicalize_label("経常利益".to_string()), "経常利益");
    }

    #[test]
    fn test_translate_label() {
        assert_eq!(translate_label("Sales"), Some("売上高"));
        assert_eq!(translate_label("EC Sales"), Some("EC売上高"));
        assert_eq!(translate_label("Misc"), Some("雑費"));
        assert_eq!(translate_label("sales"), None);
        assert_eq!(translate_label("売上高"), None);
    }

    #[test]
    fn test_header_cells() {
        assert!(is_header_cell("Account Item"));
        assert!(is_header_cell(" 勘 定 科 目 "));
        assert!(!is_header_cell("勘定科目"));
    }
}
