//! Page-level extraction.
//!
//! Each page is read one of two ways, chosen by what is on it: ruled tables
//! (real trial balances) or plain text lines (synthetic statements). Both
//! produce [`RawLine`]s of the same shape.

pub mod table;
pub mod text;

use crate::pdf::{PageLayout, Table};
use crate::schema::{ExtractionMode, ParserOptions};

/// One accepted statement line, before period and file metadata are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLine {
    pub item: String,
    pub flow_value: f64,
    pub cumulative_value: f64,
    /// Second-from-last figure of a text line. Not carried into records.
    pub previous_value: Option<f64>,
    pub mode: ExtractionMode,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub lines: Vec<RawLine>,
    pub skipped: usize,
}

impl Extraction {
    pub fn merge(&mut self, other: Extraction) {
        self.lines.extend(other.lines);
        self.skipped += other.skipped;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionStrategy {
    Table(Vec<Table>),
    Text(Vec<String>),
}

impl ExtractionStrategy {
    /// Tables win whenever the page has any; otherwise its text lines are used.
    pub fn for_page(layout: &PageLayout) -> Self {
        let tables = layout.tables();
        if tables.is_empty() {
            ExtractionStrategy::Text(layout.text_lines())
        } else {
            ExtractionStrategy::Table(tables)
        }
    }

    pub fn mode(&self) -> ExtractionMode {
        match self {
            ExtractionStrategy::Table(_) => ExtractionMode::Table,
            ExtractionStrategy::Text(_) => ExtractionMode::Text,
        }
    }

    pub fn extract(&self, month: u32, options: &ParserOptions) -> Extraction {
        match self {
            ExtractionStrategy::Table(tables) => {
                let mut extraction = Extraction::default();
                for rows in tables {
                    extraction.merge(table::extract_rows(rows, month, options));
                }
                extraction
            }
            ExtractionStrategy::Text(lines) => text::extract_lines(lines),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{Segment, TextFragment};

    fn fragment(text: &str, x: f64, y: f64) -> TextFragment {
        TextFragment {
            text: text.to_string(),
            x,
            y,
            font_size: 9.0,
        }
    }

    #[test]
    fn test_text_page_strategy() {
        let mut layout = PageLayout::new(1);
        layout.segments.push(Segment::new((50.0, 715.0), (550.0, 715.0)));
        layout.fragments = vec![
            fragment("Sales", 50.0, 690.0),
            fragment("1,000", 250.0, 690.0),
            fragment("900", 350.0, 690.0),
            fragment("11.1%", 450.0, 690.0),
        ];

        let strategy = ExtractionStrategy::for_page(&layout);
        assert_eq!(strategy.mode(), ExtractionMode::Text);

        let extraction = strategy.extract(9, &ParserOptions::default());
        assert_eq!(extraction.lines.len(), 1);
        assert_eq!(extraction.lines[0].item, "売上高");
        assert_eq!(extraction.lines[0].flow_value, 1000.0);
    }

    #[test]
    fn test_bordered_text_page_reads_lines() {
        let mut layout = PageLayout::new(1);
        layout.segments.extend([
            Segment::new((20.0, 20.0), (575.0, 20.0)),
            Segment::new((20.0, 820.0), (575.0, 820.0)),
            Segment::new((20.0, 20.0), (20.0, 820.0)),
            Segment::new((575.0, 20.0), (575.0, 820.0)),
        ]);
        layout.fragments = vec![
            fragment("Sales", 50.0, 690.0),
            fragment("1,000", 250.0, 690.0),
            fragment("900", 350.0, 690.0),
            fragment("11.1%", 450.0, 690.0),
            fragment("Rent", 50.0, 674.0),
            fragment("300", 250.0, 674.0),
            fragment("300", 350.0, 674.0),
            fragment("0.0%", 450.0, 674.0),
        ];

        let strategy = ExtractionStrategy::for_page(&layout);
        assert_eq!(strategy.mode(), ExtractionMode::Text);

        let extraction = strategy.extract(9, &ParserOptions::default());
        assert_eq!(extraction.lines.len(), 2);
        assert_eq!(extraction.skipped, 0);
        assert_eq!(extraction.lines[1].item, "地代家賃");
    }

    #[test]
    fn test_table_page_strategy() {
        let mut layout = PageLayout::new(1);
        let cols = [10.0, 20.0, 30.0, 130.0, 190.0, 250.0, 310.0, 370.0, 430.0];
        for x in cols {
            layout.segments.push(Segment::new((x, 600.0), (x, 700.0)));
        }
        for y in [700.0, 680.0, 660.0] {
            layout.segments.push(Segment::new((10.0, y), (430.0, y)));
        }
        layout.fragments = vec![
            fragment("Account Item", 35.0, 685.0),
            fragment("売上高", 35.0, 665.0),
            fragment("100", 135.0, 665.0),
            fragment("0", 195.0, 665.0),
            fragment("50", 255.0, 665.0),
            fragment("150", 315.0, 665.0),
            fragment("12.5", 375.0, 665.0),
        ];

        let strategy = ExtractionStrategy::for_page(&layout);
        assert_eq!(strategy.mode(), ExtractionMode::Table);

        let extraction = strategy.extract(9, &ParserOptions::default());
        assert_eq!(extraction.lines.len(), 1);
        let line = &extraction.lines[0];
        assert_eq!(line.item, "売上高");
        assert_eq!(line.flow_value, 50.0);
        assert_eq!(line.cumulative_value, 150.0);
        assert_eq!(line.mode, ExtractionMode::Table);
    }
}
