pub mod cmap;
pub mod content;
pub mod lattice;

pub use lattice::{detect_tables, Table};

use crate::error::Result;
use log::debug;
use std::path::Path;

/// Baselines closer than this belong to the same text line.
pub const LINE_TOLERANCE: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    /// Origin of the first glyph in device space (PDF coordinates, y up).
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
}

impl TextFragment {
    /// Rough advance for `text`: half an em for narrow glyphs, a full em for
    /// CJK and other wide glyphs.
    pub fn estimate_width(text: &str, font_size: f64) -> f64 {
        text.chars()
            .map(|c| if (c as u32) >= 0x2E80 { 1.0 } else { 0.5 })
            .sum::<f64>()
            * font_size
    }

    pub fn right(&self) -> f64 {
        self.x + Self::estimate_width(&self.text, self.font_size)
    }
}

/// A painted straight edge, endpoints ordered left-to-right / bottom-to-top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Segment {
    pub fn new(from: (f64, f64), to: (f64, f64)) -> Self {
        let (a, b) = if (from.0, from.1) <= (to.0, to.1) {
            (from, to)
        } else {
            (to, from)
        };
        Self {
            x0: a.0,
            y0: a.1,
            x1: b.0,
            y1: b.1,
        }
    }

    pub fn is_horizontal(&self, tolerance: f64) -> bool {
        (self.y1 - self.y0).abs() <= tolerance && (self.x1 - self.x0).abs() > tolerance
    }

    pub fn is_vertical(&self, tolerance: f64) -> bool {
        (self.x1 - self.x0).abs() <= tolerance && (self.y1 - self.y0).abs() > tolerance
    }

    pub fn length(&self) -> f64 {
        ((self.x1 - self.x0).powi(2) + (self.y1 - self.y0).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub page_number: u32,
    pub fragments: Vec<TextFragment>,
    pub segments: Vec<Segment>,
}

impl PageLayout {
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number,
            ..Self::default()
        }
    }

    /// Ruled tables found on the page, top to bottom.
    pub fn tables(&self) -> Vec<Table> {
        detect_tables(self)
    }

    /// Plain text lines, top to bottom, fragments on one baseline joined by a
    /// single space.
    pub fn text_lines(&self) -> Vec<String> {
        group_by_baseline(self.fragments.iter().collect())
            .into_iter()
            .map(|line| {
                line.iter()
                    .map(|f| f.text.trim())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

/// Groups fragments into lines (top to bottom), each sorted left to right.
pub(crate) fn group_by_baseline(mut fragments: Vec<&TextFragment>) -> Vec<Vec<&TextFragment>> {
    fragments.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<Vec<&TextFragment>> = Vec::new();
    for fragment in fragments {
        match lines.last_mut() {
            Some(line) if (line[0].y - fragment.y).abs() <= LINE_TOLERANCE => line.push(fragment),
            _ => lines.push(vec![fragment]),
        }
    }

    for line in &mut lines {
        line.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    lines
}

/// A loaded statement PDF.
pub struct PdfDocument {
    doc: lopdf::Document,
}

impl PdfDocument {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let doc = lopdf::Document::load(path)?;
        Ok(Self { doc })
    }

    pub fn load_mem(bytes: &[u8]) -> Result<Self> {
        let doc = lopdf::Document::load_mem(bytes)?;
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Interprets every page, in page order.
    pub fn page_layouts(&self) -> Result<Vec<PageLayout>> {
        self.doc
            .get_pages()
            .into_iter()
            .map(|(number, page_id)| {
                let layout = content::interpret_page(&self.doc, page_id, number)?;
                debug!(
                    "Page {}: {} text fragments, {} rulings",
                    number,
                    layout.fragments.len(),
                    layout.segments.len()
                );
                Ok(layout)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(text: &str, x: f64, y: f64) -> TextFragment {
        TextFragment {
            text: text.to_string(),
            x,
            y,
            font_size: 10.0,
        }
    }

    #[test]
    fn test_text_lines_group_by_baseline() {
        let mut layout = PageLayout::new(1);
        layout.fragments = vec![
            fragment("1,000", 250.0, 700.0),
            fragment("Sales", 50.0, 700.5),
            fragment("900", 350.0, 699.0),
            fragment("Rent", 50.0, 680.0),
            fragment("200", 250.0, 680.0),
        ];

        assert_eq!(layout.text_lines(), vec!["Sales 1,000 900", "Rent 200"]);
    }

    #[test]
    fn test_segment_orientation() {
        let h = Segment::new((100.0, 50.0), (10.0, 50.0));
        assert_eq!((h.x0, h.x1), (10.0, 100.0));
        assert!(h.is_horizontal(0.5));
        assert!(!h.is_vertical(0.5));
        assert_eq!(h.length(), 90.0);

        let v = Segment::new((10.0, 80.0), (10.0, 20.0));
        assert_eq!((v.y0, v.y1), (20.0, 80.0));
        assert!(v.is_vertical(0.5));
    }

    #[test]
    fn test_estimate_width() {
        assert_eq!(TextFragment::estimate_width("ab", 10.0), 10.0);
        assert_eq!(TextFragment::estimate_width("売上", 10.0), 20.0);
    }

    #[test]
    fn test_load_garbage_fails() {
        assert!(PdfDocument::load_mem(b"not a pdf").is_err());
    }
}
