//! Content stream interpreter.
//!
//! Walks one page's operators and records what the extractors need: each
//! shown string with its device-space origin, and every ruling segment that
//! gets painted. Glyph widths are estimated from the font size.

use super::cmap::{decode_utf16_be, ToUnicodeMap};
use super::{PageLayout, Segment, TextFragment};
use crate::error::Result;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;

const MAX_PARENT_DEPTH: usize = 32;

/// Gap in thousandths of a text unit inside a `TJ` array read as a space.
const TJ_SPACE_THRESHOLD: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(tx: f64, ty: f64) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// `self × other` in PDF row-vector convention.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Vertical scale, used to turn a font size into device units.
    fn scale_y(&self) -> f64 {
        (self.b * self.b + self.d * self.d).sqrt()
    }
}

/// How one font's string bytes become text.
#[derive(Debug, Clone, Default)]
struct FontDecoder {
    cmap: Option<ToUnicodeMap>,
    two_byte: bool,
}

impl FontDecoder {
    fn from_dict(doc: &Document, font: &Dictionary) -> Self {
        let is_type0 = font
            .get(b"Subtype")
            .and_then(Object::as_name)
            .map(|name| name == b"Type0")
            .unwrap_or(false);

        let cmap = font
            .get(b"ToUnicode")
            .ok()
            .and_then(|obj| resolve(doc, obj))
            .and_then(|obj| obj.as_stream().ok())
            .and_then(|stream| stream_bytes(stream).ok())
            .map(|data| ToUnicodeMap::parse(&data))
            .filter(|cmap| !cmap.is_empty());

        let two_byte = match &cmap {
            Some(cmap) => cmap.code_len() >= 2,
            None => is_type0,
        };

        Self { cmap, two_byte }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        if self.cmap.is_none() {
            if let Some(text) = decode_utf16_be(bytes) {
                return text;
            }
        }

        let width = if self.two_byte { 2 } else { 1 };
        bytes
            .chunks(width)
            .map(|chunk| {
                let code = chunk.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
                match &self.cmap {
                    // unmapped glyphs are dropped
                    Some(cmap) => cmap.lookup(code).map(str::to_string).unwrap_or_default(),
                    None => char::from_u32(code).map(String::from).unwrap_or_default(),
                }
            })
            .collect()
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn stream_bytes(stream: &lopdf::Stream) -> Result<Vec<u8>> {
    if stream.dict.has(b"Filter") {
        Ok(stream.decompressed_content()?)
    } else {
        Ok(stream.content.clone())
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn numbers(operands: &[Object]) -> Vec<f64> {
    operands.iter().filter_map(number).collect()
}

/// Finds the page's resource dictionary, following `Parent` links for
/// resources inherited from the page tree.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_PARENT_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve(doc, resources).and_then(|obj| obj.as_dict().ok());
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn page_fonts(doc: &Document, page_id: ObjectId) -> HashMap<Vec<u8>, FontDecoder> {
    let mut fonts = HashMap::new();
    let font_dict = page_resources(doc, page_id)
        .and_then(|resources| resources.get(b"Font").ok())
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok());

    if let Some(font_dict) = font_dict {
        for (name, obj) in font_dict.iter() {
            if let Some(font) = resolve(doc, obj).and_then(|o| o.as_dict().ok()) {
                fonts.insert(name.clone(), FontDecoder::from_dict(doc, font));
            }
        }
    }
    fonts
}

struct TextState {
    matrix: Matrix,
    line_matrix: Matrix,
    font: Vec<u8>,
    font_size: f64,
    leading: f64,
    horizontal_scale: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            font: Vec::new(),
            font_size: 0.0,
            leading: 0.0,
            horizontal_scale: 1.0,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translate(tx, ty).then(&self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.leading;
        self.move_line(0.0, -leading);
    }
}

struct Interpreter<'a> {
    fonts: &'a HashMap<Vec<u8>, FontDecoder>,
    ctm: Matrix,
    stack: Vec<Matrix>,
    text: TextState,
    current: Option<(f64, f64)>,
    subpath_start: Option<(f64, f64)>,
    pending: Vec<Segment>,
    layout: PageLayout,
}

impl<'a> Interpreter<'a> {
    fn new(fonts: &'a HashMap<Vec<u8>, FontDecoder>, page_number: u32) -> Self {
        Self {
            fonts,
            ctm: Matrix::IDENTITY,
            stack: Vec::new(),
            text: TextState::default(),
            current: None,
            subpath_start: None,
            pending: Vec::new(),
            layout: PageLayout::new(page_number),
        }
    }

    fn run(mut self, content: &Content) -> PageLayout {
        for op in &content.operations {
            self.step(&op.operator, &op.operands);
        }
        self.layout
    }

    fn step(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "q" => self.stack.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.stack.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let [a, b, c, d, e, f] = numbers(operands)[..] {
                    self.ctm = Matrix { a, b, c, d, e, f }.then(&self.ctm);
                }
            }
            "BT" => {
                self.text.matrix = Matrix::IDENTITY;
                self.text.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                if let [Object::Name(name), size] = operands {
                    self.text.font = name.clone();
                    self.text.font_size = number(size).unwrap_or(0.0);
                }
            }
            "TL" => {
                if let [leading] = numbers(operands)[..] {
                    self.text.leading = leading;
                }
            }
            "Tz" => {
                if let [scale] = numbers(operands)[..] {
                    self.text.horizontal_scale = scale / 100.0;
                }
            }
            "Td" => {
                if let [tx, ty] = numbers(operands)[..] {
                    self.text.move_line(tx, ty);
                }
            }
            "TD" => {
                if let [tx, ty] = numbers(operands)[..] {
                    self.text.leading = -ty;
                    self.text.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let [a, b, c, d, e, f] = numbers(operands)[..] {
                    let m = Matrix { a, b, c, d, e, f };
                    self.text.matrix = m;
                    self.text.line_matrix = m;
                }
            }
            "T*" => self.text.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = self.decode(bytes);
                    self.show(text);
                }
            }
            "'" => {
                self.text.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = self.decode(bytes);
                    self.show(text);
                }
            }
            "\"" => {
                self.text.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    let text = self.decode(bytes);
                    self.show(text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let mut text = String::new();
                    for item in items {
                        match item {
                            Object::String(bytes, _) => text.push_str(&self.decode(bytes)),
                            other => {
                                if number(other).is_some_and(|gap| gap < -TJ_SPACE_THRESHOLD)
                                    && !text.ends_with(' ')
                                {
                                    text.push(' ');
                                }
                            }
                        }
                    }
                    self.show(text);
                }
            }
            "m" => {
                if let [x, y] = numbers(operands)[..] {
                    let p = self.ctm.apply(x, y);
                    self.current = Some(p);
                    self.subpath_start = Some(p);
                }
            }
            "l" => {
                if let [x, y] = numbers(operands)[..] {
                    let p = self.ctm.apply(x, y);
                    if let Some(from) = self.current {
                        self.pending.push(Segment::new(from, p));
                    }
                    self.current = Some(p);
                }
            }
            "h" => {
                if let (Some(from), Some(start)) = (self.current, self.subpath_start) {
                    self.pending.push(Segment::new(from, start));
                    self.current = Some(start);
                }
            }
            "re" => {
                if let [x, y, w, h] = numbers(operands)[..] {
                    let corners = [
                        self.ctm.apply(x, y),
                        self.ctm.apply(x + w, y),
                        self.ctm.apply(x + w, y + h),
                        self.ctm.apply(x, y + h),
                    ];
                    for i in 0..4 {
                        self.pending.push(Segment::new(corners[i], corners[(i + 1) % 4]));
                    }
                    self.current = Some(corners[0]);
                    self.subpath_start = Some(corners[0]);
                }
            }
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                self.layout.segments.append(&mut self.pending);
                self.current = None;
                self.subpath_start = None;
            }
            "n" => {
                self.pending.clear();
                self.current = None;
                self.subpath_start = None;
            }
            _ => {}
        }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        match self.fonts.get(&self.text.font) {
            Some(font) => font.decode(bytes),
            None => FontDecoder::default().decode(bytes),
        }
    }

    fn show(&mut self, text: String) {
        let render = self.text.matrix.then(&self.ctm);
        let (x, y) = render.apply(0.0, 0.0);
        let font_size = self.text.font_size * render.scale_y();

        let advance = TextFragment::estimate_width(&text, self.text.font_size)
            * self.text.horizontal_scale;
        self.text.matrix = Matrix::translate(advance, 0.0).then(&self.text.matrix);

        if text.trim().is_empty() {
            return;
        }
        self.layout.fragments.push(TextFragment {
            text,
            x,
            y,
            font_size,
        });
    }
}

/// Reads one page of `doc` into a [`PageLayout`].
pub fn interpret_page(doc: &Document, page_id: ObjectId, page_number: u32) -> Result<PageLayout> {
    let fonts = page_fonts(doc, page_id);
    let data = doc.get_page_content(page_id)?;
    let content = Content::decode(&data)?;
    Ok(Interpreter::new(&fonts, page_number).run(&content))
}
