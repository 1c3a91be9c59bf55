//! `ToUnicode` CMap parsing: enough of `bfchar`, `bfrange` and
//! `codespacerange` to turn CID-keyed strings back into text.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Largest `bfrange` accepted, one full two-byte code space.
const MAX_RANGE_ENTRIES: u32 = 0x10000;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToUnicodeMap {
    map: HashMap<u32, String>,
    code_len: usize,
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<([0-9A-Fa-f]*)>|\[|\]").expect("cmap token regex"))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Open,
    Close,
}

fn tokens(section: &str) -> Vec<Token> {
    token_re()
        .captures_iter(section)
        .filter_map(|caps| match caps.get(1) {
            Some(hex) => hex_bytes(hex.as_str()).map(Token::Hex),
            None if &caps[0] == "[" => Some(Token::Open),
            None => Some(Token::Close),
        })
        .collect()
}

fn hex_bytes(hex: &str) -> Option<Vec<u8>> {
    // odd-length hex strings are padded with a trailing zero
    let padded = if hex.len() % 2 == 1 {
        format!("{}0", hex)
    } else {
        hex.to_string()
    };
    (0..padded.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&padded[i..i + 2], 16).ok())
        .collect()
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
}

fn utf16_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => u16::from(*single),
            _ => 0,
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// Decodes a PDF text string that starts with a UTF-16BE byte order mark.
pub fn decode_utf16_be(bytes: &[u8]) -> Option<String> {
    bytes.strip_prefix(&[0xFE, 0xFF]).map(utf16_text)
}

fn sections<'a>(data: &'a str, begin: &str, end: &str) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut rest = data;
    while let Some(start) = rest.find(begin) {
        let after = &rest[start + begin.len()..];
        match after.find(end) {
            Some(stop) => {
                out.push(&after[..stop]);
                rest = &after[stop + end.len()..];
            }
            None => break,
        }
    }
    out
}

impl ToUnicodeMap {
    pub fn parse(data: &[u8]) -> Self {
        let text = String::from_utf8_lossy(data);
        let mut cmap = ToUnicodeMap::default();

        for section in sections(&text, "begincodespacerange", "endcodespacerange") {
            if let Some(Token::Hex(lo)) = tokens(section).first() {
                cmap.code_len = cmap.code_len.max(lo.len());
            }
        }

        for section in sections(&text, "beginbfchar", "endbfchar") {
            let toks = tokens(section);
            for pair in toks.chunks(2) {
                if let [Token::Hex(src), Token::Hex(dst)] = pair {
                    cmap.code_len = cmap.code_len.max(src.len());
                    cmap.map.insert(code_value(src), utf16_text(dst));
                }
            }
        }

        for section in sections(&text, "beginbfrange", "endbfrange") {
            cmap.parse_ranges(&tokens(section));
        }

        if cmap.code_len == 0 {
            cmap.code_len = 1;
        }
        cmap
    }

    fn parse_ranges(&mut self, toks: &[Token]) {
        let mut i = 0;
        while i + 2 < toks.len() {
            let (lo, hi) = match (&toks[i], &toks[i + 1]) {
                (Token::Hex(lo), Token::Hex(hi)) => (lo, hi),
                _ => {
                    i += 1;
                    continue;
                }
            };
            self.code_len = self.code_len.max(lo.len());
            let start = code_value(lo);
            let end = code_value(hi);
            // inverted or wider than a two-byte code space: malformed, skipped
            let in_bounds = end >= start && end - start < MAX_RANGE_ENTRIES;

            match &toks[i + 2] {
                Token::Hex(dst) => {
                    if in_bounds {
                        for (offset, code) in (start..=end).enumerate() {
                            self.map.insert(code, offset_text(dst, offset as u32));
                        }
                    }
                    i += 3;
                }
                Token::Open => {
                    let mut j = i + 3;
                    let mut next = Some(start);
                    while j < toks.len() && toks[j] != Token::Close {
                        if let Token::Hex(dst) = &toks[j] {
                            if let Some(code) = next.filter(|code| in_bounds && *code <= end) {
                                self.map.insert(code, utf16_text(dst));
                                next = code.checked_add(1);
                            }
                        }
                        j += 1;
                    }
                    i = j + 1;
                }
                Token::Close => i += 3,
            }
        }
    }

    pub fn code_len(&self) -> usize {
        self.code_len
    }

    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Destination of a `bfrange` entry: the last UTF-16 unit is incremented by
/// the code's offset from the range start.
fn offset_text(dst: &[u8], offset: u32) -> String {
    let mut bytes = dst.to_vec();
    if bytes.len() >= 2 {
        let n = bytes.len();
        let last = u16::from_be_bytes([bytes[n - 2], bytes[n - 1]]);
        let bumped = last.wrapping_add(offset as u16).to_be_bytes();
        bytes[n - 2] = bumped[0];
        bytes[n - 1] = bumped[1];
    } else if let Some(last) = bytes.last_mut() {
        *last = last.wrapping_add(offset as u8);
    }
    utf16_text(&bytes)
}
