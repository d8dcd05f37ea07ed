//! Tokenizer for the Java properties format.
//!
//! Unlike a plain key/value reader, every entry remembers where its raw value
//! lives in the source text. Callers rewrite a value by splicing a new escaped
//! value into that byte range, which leaves every other byte of the file
//! untouched.
//!
//! Supported syntax follows `java.util.Properties::load`:
//! - `#` and `!` comment lines, blank lines
//! - `=`, `:` or whitespace separators
//! - `\t`, `\n`, `\r`, `\f`, `\uXXXX` and identity escapes (`\:`, `\=`, `\\`)
//! - line continuation through an odd number of trailing backslashes

use std::ops::Range;
use thiserror::Error;

/// Errors produced while tokenizing a properties file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertiesError {
    #[error("malformed \\uxxxx escape on line {line}")]
    MalformedUnicodeEscape { line: usize },
}

/// Line terminator style of a properties file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
    Cr,
}

impl LineEnding {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }
}

/// One logical `key=value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Unescaped key.
    pub key: String,
    /// Unescaped value with continuations joined.
    pub value: String,
    /// Byte range of the raw, still escaped, value in the source text.
    pub value_span: Range<usize>,
    /// Byte range of the whole logical line including its terminator.
    pub line_span: Range<usize>,
    /// 1-based number of the first natural line of the entry.
    pub line: usize,
}

impl Entry {
    /// Raw value text as written in `source`.
    pub fn raw_value<'a>(&self, source: &'a str) -> &'a str {
        &source[self.value_span.clone()]
    }

    /// Whether the logical line ends with a line terminator.
    pub fn is_terminated(&self, source: &str) -> bool {
        source[..self.line_span.end].ends_with(['\n', '\r'])
    }
}

/// Parsed properties file. Holds spans into the text it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertiesDocument {
    entries: Vec<Entry>,
    line_ending: LineEnding,
}

struct NaturalLine {
    start: usize,
    /// End of content, before the terminator.
    end: usize,
    /// Start of the following line.
    next: usize,
}

impl PropertiesDocument {
    /// Tokenize `text` into logical entries.
    pub fn parse(text: &str) -> Result<Self, PropertiesError> {
        let lines = natural_lines(text);
        let line_ending = detect_line_ending(text, &lines);
        let bytes = text.as_bytes();
        let mut entries = Vec::new();

        let mut idx = 0;
        while idx < lines.len() {
            let first = &lines[idx];
            let start = first.start + leading_ws_len(&text[first.start..first.end]);
            if start == first.end || matches!(bytes[start], b'#' | b'!') {
                idx += 1;
                continue;
            }

            // Logical line as (char, byte offset) pairs, continuations removed.
            let mut chars: Vec<(char, usize)> = Vec::new();
            let mut pos = start;
            let mut last = idx;
            loop {
                let line = &lines[last];
                let continues = trailing_backslashes(&text[pos..line.end]) % 2 == 1;
                let body_end = if continues { line.end - 1 } else { line.end };
                chars.extend(text[pos..body_end].char_indices().map(|(off, ch)| (ch, pos + off)));
                if !continues || last + 1 == lines.len() {
                    break;
                }
                last += 1;
                let next = &lines[last];
                pos = next.start + leading_ws_len(&text[next.start..next.end]);
            }

            let mut key_end = 0;
            let mut escaped = false;
            while key_end < chars.len() {
                let ch = chars[key_end].0;
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == '=' || ch == ':' || is_ws(ch) {
                    break;
                }
                key_end += 1;
            }

            let mut value_start = key_end;
            while value_start < chars.len() && is_ws(chars[value_start].0) {
                value_start += 1;
            }
            if value_start < chars.len() && matches!(chars[value_start].0, '=' | ':') {
                value_start += 1;
                while value_start < chars.len() && is_ws(chars[value_start].0) {
                    value_start += 1;
                }
            }

            let line_no = idx + 1;
            let span_start = chars
                .get(value_start)
                .map_or(lines[last].end, |&(_, offset)| offset);

            entries.push(Entry {
                key: unescape(chars[..key_end].iter().map(|&(ch, _)| ch), line_no)?,
                value: unescape(chars[value_start..].iter().map(|&(ch, _)| ch), line_no)?,
                value_span: span_start..lines[last].end,
                line_span: first.start..lines[last].next,
                line: line_no,
            });
            idx = last + 1;
        }

        Ok(Self {
            entries,
            line_ending,
        })
    }

    #[cfg(test)]
    fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Effective entry for `key`. Later duplicates override earlier ones.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().rev().find(|entry| entry.key == key)
    }

    /// All entries for `key` in file order.
    pub fn all(&self, key: &str) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(move |entry| entry.key == key)
    }

    /// First line terminator found in the file, `\n` when there is none.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }
}

/// How special characters were escaped in an existing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EscapeStyle {
    pub colons: bool,
    pub equals: bool,
}

impl EscapeStyle {
    /// Style matching the escaping already present in `raw`.
    pub fn detect(raw: &str) -> Self {
        Self {
            colons: raw.contains("\\:"),
            equals: raw.contains("\\="),
        }
    }
}

/// Escape `value` so that [`PropertiesDocument::parse`] reads it back verbatim.
pub fn escape_value(value: &str, style: EscapeStyle) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    for (idx, ch) in value.chars().enumerate() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            ' ' if idx == 0 => out.push_str("\\ "),
            ':' if style.colons => out.push_str("\\:"),
            '=' if style.equals => out.push_str("\\="),
            _ => out.push(ch),
        }
    }
    out
}

fn natural_lines(text: &str) -> Vec<NaturalLine> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(NaturalLine {
                    start,
                    end: i,
                    next: i + 1,
                });
                i += 1;
                start = i;
            }
            b'\r' => {
                let next = if bytes.get(i + 1) == Some(&b'\n') {
                    i + 2
                } else {
                    i + 1
                };
                lines.push(NaturalLine {
                    start,
                    end: i,
                    next,
                });
                i = next;
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        lines.push(NaturalLine {
            start,
            end: bytes.len(),
            next: bytes.len(),
        });
    }
    lines
}

fn detect_line_ending(text: &str, lines: &[NaturalLine]) -> LineEnding {
    lines
        .iter()
        .find(|line| line.next > line.end)
        .map_or(LineEnding::Lf, |line| match &text[line.end..line.next] {
            "\r\n" => LineEnding::CrLf,
            "\r" => LineEnding::Cr,
            _ => LineEnding::Lf,
        })
}

fn is_ws(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\x0c')
}

fn leading_ws_len(s: &str) -> usize {
    s.bytes()
        .take_while(|b| matches!(b, b' ' | b'\t' | b'\x0c'))
        .count()
}

fn trailing_backslashes(s: &str) -> usize {
    s.bytes().rev().take_while(|&b| b == b'\\').count()
}

fn unescape(mut chars: impl Iterator<Item = char>, line: usize) -> Result<String, PropertiesError> {
    let mut out = String::new();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let mut code = 0u32;
                for _ in 0..4 {
                    let digit = chars
                        .next()
                        .and_then(|c| c.to_digit(16))
                        .ok_or(PropertiesError::MalformedUnicodeEscape { line })?;
                    code = code * 16 + digit;
                }
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}
