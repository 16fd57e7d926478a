//! Schema-driven tuple matcher.
//!
//! Matches the text of one tuple (parentheses already removed) against a
//! [`FieldGrammar`], field by field, left to right. Each field kind is a
//! small scanner; quoted strings end at the first quote that is not
//! escaped by a backslash, so commas and parentheses inside them never
//! split fields.

use crate::schema::{FieldGrammar, FieldKind};
use memchr::memmem;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::ops::Range;
use thiserror::Error;

/// Escaped form of U+2013 EN DASH as produced by ASCII-escape decoding
const ESCAPED_EN_DASH: &[u8] = b"\\xe2\\x80\\x93";

/// Replace escaped EN DASH sequences with an ASCII hyphen
pub fn normalize_en_dash(tuple: &[u8]) -> Cow<'_, [u8]> {
    let mut matches = memmem::find_iter(tuple, ESCAPED_EN_DASH).peekable();
    if matches.peek().is_none() {
        return Cow::Borrowed(tuple);
    }

    let mut out = Vec::with_capacity(tuple.len());
    let mut last = 0;
    for pos in matches {
        out.extend_from_slice(&tuple[last..pos]);
        out.push(b'-');
        last = pos + ESCAPED_EN_DASH.len();
    }
    out.extend_from_slice(&tuple[last..]);
    Cow::Owned(out)
}

/// Why a tuple did not match its grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TupleError {
    #[error("field {field}: expected {expected}, found end of tuple")]
    UnexpectedEnd { field: usize, expected: FieldKind },
    #[error("field {field}: expected {expected} at byte {offset}")]
    FieldMismatch {
        field: usize,
        expected: FieldKind,
        offset: usize,
    },
    #[error("field {field}: unterminated string starting at byte {offset}")]
    UnterminatedString { field: usize, offset: usize },
    #[error("field {field}: expected ',' at byte {offset}")]
    MissingSeparator { field: usize, offset: usize },
    #[error("unexpected input after last field at byte {offset}")]
    TrailingInput { offset: usize },
}

/// One matched field, borrowing the tuple text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// Bare `NULL` of a nullable field
    Null,
    /// Quoted string including its enclosing quotes, escapes untouched
    Quoted(&'a [u8]),
    /// Integer or decimal literal text
    Number(&'a [u8]),
}

impl<'a> FieldValue<'a> {
    /// Text as it appeared in the tuple
    pub fn raw(&self) -> &'a [u8] {
        match self {
            FieldValue::Null => b"NULL",
            FieldValue::Quoted(text) | FieldValue::Number(text) => text,
        }
    }

    /// Text with the enclosing quotes of a string removed
    pub fn unquoted(&self) -> &'a [u8] {
        match self {
            FieldValue::Quoted(text) => &text[1..text.len() - 1],
            _ => self.raw(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Null,
    Quoted,
    Number,
}

/// Matched fields of one tuple
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    text: &'a [u8],
    spans: SmallVec<[(Token, Range<usize>); 16]>,
}

impl<'a> Fields<'a> {
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<FieldValue<'a>> {
        let (token, span) = self.spans.get(index)?;
        let text = &self.text[span.clone()];
        Some(match token {
            Token::Null => FieldValue::Null,
            Token::Quoted => FieldValue::Quoted(text),
            Token::Number => FieldValue::Number(text),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = FieldValue<'a>> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

/// Matches tuple texts against one table grammar
#[derive(Debug, Clone, Copy)]
pub struct TupleMatcher<'g> {
    grammar: &'g FieldGrammar,
}

impl<'g> TupleMatcher<'g> {
    pub fn new(grammar: &'g FieldGrammar) -> Self {
        Self { grammar }
    }

    /// Match the whole of `text`; every field of the grammar must be present
    /// and nothing may follow the last one
    pub fn match_tuple<'t>(&self, text: &'t [u8]) -> Result<Fields<'t>, TupleError> {
        let mut spans = SmallVec::new();
        let mut pos = 0;

        for (field, &kind) in self.grammar.fields().iter().enumerate() {
            if field > 0 {
                match text.get(pos) {
                    Some(b',') => pos += 1,
                    Some(_) => return Err(TupleError::MissingSeparator { field, offset: pos }),
                    None => {
                        return Err(TupleError::UnexpectedEnd {
                            field,
                            expected: kind,
                        })
                    }
                }
            }

            if pos >= text.len() {
                return Err(TupleError::UnexpectedEnd {
                    field,
                    expected: kind,
                });
            }

            let (token, end) = scan_field(text, pos, field, kind)?;
            spans.push((token, pos..end));
            pos = end;
        }

        if pos != text.len() {
            return Err(TupleError::TrailingInput { offset: pos });
        }

        Ok(Fields { text, spans })
    }
}

fn scan_field(
    text: &[u8],
    start: usize,
    field: usize,
    kind: FieldKind,
) -> Result<(Token, usize), TupleError> {
    let mismatch = || TupleError::FieldMismatch {
        field,
        expected: kind,
        offset: start,
    };

    match kind {
        FieldKind::Integer => scan_digits(text, start)
            .map(|end| (Token::Number, end))
            .ok_or_else(mismatch),
        FieldKind::SignedInteger => {
            let digits_start = if text[start] == b'-' { start + 1 } else { start };
            scan_digits(text, digits_start)
                .map(|end| (Token::Number, end))
                .ok_or_else(mismatch)
        }
        FieldKind::Decimal => scan_decimal(text, start)
            .map(|end| (Token::Number, end))
            .ok_or_else(mismatch),
        FieldKind::QuotedString => {
            if text[start] != b'\'' {
                return Err(mismatch());
            }
            scan_quoted(text, start, field).map(|end| (Token::Quoted, end))
        }
        FieldKind::NullableQuotedString => {
            if text[start..].starts_with(b"NULL") {
                return Ok((Token::Null, start + 4));
            }
            if text[start] != b'\'' {
                return Err(mismatch());
            }
            scan_quoted(text, start, field).map(|end| (Token::Quoted, end))
        }
    }
}

/// End of a run of one or more ASCII digits
fn scan_digits(text: &[u8], start: usize) -> Option<usize> {
    let len = text[start.min(text.len())..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    (len > 0).then_some(start + len)
}

/// End of a run of digits containing at most one `.`
fn scan_decimal(text: &[u8], start: usize) -> Option<usize> {
    let mut pos = start;
    let mut digits = 0;
    let mut seen_dot = false;

    while let Some(&b) = text.get(pos) {
        match b {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        pos += 1;
    }

    (digits > 0).then_some(pos)
}

/// End (exclusive, after the closing quote) of the string opening at `start`
fn scan_quoted(text: &[u8], start: usize, field: usize) -> Result<usize, TupleError> {
    let mut pos = start + 1;
    loop {
        match text.get(pos) {
            Some(b'\\') => pos += 2,
            Some(b'\'') => return Ok(pos + 1),
            Some(_) => pos += 1,
            None => {
                return Err(TupleError::UnterminatedString {
                    field,
                    offset: start,
                })
            }
        }
    }
}
