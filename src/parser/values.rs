//! Bulk INSERT statement splitting.
//!
//! A statement line looks like
//! ``INSERT INTO `table` VALUES (v1,v2),(v1,v2),(v1,v2);``
//! and is cut into the text of each tuple without its parentheses.
//!
//! Tuples are separated on the literal `),(` sequence. Dump generators do
//! not emit that sequence inside escaped values in practice, but when one
//! does the tuple is cut in two; both halves then fail grammar matching and
//! are reported individually while the rest of the statement still parses.

use memchr::memmem;
use once_cell::sync::Lazy;

static TUPLE_BOUNDARY: Lazy<memmem::Finder<'static>> = Lazy::new(|| memmem::Finder::new(b"),("));

/// Literal marker that starts a bulk insert for `table`
pub fn insert_prefix(table: &str) -> Vec<u8> {
    format!("INSERT INTO `{}` VALUES ", table).into_bytes()
}

/// Value list following `prefix`, or `None` when the line is not an insert
/// into the target table
#[inline]
pub fn values_region<'a>(line: &'a [u8], prefix: &[u8]) -> Option<&'a [u8]> {
    line.strip_prefix(prefix)
}

/// Split a value list into tuple texts.
///
/// Strips trailing whitespace, the `;` terminator and the outermost
/// parentheses first. An empty list yields a single empty tuple.
pub fn split_tuples(values: &[u8]) -> TupleSplit<'_> {
    let body = values.trim_ascii_end();
    let body = body.strip_suffix(b";").unwrap_or(body).trim_ascii();
    let body = body.strip_prefix(b"(").unwrap_or(body);
    let body = body.strip_suffix(b")").unwrap_or(body);

    TupleSplit { rest: Some(body) }
}

/// Iterator over the tuple texts of one statement
#[derive(Debug, Clone)]
pub struct TupleSplit<'a> {
    rest: Option<&'a [u8]>,
}

impl<'a> Iterator for TupleSplit<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let rest = self.rest?;
        match TUPLE_BOUNDARY.find(rest) {
            Some(i) => {
                self.rest = Some(&rest[i + 3..]);
                Some(&rest[..i])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}
