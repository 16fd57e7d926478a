//! Line-level reading of SQL dump files.
//!
//! Dumps written by `mysqldump --extended-insert` keep each bulk `INSERT`
//! on a single line, so the stream is consumed one line at a time with a
//! reusable buffer. Submodules split a statement into tuples and match the
//! fields of each tuple against a table grammar.

pub mod tuple;
pub mod values;


pub use tuple::{normalize_en_dash, FieldValue, Fields, TupleError, TupleMatcher};
pub use values::{insert_prefix, split_tuples, values_region, TupleSplit};

use memchr::memchr;
use std::io::{BufRead, BufReader, Read};

pub const SMALL_BUFFER_SIZE: usize = 64 * 1024;
pub const MEDIUM_BUFFER_SIZE: usize = 256 * 1024;

/// How raw line bytes are turned into the text handed to the splitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decoding {
    /// Treat input as ASCII; every byte >= 0x80 becomes the text `\xNN`
    #[default]
    AsciiEscape,
    /// Leave bytes untouched
    Passthrough,
}

impl Decoding {
    /// Decode `line`, using `scratch` when the bytes need rewriting
    pub fn decode<'a>(self, line: &'a [u8], scratch: &'a mut Vec<u8>) -> &'a [u8] {
        match self {
            Decoding::Passthrough => line,
            Decoding::AsciiEscape => {
                if line.is_ascii() {
                    return line;
                }
                escape_non_ascii(line, scratch);
                scratch
            }
        }
    }
}

impl std::fmt::Display for Decoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decoding::AsciiEscape => write!(f, "ascii-escape"),
            Decoding::Passthrough => write!(f, "passthrough"),
        }
    }
}

/// Replace every non-ASCII byte with its `\xNN` escape (lowercase hex)
pub fn escape_non_ascii(input: &[u8], out: &mut Vec<u8>) {
    out.clear();
    out.reserve(input.len() + input.len() / 4);

    let mut digits = [0u8; 2];
    for &b in input {
        if b.is_ascii() {
            out.push(b);
        } else {
            out.extend_from_slice(b"\\x");
            // two output bytes for one input byte never fails
            if hex::encode_to_slice([b], &mut digits).is_ok() {
                out.extend_from_slice(&digits);
            }
        }
    }
}

/// Streaming line reader over a dump file
pub struct LineReader<R: Read> {
    reader: BufReader<R>,
    line: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    pub fn new(reader: R, buffer_size: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(buffer_size, reader),
            line: Vec::with_capacity(32 * 1024),
        }
    }

    /// Next line without its `\n` / `\r\n` terminator, or `None` at EOF.
    ///
    /// The returned slice borrows the internal buffer and is overwritten by
    /// the following call.
    pub fn read_line(&mut self) -> std::io::Result<Option<&[u8]>> {
        self.line.clear();
        let mut consumed_any = false;

        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                if !consumed_any {
                    return Ok(None);
                }
                break;
            }

            let (used, found_newline) = match memchr(b'\n', buf) {
                Some(i) => {
                    self.line.extend_from_slice(&buf[..i]);
                    (i + 1, true)
                }
                None => {
                    self.line.extend_from_slice(buf);
                    (buf.len(), false)
                }
            };
            self.reader.consume(used);
            consumed_any = true;

            if found_newline {
                break;
            }
        }

        if self.line.last() == Some(&b'\r') {
            self.line.pop();
        }
        Ok(Some(&self.line))
    }
}

pub fn determine_buffer_size(file_size: u64) -> usize {
    if file_size > 1024 * 1024 * 1024 {
        MEDIUM_BUFFER_SIZE
    } else {
        SMALL_BUFFER_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_lines_basic() {
        let data = b"-- MySQL dump\nINSERT INTO `t` VALUES (1);\n";
        let mut reader = LineReader::new(&data[..], 1024);

        assert_eq!(reader.read_line().unwrap().unwrap(), b"-- MySQL dump");
        assert_eq!(
            reader.read_line().unwrap().unwrap(),
            b"INSERT INTO `t` VALUES (1);"
        );
        assert!(reader.read_line().unwrap().is_none());
    }

    #[test]
    fn test_read_line_without_trailing_newline() {
        let data = b"a\nb";
        let mut reader = LineReader::new(&data[..], 1024);
        assert_eq!(reader.read_line().unwrap().unwrap(), b"a");
        assert_eq!(reader.read_line().unwrap().unwrap(), b"b");
        assert!(reader.read_line().unwrap().is_none());
    }

    #[test]
    fn test_read_blank_lines_and_crlf() {
        let data = b"\r\n\nx\r\n";
        let mut reader = LineReader::new(&data[..], 1024);
        assert_eq!(reader.read_line().unwrap().unwrap(), b"");
        assert_eq!(reader.read_line().unwrap().unwrap(), b"");
        assert_eq!(reader.read_line().unwrap().unwrap(), b"x");
        assert!(reader.read_line().unwrap().is_none());
    }

    #[test]
    fn test_line_longer_than_buffer() {
        let long = "x".repeat(10_000);
        let data = format!("{}\nshort\n", long);
        let mut reader = LineReader::new(data.as_bytes(), 16);
        assert_eq!(reader.read_line().unwrap().unwrap(), long.as_bytes());
        assert_eq!(reader.read_line().unwrap().unwrap(), b"short");
    }

    #[test]
    fn test_empty_input() {
        let mut reader = LineReader::new(&b""[..], 1024);
        assert!(reader.read_line().unwrap().is_none());
    }

    #[test]
    fn test_ascii_escape_decoding() {
        let mut scratch = Vec::new();
        let line = "a\u{2013}b".as_bytes();
        let decoded = Decoding::AsciiEscape.decode(line, &mut scratch);
        assert_eq!(decoded, b"a\\xe2\\x80\\x93b");
    }

    #[test]
    fn test_ascii_line_is_borrowed() {
        let mut scratch = Vec::new();
        let line = b"plain ascii";
        let decoded = Decoding::AsciiEscape.decode(line, &mut scratch);
        assert_eq!(decoded, line);
        assert!(scratch.is_empty());
    }

    #[test]
    fn test_passthrough_decoding() {
        let mut scratch = Vec::new();
        let line = "caf\u{e9}".as_bytes();
        assert_eq!(Decoding::Passthrough.decode(line, &mut scratch), line);
    }

    #[test]
    fn test_buffer_size_selection() {
        assert_eq!(determine_buffer_size(1024), SMALL_BUFFER_SIZE);
        assert_eq!(determine_buffer_size(2 * 1024 * 1024 * 1024), MEDIUM_BUFFER_SIZE);
    }
}
