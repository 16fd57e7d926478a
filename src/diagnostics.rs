//! Counters and per-tuple issue reporting for an extraction run.
//!
//! Tuple failures never stop a run. Each one is logged as a `tracing`
//! warning on stderr and kept as a [`TupleIssue`] until `max_issues` is
//! reached; later failures are only counted.

use serde::Serialize;
use std::fmt;

/// Default number of issues kept in memory
pub const MAX_ISSUES: usize = 1000;

/// Raw tuple text longer than this is truncated in issues
const RAW_PREVIEW_LEN: usize = 240;

/// Running counters of one extraction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    pub lines_read: u64,
    /// Lines that were not an insert into the target table
    pub lines_skipped: u64,
    pub statements_processed: u64,
    pub tuples_attempted: u64,
    pub tuples_matched: u64,
    pub tuples_failed: u64,
    pub rows_written: u64,
    pub bytes_read: u64,
}

/// A tuple that could not be matched against its grammar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TupleIssue {
    pub table: String,
    /// 1-based index of the statement among the target table's inserts
    pub statement_index: u64,
    /// 0-based index of the tuple within its statement
    pub tuple_index: usize,
    pub reason: String,
    pub raw: String,
}

impl fmt::Display for TupleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "table={} stmt={} tuple={}: {}: {:?}",
            self.table, self.statement_index, self.tuple_index, self.reason, self.raw
        )
    }
}

/// Collected issues of a run
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    issues: Vec<TupleIssue>,
    /// Issues counted but not kept because the cap was reached
    dropped: u64,
    #[serde(skip)]
    max_issues: usize,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(MAX_ISSUES)
    }
}

impl Diagnostics {
    pub fn new(max_issues: usize) -> Self {
        Self {
            issues: Vec::new(),
            dropped: 0,
            max_issues,
        }
    }

    /// Report one unparsable tuple
    pub fn record_tuple_failure(
        &mut self,
        table: &str,
        statement_index: u64,
        tuple_index: usize,
        reason: &dyn fmt::Display,
        raw: &[u8],
    ) {
        // The log line carries the whole tuple; only the kept issue is shortened
        tracing::warn!(
            table,
            statement = statement_index,
            tuple = tuple_index,
            "unable to parse tuple: {}: {:?}",
            reason,
            String::from_utf8_lossy(raw)
        );

        if self.issues.len() >= self.max_issues {
            self.dropped += 1;
            return;
        }

        self.issues.push(TupleIssue {
            table: table.to_string(),
            statement_index,
            tuple_index,
            reason: reason.to_string(),
            raw: preview(raw),
        });
    }

    pub fn issues(&self) -> &[TupleIssue] {
        &self.issues
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn total(&self) -> u64 {
        self.issues.len() as u64 + self.dropped
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

fn preview(raw: &[u8]) -> String {
    if raw.len() <= RAW_PREVIEW_LEN {
        return String::from_utf8_lossy(raw).into_owned();
    }
    let mut text = String::from_utf8_lossy(&raw[..RAW_PREVIEW_LEN]).into_owned();
    text.push_str("...");
    text
}
