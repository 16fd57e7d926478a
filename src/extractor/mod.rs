use crate::diagnostics::{Diagnostics, ExtractStats, MAX_ISSUES};
use crate::input::{open_dump, Compression, DumpInput};
use crate::parser::{
    determine_buffer_size, insert_prefix, normalize_en_dash, split_tuples, values_region,
    Decoding, LineReader, TupleMatcher,
};
use crate::schema::TableSchema;
use crate::writer::RecordSink;
use anyhow::Context;
use serde::Serialize;
use smallvec::SmallVec;
use std::io::Read;
use std::path::PathBuf;

/// How quoted string fields are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    /// Keep the enclosing single quotes
    #[default]
    Keep,
    /// Drop the enclosing quotes; escapes are left as they are
    Strip,
}

#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub decoding: Decoding,
    pub quote_style: QuoteStyle,
    pub max_issues: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            decoding: Decoding::default(),
            quote_style: QuoteStyle::default(),
            max_issues: MAX_ISSUES,
        }
    }
}

/// Result of one extraction run
#[derive(Debug, Clone, Serialize)]
pub struct ExtractSummary {
    pub kind: String,
    pub table: String,
    pub columns: Vec<usize>,
    pub statistics: ExtractStats,
    pub diagnostics: Diagnostics,
}

/// Line-at-a-time extraction of one table kind into a record sink
pub struct RowExtractor {
    schema: TableSchema,
    prefix: Vec<u8>,
    options: ExtractOptions,
    stats: ExtractStats,
    diagnostics: Diagnostics,
    scratch: Vec<u8>,
}

impl RowExtractor {
    pub fn new(schema: TableSchema, options: ExtractOptions) -> Self {
        let prefix = insert_prefix(schema.table());
        Self {
            schema,
            prefix,
            diagnostics: Diagnostics::new(options.max_issues),
            options,
            stats: ExtractStats::default(),
            scratch: Vec::new(),
        }
    }

    pub fn stats(&self) -> &ExtractStats {
        &self.stats
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Handle one input line. Lines that are not inserts into the target
    /// table are counted and ignored; unparsable tuples are reported and
    /// skipped. Only sink errors are returned.
    pub fn process_line<S: RecordSink>(&mut self, line: &[u8], sink: &mut S) -> std::io::Result<()> {
        self.stats.lines_read += 1;

        let Some(values) = values_region(line, &self.prefix) else {
            self.stats.lines_skipped += 1;
            return Ok(());
        };
        let values = self.options.decoding.decode(values, &mut self.scratch);

        self.stats.statements_processed += 1;
        let statement_index = self.stats.statements_processed;
        let matcher = TupleMatcher::new(self.schema.grammar());
        let mut matched_in_statement = 0usize;

        for (tuple_index, tuple) in split_tuples(values).enumerate() {
            self.stats.tuples_attempted += 1;
            let tuple = normalize_en_dash(tuple);

            let fields = match matcher.match_tuple(&tuple) {
                Ok(fields) => fields,
                Err(e) => {
                    self.stats.tuples_failed += 1;
                    self.diagnostics.record_tuple_failure(
                        self.schema.table(),
                        statement_index,
                        tuple_index,
                        &e,
                        &tuple,
                    );
                    continue;
                }
            };

            let mut record: SmallVec<[&[u8]; 16]> = SmallVec::new();
            let mut missing = None;
            for &column in self.schema.columns() {
                match fields.get(column) {
                    Some(value) => record.push(match self.options.quote_style {
                        QuoteStyle::Keep => value.raw(),
                        QuoteStyle::Strip => value.unquoted(),
                    }),
                    None => {
                        missing = Some(column);
                        break;
                    }
                }
            }

            if let Some(column) = missing {
                self.stats.tuples_failed += 1;
                self.diagnostics.record_tuple_failure(
                    self.schema.table(),
                    statement_index,
                    tuple_index,
                    &format_args!("column {} missing from {} matched fields", column, fields.len()),
                    &tuple,
                );
                continue;
            }

            sink.write_record(&record)?;
            self.stats.tuples_matched += 1;
            self.stats.rows_written += 1;
            matched_in_statement += 1;
        }

        tracing::trace!(
            statement = statement_index,
            rows = matched_in_statement,
            "statement processed"
        );
        Ok(())
    }

    /// Drain `reader` line by line into `sink`
    pub fn run<R: Read, S: RecordSink>(
        mut self,
        reader: R,
        buffer_size: usize,
        sink: &mut S,
    ) -> std::io::Result<ExtractSummary> {
        let mut lines = LineReader::new(reader, buffer_size);
        while let Some(line) = lines.read_line()? {
            self.process_line(line, sink)?;
        }
        Ok(self.finish())
    }

    pub fn finish(self) -> ExtractSummary {
        ExtractSummary {
            kind: self.schema.kind().to_string(),
            table: self.schema.table().to_string(),
            columns: self.schema.columns().to_vec(),
            statistics: self.stats,
            diagnostics: self.diagnostics,
        }
    }
}

#[derive(Default)]
pub struct ExtractorConfig {
    pub options: ExtractOptions,
    pub progress_fn: Option<Box<dyn Fn(u64)>>,
}

/// Extracts the rows of one table kind from a dump file
pub struct Extractor {
    input_file: PathBuf,
    schema: TableSchema,
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(input_file: PathBuf, schema: TableSchema) -> Self {
        Self {
            input_file,
            schema,
            config: ExtractorConfig::default(),
        }
    }

    pub fn with_decoding(mut self, decoding: Decoding) -> Self {
        self.config.options.decoding = decoding;
        self
    }

    pub fn with_quote_style(mut self, quote_style: QuoteStyle) -> Self {
        self.config.options.quote_style = quote_style;
        self
    }

    pub fn with_max_issues(mut self, max_issues: usize) -> Self {
        self.config.options.max_issues = max_issues;
        self
    }

    pub fn with_progress<F: Fn(u64) + 'static>(mut self, f: F) -> Self {
        self.config.progress_fn = Some(Box::new(f));
        self
    }

    /// Open the input file without reading from it
    pub fn open(self) -> anyhow::Result<OpenExtractor> {
        let input = open_dump(&self.input_file, self.config.progress_fn)?;
        Ok(OpenExtractor {
            input_file: self.input_file,
            schema: self.schema,
            options: self.config.options,
            input,
        })
    }

    pub fn extract<S: RecordSink>(self, sink: &mut S) -> anyhow::Result<ExtractSummary> {
        self.open()?.extract(sink)
    }
}

/// An extractor whose input is already open
pub struct OpenExtractor {
    input_file: PathBuf,
    schema: TableSchema,
    options: ExtractOptions,
    input: DumpInput,
}

impl OpenExtractor {
    pub fn compression(&self) -> Compression {
        self.input.compression
    }

    /// Size of the input file on disk
    pub fn file_size(&self) -> u64 {
        self.input.file_size
    }

    pub fn extract<S: RecordSink>(self, sink: &mut S) -> anyhow::Result<ExtractSummary> {
        let DumpInput {
            reader,
            file_size,
            compression,
            bytes_read,
        } = self.input;
        let buffer_size = determine_buffer_size(file_size);

        tracing::debug!(
            file = %self.input_file.display(),
            kind = self.schema.kind(),
            compression = %compression,
            "starting extraction"
        );

        let extractor = RowExtractor::new(self.schema, self.options);
        let mut summary = extractor
            .run(reader, buffer_size, sink)
            .with_context(|| format!("extraction from {} failed", self.input_file.display()))?;
        summary.statistics.bytes_read = bytes_read.get();

        tracing::info!(
            kind = %summary.kind,
            statements = summary.statistics.statements_processed,
            matched = summary.statistics.tuples_matched,
            failed = summary.statistics.tuples_failed,
            "extraction finished"
        );
        Ok(summary)
    }
}
