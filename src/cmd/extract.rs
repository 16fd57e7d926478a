use crate::extractor::{ExtractSummary, Extractor, QuoteStyle};
use crate::input::Compression;
use crate::parser::Decoding;
use crate::schema::{parse_column_list, SchemaRegistry};
use crate::writer::{Output, TsvWriter};
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// Number of issues echoed in the text summary
const ISSUES_SHOWN: usize = 10;

pub struct ExtractArgs {
    pub file: PathBuf,
    pub kind: String,
    pub output: PathBuf,
    pub column_indexes: Option<String>,
    pub silent: bool,
    pub schema_config: Option<PathBuf>,
    pub strip_quotes: bool,
    pub raw_bytes: bool,
    pub max_issues: usize,
    pub json: bool,
    pub strict: bool,
}

/// JSON output for an extraction run
#[derive(Serialize)]
struct ExtractJsonOutput {
    input_file: String,
    output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    compression: Option<String>,
    elapsed_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    throughput_mb_per_sec: Option<f64>,
    #[serde(flatten)]
    summary: ExtractSummary,
}

pub fn run(args: ExtractArgs) -> anyhow::Result<()> {
    // Resolve everything that can fail before touching input or output
    let registry = SchemaRegistry::with_config(args.schema_config.as_deref())?;
    let mut schema = registry.lookup(&args.kind)?.clone();
    if let Some(ref cols) = args.column_indexes {
        schema = schema.with_columns(parse_column_list(cols)?)?;
    }

    let mut extractor = Extractor::new(args.file.clone(), schema.clone())
        .with_max_issues(args.max_issues)
        .with_quote_style(if args.strip_quotes {
            QuoteStyle::Strip
        } else {
            QuoteStyle::Keep
        })
        .with_decoding(if args.raw_bytes {
            Decoding::Passthrough
        } else {
            Decoding::AsciiEscape
        });

    let show_progress = !args.silent && !args.json;
    let pb = show_progress.then(|| ProgressBar::new(0));
    if let Some(ref pb) = pb {
        let pb_clone = pb.clone();
        extractor = extractor.with_progress(move |bytes| {
            pb_clone.set_position(bytes);
        });
    }

    // The input must open before an existing output is truncated
    let extractor = extractor.open()?;
    let file_size = extractor.file_size();
    let compression = extractor.compression();
    let compression_str = (compression != Compression::None).then(|| compression.to_string());

    if !args.json {
        eprintln!(
            "Extracting `{}` rows from: {} ({:.2} MB)",
            schema.table(),
            args.file.display(),
            file_size as f64 / (1024.0 * 1024.0)
        );
        if let Some(ref c) = compression_str {
            eprintln!("Detected compression: {}", c);
        }
        eprintln!("Grammar ({}): {}", schema.kind(), schema.grammar());
        eprintln!("Columns: {:?}", schema.columns());
        eprintln!();
    }

    let output = Output::create(&args.output)
        .with_context(|| format!("failed to create output {}", args.output.display()))?;
    let mut sink = TsvWriter::new(output);

    let start_time = Instant::now();

    let summary = match pb {
        Some(pb) => {
            pb.set_length(file_size);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg}",
                )?
                .progress_chars("█▓▒░  ")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
            pb.enable_steady_tick(std::time::Duration::from_millis(100));

            let summary = extractor.extract(&mut sink)?;
            pb.finish_with_message("done");
            summary
        }
        None => extractor.extract(&mut sink)?,
    };

    sink.into_inner()?
        .finish()
        .with_context(|| format!("failed to write output {}", args.output.display()))?;

    let elapsed = start_time.elapsed();
    let stats = &summary.statistics;
    let throughput = (elapsed.as_secs_f64() > 0.0)
        .then(|| stats.bytes_read as f64 / (1024.0 * 1024.0) / elapsed.as_secs_f64());
    let failed = stats.tuples_failed;

    if args.json {
        let output_json = ExtractJsonOutput {
            input_file: args.file.display().to_string(),
            output: args.output.display().to_string(),
            compression: compression_str,
            elapsed_secs: elapsed.as_secs_f64(),
            throughput_mb_per_sec: throughput,
            summary,
        };
        let rendered = serde_json::to_string_pretty(&output_json)?;
        // Records already own stdout when writing to `-`
        if args.output.as_os_str() == "-" {
            eprintln!("{}", rendered);
        } else {
            println!("{}", rendered);
        }
    } else {
        print_summary(&summary, elapsed, throughput);
    }

    if args.strict && failed > 0 {
        anyhow::bail!("{} tuple(s) could not be parsed (--strict)", failed);
    }

    Ok(())
}

fn print_summary(summary: &ExtractSummary, elapsed: std::time::Duration, throughput: Option<f64>) {
    let stats = &summary.statistics;

    eprintln!("\n✓ Extraction completed!");
    eprintln!("\nStatistics:");
    eprintln!("  Lines read: {}", stats.lines_read);
    eprintln!("  Statements processed: {}", stats.statements_processed);
    eprintln!("  Tuples attempted: {}", stats.tuples_attempted);
    eprintln!("  Tuples matched: {}", stats.tuples_matched);
    eprintln!("  Tuples failed: {}", stats.tuples_failed);
    eprintln!("  Rows written: {}", stats.rows_written);
    eprintln!(
        "  Bytes processed: {:.2} MB",
        stats.bytes_read as f64 / (1024.0 * 1024.0)
    );
    eprintln!("  Elapsed time: {:.3?}", elapsed);
    if let Some(t) = throughput {
        eprintln!("  Throughput: {:.2} MB/s", t);
    }

    let diagnostics = &summary.diagnostics;
    if !diagnostics.is_empty() {
        eprintln!("\nUnparsable tuples ({} total):", diagnostics.total());
        for issue in diagnostics.issues().iter().take(ISSUES_SHOWN) {
            eprintln!("  - {}", issue);
        }
        let hidden = diagnostics.total().saturating_sub(ISSUES_SHOWN as u64);
        if hidden > 0 {
            eprintln!("  ... and {} more", hidden);
        }
    }
}
