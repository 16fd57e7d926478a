mod extract;
mod tables;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dump-extract")]
#[command(version)]
#[command(
    about = "Extract rows from bulk INSERT statements in SQL dump files as tab-separated records",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract the rows of one table kind into a TSV file
    Extract {
        /// Input dump file (supports .gz, .bz2, .xz, .zst compression)
        file: PathBuf,

        /// Table kind to extract (see `dump-extract tables`)
        kind: String,

        /// Output file; `-` writes to stdout, a .gz suffix compresses
        output: PathBuf,

        /// Column indexes to write, in order (comma-separated, e.g. 0,2,1)
        #[arg(short, long)]
        column_indexes: Option<String>,

        /// Disable the progress bar
        #[arg(short = 'q', long)]
        silent: bool,

        /// YAML file with additional or replacement table grammars
        #[arg(long)]
        schema_config: Option<PathBuf>,

        /// Write quoted strings without their enclosing quotes
        #[arg(long)]
        strip_quotes: bool,

        /// Pass non-ASCII bytes through instead of escaping them as \xNN
        #[arg(long)]
        raw_bytes: bool,

        /// Maximum number of unparsable tuples kept for the summary
        #[arg(long, default_value_t = crate::diagnostics::MAX_ISSUES)]
        max_issues: usize,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,

        /// Exit with an error if any tuple could not be parsed
        #[arg(long)]
        strict: bool,
    },

    /// List the registered table kinds and their grammars
    Tables {
        /// YAML file with additional or replacement table grammars
        #[arg(long)]
        schema_config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Extract {
            file,
            kind,
            output,
            column_indexes,
            silent,
            schema_config,
            strip_quotes,
            raw_bytes,
            max_issues,
            json,
            strict,
        } => extract::run(extract::ExtractArgs {
            file,
            kind,
            output,
            column_indexes,
            silent,
            schema_config,
            strip_quotes,
            raw_bytes,
            max_issues,
            json,
            strict,
        }),
        Commands::Tables {
            schema_config,
            json,
        } => tables::run(schema_config, json),
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "dump-extract",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}
