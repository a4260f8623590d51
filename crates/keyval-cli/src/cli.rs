//! CLI argument definitions for the key validator.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use keyval_validate::{DEFAULT_PROGRESS_INTERVAL, KeyStoreKind};

#[derive(Parser)]
#[command(
    name = "keyval",
    version,
    about = "Validate primary and foreign keys of genomic data submissions",
    long_about = "Validate primary and foreign keys of genomic data submissions.\n\n\
                  Checks key uniqueness, foreign key existence and surjective\n\
                  relations, for full submissions or deltas on a prior release."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow submission identifiers (donor, sample, analysis ids) in logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a submission directory.
    Validate(ValidateArgs),

    /// Show the key schema derived from the dictionary.
    Dictionary(DictionaryArgs),
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// Submission directory holding one file per file type.
    #[arg(value_name = "SUBMISSION")]
    pub submission: PathBuf,

    /// Previously accepted release; switches to incremental validation.
    #[arg(long = "previous", value_name = "DIR")]
    pub previous: Option<PathBuf>,

    /// Directory holding platform-provided files (default: SUBMISSION).
    #[arg(long = "system-dir", value_name = "DIR")]
    pub system_dir: Option<PathBuf>,

    /// Dictionary directory (default: KEYVAL_DICTIONARY_DIR or the bundled one).
    #[arg(long = "dictionary", value_name = "DIR")]
    pub dictionary: Option<PathBuf>,

    /// Only validate these experimental data types (repeatable).
    #[arg(long = "data-type", value_name = "NAME")]
    pub data_types: Vec<String>,

    /// Write the JSON report to this path.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Key set backend.
    #[arg(long = "store", value_enum, default_value = "hash")]
    pub store: StoreArg,

    /// Validate experimental data types in parallel.
    #[arg(long = "parallel")]
    pub parallel: bool,

    /// Log progress every N rows of a file.
    #[arg(
        long = "progress-interval",
        value_name = "ROWS",
        default_value_t = DEFAULT_PROGRESS_INTERVAL
    )]
    pub progress_interval: u64,

    /// Number of errors listed after the summary table.
    #[arg(long = "show-errors", value_name = "N", default_value_t = 20)]
    pub show_errors: usize,
}

#[derive(Parser)]
pub struct DictionaryArgs {
    /// Dictionary directory (default: KEYVAL_DICTIONARY_DIR or the bundled one).
    #[arg(long = "dictionary", value_name = "DIR")]
    pub dictionary: Option<PathBuf>,
}

/// CLI key store choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum StoreArg {
    Hash,
    Ordered,
}

impl From<StoreArg> for KeyStoreKind {
    fn from(value: StoreArg) -> Self {
        match value {
            StoreArg::Hash => KeyStoreKind::Hash,
            StoreArg::Ordered => KeyStoreKind::Ordered,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
