use clap::{Parser, Subcommand, ValueEnum};

/// Top-level CLI definition for the `flf` binary.
#[derive(Parser)]
#[command(name = "flf")]
#[command(about = "Fixed-length binary record toolkit")]
#[command(version)]
pub struct Cli {
    /// Control colored output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Append NDJSON audit events for write operations to this file
    #[arg(long = "audit-log", global = true)]
    pub audit_log: Option<String>,

    /// Enable debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Controls when colored output is emitted.
#[derive(Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

/// Record output format for `flf export`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// One `name = value` block per record
    Text,
    /// One JSON object per line (NDJSON)
    Json,
}

/// Available subcommands for the `flf` CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Print the resolved field layout of a schema
    ///
    /// Resolves the JSON schema exactly as the reader and writer do and shows
    /// every field with its placement, byte range, width, and semantic type,
    /// followed by the record size. Schema errors (conflicting placements,
    /// missing lengths, unknown types) are reported here before any file is
    /// touched.
    Layout {
        /// Path to the JSON schema
        #[arg(short, long)]
        schema: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show file size, record size, and record count
    ///
    /// The record count is the file size divided by the record size; a
    /// trailing partial record is reported but not counted.
    Info {
        /// Path to the data file
        #[arg(short, long)]
        file: String,

        /// Path to the JSON schema
        #[arg(short, long)]
        schema: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Decode records as text or NDJSON
    Export {
        /// Path to the data file
        #[arg(short, long)]
        file: String,

        /// Path to the JSON schema
        #[arg(short, long)]
        schema: String,

        /// First record index to export (default: 0)
        #[arg(short, long)]
        record: Option<u64>,

        /// Maximum number of records to export
        #[arg(long)]
        limit: Option<u64>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: ExportFormat,
    },

    /// Hex dump of one record's bytes
    Dump {
        /// Path to the data file
        #[arg(short, long)]
        file: String,

        /// Path to the JSON schema
        #[arg(short, long)]
        schema: String,

        /// Record index to dump
        #[arg(short, long)]
        record: u64,

        /// Output raw binary bytes (no formatting)
        #[arg(long)]
        raw: bool,
    },

    /// Encode NDJSON records into a data file
    ///
    /// Each non-empty input line must be a JSON object keyed by field name.
    /// Without `--append` the data file is truncated first. Records are
    /// validated and encoded one at a time; the first failing line aborts the
    /// import and earlier records stay written.
    Import {
        /// Path to the data file
        #[arg(short, long)]
        file: String,

        /// Path to the JSON schema
        #[arg(short, long)]
        schema: String,

        /// NDJSON input file
        #[arg(short, long)]
        input: String,

        /// Append to an existing file instead of truncating it
        #[arg(long)]
        append: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}
