//! CLI subcommand implementations for the `flf` binary.
//!
//! Argument parsing uses clap derive macros. The top-level [`app::Cli`] struct
//! and [`app::Commands`] enum live in [`app`] and are shared between `main.rs`
//! and `build.rs` (man pages and shell completions) via `include!()`.
//!
//! Every subcommand reads a JSON [`SchemaDef`](crate::record::schema::SchemaDef)
//! and works on [`DynamicRecord`]s, so no Rust type is needed per file
//! format. Each module has an `Options` struct and a
//! `pub fn execute(opts, writer) -> Result<(), FlfError>` entry point; the
//! `writer: &mut dyn Write` parameter lets tests capture output and lets the
//! global `--output` flag redirect it.
//!
//! | Command | Module | Purpose |
//! |---------|--------|---------|
//! | `flf layout` | [`layout`] | Resolved field table and record size |
//! | `flf info` | [`info`] | File size, record count, trailing bytes |
//! | `flf export` | [`export`] | Decode records as text or NDJSON |
//! | `flf dump` | [`dump`] | Hex dump of one record |
//! | `flf import` | [`import`] | Encode NDJSON records into a file |
//! | `flf completions` | (in `main.rs`) | Shell completion scripts |
//!
//! The `wprintln!` macro wraps `writeln!` to convert `io::Error` into
//! `FlfError`.

pub mod app;
pub mod dump;
pub mod export;
pub mod import;
pub mod info;
pub mod layout;

/// Write a line to the given writer, converting io::Error to FlfError.
macro_rules! wprintln {
    ($w:expr) => {
        writeln!($w).map_err(|e| $crate::FlfError::Io(e.to_string()))
    };
    ($w:expr, $($arg:tt)*) => {
        writeln!($w, $($arg)*).map_err(|e| $crate::FlfError::Io(e.to_string()))
    };
}

pub(crate) use wprintln;

use std::fs::{File, OpenOptions};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use crate::record::file::RecordFile;
use crate::record::layout::RecordLayout;
use crate::record::schema::{DynamicRecord, SchemaDef};
use crate::FlfError;

/// A data file opened against a runtime schema.
pub(crate) type DynamicFile = RecordFile<DynamicRecord, File>;

/// Load a schema and resolve its layout.
pub(crate) fn load_schema(
    path: &str,
) -> Result<(SchemaDef, Arc<RecordLayout<DynamicRecord>>), FlfError> {
    let schema = SchemaDef::load(path)?;
    let layout = schema.layout()?;
    tracing::debug!(
        schema = path,
        record_size = layout.record_size(),
        "schema loaded"
    );
    Ok((schema, layout))
}

/// Open a data file read-only against `layout`.
pub(crate) fn open_data(
    path: &str,
    layout: Arc<RecordLayout<DynamicRecord>>,
) -> Result<DynamicFile, FlfError> {
    let file = File::open(path).map_err(|e| FlfError::Io(format!("Cannot open {}: {}", path, e)))?;
    Ok(RecordFile::with_layout(file, layout))
}

/// Open a data file for writing, creating it when missing. Without `append`
/// the file is truncated.
pub(crate) fn open_data_for_write(
    path: &str,
    layout: Arc<RecordLayout<DynamicRecord>>,
    append: bool,
) -> Result<DynamicFile, FlfError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(!append)
        .open(path)
        .map_err(|e| FlfError::Io(format!("Cannot open {} for writing: {}", path, e)))?;
    Ok(RecordFile::with_layout(file, layout))
}

/// Create a styled progress bar for iterating over records.
pub(crate) fn create_progress_bar(count: u64, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(count);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{eta}})",
            unit
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}
