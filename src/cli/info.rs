use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{load_schema, open_data, wprintln};
use crate::util::hex::format_offset;
use crate::FlfError;

/// Options for the `flf info` subcommand.
pub struct InfoOptions {
    /// Path to the data file.
    pub file: String,
    /// Path to the JSON schema.
    pub schema: String,
    /// Emit output as JSON.
    pub json: bool,
}

#[derive(Serialize)]
struct InfoJson {
    file: String,
    file_size: u64,
    record_size: usize,
    record_count: u64,
    trailing_bytes: u64,
}

/// Report size and record count of a data file under a schema.
pub fn execute(opts: &InfoOptions, writer: &mut dyn Write) -> Result<(), FlfError> {
    let (_, layout) = load_schema(&opts.schema)?;
    let mut file = open_data(&opts.file, layout)?;

    let file_size = file.total_len()?;
    let record_size = file.record_size();
    let record_count = file.record_count()?;
    let trailing_bytes = file_size - record_count * record_size as u64;

    if opts.json {
        let out = InfoJson {
            file: opts.file.clone(),
            file_size,
            record_size,
            record_count,
            trailing_bytes,
        };
        let json = serde_json::to_string_pretty(&out)
            .map_err(|e| FlfError::Parse(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", json)?;
        return Ok(());
    }

    wprintln!(writer, "{}", opts.file.bold())?;
    wprintln!(writer, "  File size:    {} bytes", file_size)?;
    wprintln!(writer, "  Record size:  {} bytes", record_size)?;
    wprintln!(writer, "  Records:      {}", record_count)?;
    if trailing_bytes > 0 {
        wprintln!(
            writer,
            "  {} {} trailing bytes at {} are not a whole record",
            "Warning:".yellow(),
            trailing_bytes,
            format_offset(file_size - trailing_bytes)
        )?;
    }

    Ok(())
}
