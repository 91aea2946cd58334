use std::io::Write;

use crate::cli::{load_schema, open_data, wprintln};
use crate::util::hex::{format_range, hex_dump};
use crate::FlfError;

/// Options for the `flf dump` subcommand.
pub struct DumpOptions {
    /// Path to the data file.
    pub file: String,
    /// Path to the JSON schema.
    pub schema: String,
    /// Record index to dump.
    pub record: u64,
    /// Write the raw record bytes instead of a hex dump.
    pub raw: bool,
}

/// Hex dump the bytes of one record, followed by the byte range of each field.
pub fn execute(opts: &DumpOptions, writer: &mut dyn Write) -> Result<(), FlfError> {
    let (_, layout) = load_schema(&opts.schema)?;
    let mut file = open_data(&opts.file, layout)?;

    let count = file.record_count()?;
    if opts.record >= count {
        return Err(FlfError::Argument(format!(
            "Record {} out of range ({} has {} records)",
            opts.record, opts.file, count
        )));
    }

    let data = file.read_record_bytes(opts.record)?;

    if opts.raw {
        writer
            .write_all(&data)
            .map_err(|e| FlfError::Io(format!("Cannot write to stdout: {}", e)))?;
        return Ok(());
    }

    let base_offset = opts.record * file.record_size() as u64;
    wprintln!(
        writer,
        "Hex dump of {} record {} ({} bytes):",
        opts.file,
        opts.record,
        data.len()
    )?;
    wprintln!(writer)?;
    wprintln!(writer, "{}", hex_dump(&data, base_offset))?;
    wprintln!(writer)?;
    for field in file.layout().fields() {
        wprintln!(
            writer,
            "  {:<20} {}",
            field.name(),
            format_range(&field.range())
        )?;
    }

    Ok(())
}
