use std::io::Write;

use colored::Colorize;

use crate::cli::app::ExportFormat;
use crate::cli::{load_schema, open_data, wprintln};
use crate::FlfError;

/// Options for the `flf export` subcommand.
pub struct ExportOptions {
    /// Path to the data file.
    pub file: String,
    /// Path to the JSON schema.
    pub schema: String,
    /// First record to export.
    pub record: Option<u64>,
    /// Maximum number of records.
    pub limit: Option<u64>,
    pub format: ExportFormat,
}

/// Decode records and print them.
///
/// Text output shows one block per record with every field in read order.
/// JSON output is NDJSON: one object per record, keyed by field name.
pub fn execute(opts: &ExportOptions, writer: &mut dyn Write) -> Result<(), FlfError> {
    let (schema, layout) = load_schema(&opts.schema)?;
    let mut file = open_data(&opts.file, layout)?;

    let count = file.record_count()?;
    let start = opts.record.unwrap_or(0);
    if start > count || (opts.record.is_some() && start == count) {
        return Err(FlfError::Argument(format!(
            "Record {} out of range ({} has {} records)",
            start, opts.file, count
        )));
    }
    let end = match opts.limit {
        Some(limit) => count.min(start.saturating_add(limit)),
        None => count,
    };

    tracing::debug!(start, end, "exporting records");
    file.seek_to_record(start)?;

    for index in start..end {
        let record = file.read_next()?;
        match opts.format {
            ExportFormat::Json => {
                let obj = schema.record_to_json(&record);
                let line = serde_json::to_string(&obj)
                    .map_err(|e| FlfError::Parse(format!("JSON serialization error: {}", e)))?;
                wprintln!(writer, "{}", line)?;
            }
            ExportFormat::Text => {
                wprintln!(writer, "{}", format!("Record {}", index).bold())?;
                for (slot, def) in schema.fields.iter().enumerate() {
                    if let Some(value) = record.get(slot) {
                        wprintln!(writer, "  {:<20} = {}", def.name, value)?;
                    }
                }
            }
        }
    }

    Ok(())
}
