use std::io::Write;
use std::sync::Arc;

use colored::Colorize;

use crate::cli::{create_progress_bar, load_schema, open_data_for_write, wprintln, DynamicFile};
use crate::record::schema::SchemaDef;
use crate::util::audit::AuditLogger;
use crate::FlfError;

/// Options for the `flf import` subcommand.
pub struct ImportOptions {
    /// Path to the data file.
    pub file: String,
    /// Path to the JSON schema.
    pub schema: String,
    /// NDJSON input file.
    pub input: String,
    /// Keep existing records and append after them.
    pub append: bool,
    /// Audit logger for recording the written records.
    pub audit_logger: Option<Arc<AuditLogger>>,
}

/// Encode each NDJSON line of the input as one record.
///
/// Records are written in input order starting after the last whole record
/// of the file (or at record 0 when the file is truncated). The first line
/// that fails to parse, convert or encode stops the import; the records
/// already written are kept and reported to the audit log.
pub fn execute(opts: &ImportOptions, writer: &mut dyn Write) -> Result<(), FlfError> {
    let (schema, layout) = load_schema(&opts.schema)?;
    let input = std::fs::read_to_string(&opts.input)
        .map_err(|e| FlfError::Io(format!("Cannot read {}: {}", opts.input, e)))?;
    let lines: Vec<(usize, &str)> = input
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .collect();

    let mut file = open_data_for_write(&opts.file, layout, opts.append)?;
    let first_record = file.record_count()?;

    let pb = if lines.len() > 1 {
        Some(create_progress_bar(lines.len() as u64, "records"))
    } else {
        None
    };

    let mut written = 0u64;
    let result = write_lines(&schema, &mut file, &lines, &mut written, pb.as_ref());
    let flushed = file.flush();

    if let Some(ref pb) = pb {
        pb.finish_and_clear();
    }

    if written > 0 {
        if let Some(ref logger) = opts.audit_logger {
            let _ = logger.log_record_write(
                &opts.file,
                "import",
                first_record,
                written,
                file.record_size(),
            );
        }
    }

    result?;
    flushed?;

    wprintln!(
        writer,
        "{} {} records to {} (records {}..{})",
        "Imported".green(),
        written,
        opts.file,
        first_record,
        first_record + written
    )?;

    Ok(())
}

fn write_lines(
    schema: &SchemaDef,
    file: &mut DynamicFile,
    lines: &[(usize, &str)],
    written: &mut u64,
    pb: Option<&indicatif::ProgressBar>,
) -> Result<(), FlfError> {
    for &(line_no, line) in lines {
        let json: serde_json::Value = serde_json::from_str(line).map_err(|e| {
            FlfError::Parse(format!("Line {}: invalid JSON: {}", line_no + 1, e))
        })?;
        let obj = json.as_object().ok_or_else(|| {
            FlfError::Parse(format!("Line {}: expected a JSON object", line_no + 1))
        })?;

        let record = schema.record_from_json(obj)?;
        file.append(&record).map_err(|e| {
            tracing::debug!(line = line_no + 1, error = %e, "import stopped");
            e
        })?;
        *written += 1;

        if let Some(pb) = pb {
            pb.inc(1);
        }
    }
    Ok(())
}
