#![cfg(feature = "cli")]
//! Integration tests for the `flf` subcommands.
//!
//! Every test writes a schema and (where needed) an NDJSON input to temp
//! files, runs the subcommand's `execute` with a `Vec<u8>` writer, and
//! inspects the captured output and the resulting data file.

use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;

use clap::CommandFactory;
use tempfile::{NamedTempFile, TempDir};

use fixedlen::cli::app::{Cli, ExportFormat};
use fixedlen::cli::{dump, export, import, info, layout};
use fixedlen::util::audit::AuditLogger;
use fixedlen::FlfError;

const SCHEMA: &str = r#"{
    "name": "Trade",
    "fields": [
        { "name": "symbol", "type": "text", "order": 0, "length": 8, "encoding": "ascii" },
        { "name": "head", "type": "uint32", "offset": 0 },
        { "name": "qty", "type": "int32", "order": 1 },
        { "name": "price", "type": "float64", "order": 2 },
        { "name": "when", "type": "timestamp", "sequential": true },
        { "name": "note", "type": "text" }
    ]
}"#;

const RECORD_SIZE: u64 = 28;

const INPUT: &str = r#"{"symbol": "ABC", "qty": 10, "price": 1.5, "when": "2024-01-02T03:04:05"}
{"symbol": "DEFG", "qty": -3, "price": 0.25, "when": "2024-01-02T03:04:06.5"}

{"symbol": "H", "qty": 0, "price": 100.0, "when": "0001-01-01T00:00:00"}
"#;

struct Fixture {
    _dir: TempDir,
    schema: String,
    data: String,
    input: String,
}

fn write_file(path: &std::path::Path, content: &str) {
    let mut f = std::fs::File::create(path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
}

fn fixture(input: &str) -> Fixture {
    let dir = TempDir::new().unwrap();
    let schema = dir.path().join("trade.json");
    let data = dir.path().join("trade.bin");
    let ndjson = dir.path().join("trades.ndjson");
    write_file(&schema, SCHEMA);
    write_file(&ndjson, input);
    Fixture {
        schema: schema.to_str().unwrap().to_string(),
        data: data.to_str().unwrap().to_string(),
        input: ndjson.to_str().unwrap().to_string(),
        _dir: dir,
    }
}

fn run_import(fx: &Fixture, append: bool, logger: Option<Arc<AuditLogger>>) -> Result<String, FlfError> {
    let mut out = Vec::new();
    import::execute(
        &import::ImportOptions {
            file: fx.data.clone(),
            schema: fx.schema.clone(),
            input: fx.input.clone(),
            append,
            audit_logger: logger,
        },
        &mut out,
    )?;
    Ok(String::from_utf8(out).unwrap())
}

fn run_export(fx: &Fixture, record: Option<u64>, limit: Option<u64>) -> Result<Vec<serde_json::Value>, FlfError> {
    let mut out = Vec::new();
    export::execute(
        &export::ExportOptions {
            file: fx.data.clone(),
            schema: fx.schema.clone(),
            record,
            limit,
            format: ExportFormat::Json,
        },
        &mut out,
    )?;
    Ok(String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect())
}

#[test]
fn test_layout_json() {
    let fx = fixture("");
    let mut out = Vec::new();
    layout::execute(
        &layout::LayoutOptions {
            schema: fx.schema.clone(),
            json: true,
        },
        &mut out,
    )
    .unwrap();

    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["name"], "Trade");
    assert_eq!(v["record_size"], RECORD_SIZE);
    let names: Vec<&str> = v["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["symbol", "head", "qty", "price", "when"]);
    assert_eq!(v["fields"][1]["placement"], "overlay");
    assert_eq!(v["fields"][4]["offset"], 20);
    assert_eq!(v["fields"][0]["encoding"], "ascii");
    assert_eq!(v["ignored"][0], "note");
}

#[test]
fn test_layout_text() {
    let fx = fixture("");
    let mut out = Vec::new();
    layout::execute(
        &layout::LayoutOptions {
            schema: fx.schema.clone(),
            json: false,
        },
        &mut out,
    )
    .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("symbol"));
    assert!(text.contains("28"));
    assert!(text.contains("note"));
}

#[test]
fn test_import_then_export() {
    let fx = fixture(INPUT);
    let msg = run_import(&fx, false, None).unwrap();
    assert!(msg.contains("3 records"));

    let size = std::fs::metadata(&fx.data).unwrap().len();
    assert_eq!(size, RECORD_SIZE * 3);

    let rows = run_export(&fx, None, None).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["symbol"], "ABC");
    assert_eq!(rows[0]["head"], u32::from_le_bytes(*b"ABC\0"));
    assert_eq!(rows[1]["qty"], -3);
    assert_eq!(rows[1]["when"], "2024-01-02T03:04:06.500");
    assert_eq!(rows[2]["price"], 100.0);
    assert!(rows[0].get("note").is_none());
}

#[test]
fn test_export_range() {
    let fx = fixture(INPUT);
    run_import(&fx, false, None).unwrap();

    let rows = run_export(&fx, Some(1), Some(1)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["symbol"], "DEFG");

    assert!(matches!(
        run_export(&fx, Some(3), None),
        Err(FlfError::Argument(_))
    ));
}

#[test]
fn test_export_text_format() {
    let fx = fixture(INPUT);
    run_import(&fx, false, None).unwrap();

    let mut out = Vec::new();
    export::execute(
        &export::ExportOptions {
            file: fx.data.clone(),
            schema: fx.schema.clone(),
            record: None,
            limit: Some(1),
            format: ExportFormat::Text,
        },
        &mut out,
    )
    .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Record 0"));
    assert!(text.contains("\"ABC\""));
    assert!(!text.contains("Record 1"));
}

#[test]
fn test_import_append() {
    let fx = fixture(INPUT);
    run_import(&fx, false, None).unwrap();
    let msg = run_import(&fx, true, None).unwrap();
    assert!(msg.contains("3..6"));
    assert_eq!(run_export(&fx, None, None).unwrap().len(), 6);

    run_import(&fx, false, None).unwrap();
    assert_eq!(run_export(&fx, None, None).unwrap().len(), 3);
}

#[test]
fn test_import_stops_at_bad_line() {
    let fx = fixture(
        "{\"symbol\": \"OK\", \"qty\": 1, \"price\": 1.0, \"when\": \"2024-01-01T00:00:00\"}\n\
         {\"symbol\": \"TOOLONGSYM\", \"qty\": 1, \"price\": 1.0, \"when\": \"2024-01-01T00:00:00\"}\n",
    );
    let err = run_import(&fx, false, None).unwrap_err();
    assert!(matches!(err, FlfError::LengthExceeded { ref field, .. } if field == "symbol"));

    let rows = run_export(&fx, None, None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["symbol"], "OK");
}

#[test]
fn test_import_missing_value_is_null_error() {
    let fx = fixture("{\"symbol\": \"X\", \"price\": 1.0, \"when\": \"2024-01-01T00:00:00\"}\n");
    let err = run_import(&fx, false, None).unwrap_err();
    assert_eq!(err.field(), Some("qty"));
}

#[test]
fn test_import_writes_audit_events() {
    let fx = fixture(INPUT);
    let log = NamedTempFile::new().unwrap();
    let log_path = log.path().to_str().unwrap().to_string();
    let logger = Arc::new(AuditLogger::open(&log_path).unwrap());

    run_import(&fx, false, Some(Arc::clone(&logger))).unwrap();
    logger.end_session().unwrap();

    let lines: Vec<serde_json::Value> = BufReader::new(std::fs::File::open(&log_path).unwrap())
        .lines()
        .map(|l| serde_json::from_str(&l.unwrap()).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["event"], "record_write");
    assert_eq!(lines[0]["records_written"], 3);
    assert_eq!(lines[0]["record_size"], RECORD_SIZE);
    assert_eq!(lines[1]["records_written"], 3);
}

#[test]
fn test_info_reports_trailing_bytes() {
    let fx = fixture(INPUT);
    run_import(&fx, false, None).unwrap();
    {
        let mut f = std::fs::OpenOptions::new()
            .append(true)
            .open(&fx.data)
            .unwrap();
        f.write_all(&[0xAA; 5]).unwrap();
    }

    let mut out = Vec::new();
    info::execute(
        &info::InfoOptions {
            file: fx.data.clone(),
            schema: fx.schema.clone(),
            json: true,
        },
        &mut out,
    )
    .unwrap();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["record_size"], RECORD_SIZE);
    assert_eq!(v["record_count"], 3);
    assert_eq!(v["trailing_bytes"], 5);
    assert_eq!(v["file_size"], RECORD_SIZE * 3 + 5);
}

#[test]
fn test_dump_raw_and_hex() {
    let fx = fixture(INPUT);
    run_import(&fx, false, None).unwrap();

    let mut raw = Vec::new();
    dump::execute(
        &dump::DumpOptions {
            file: fx.data.clone(),
            schema: fx.schema.clone(),
            record: 1,
            raw: true,
        },
        &mut raw,
    )
    .unwrap();
    assert_eq!(raw.len() as u64, RECORD_SIZE);
    assert_eq!(&raw[..5], b"DEFG\0");
    assert_eq!(i32::from_le_bytes(raw[8..12].try_into().unwrap()), -3);

    let mut out = Vec::new();
    dump::execute(
        &dump::DumpOptions {
            file: fx.data.clone(),
            schema: fx.schema.clone(),
            record: 1,
            raw: false,
        },
        &mut out,
    )
    .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("record 1"));
    assert!(text.contains("0000001c  44 45 46 47"));
    assert!(text.contains("8..12 (4 bytes)"));
}

#[test]
fn test_dump_out_of_range() {
    let fx = fixture(INPUT);
    run_import(&fx, false, None).unwrap();
    let err = dump::execute(
        &dump::DumpOptions {
            file: fx.data.clone(),
            schema: fx.schema.clone(),
            record: 3,
            raw: true,
        },
        &mut Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(err, FlfError::Argument(_)));
}

#[test]
fn test_bad_schema_reports_type() {
    let fx = fixture("");
    write_file(
        std::path::Path::new(&fx.schema),
        r#"{ "fields": [ { "name": "e", "type": "exception", "order": 0 } ] }"#,
    );
    let err = layout::execute(
        &layout::LayoutOptions {
            schema: fx.schema.clone(),
            json: true,
        },
        &mut Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(err, FlfError::UnsupportedType { ref type_name, .. } if type_name == "exception"));
}

#[test]
fn test_completions_contain_subcommands() {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    clap_complete::generate(clap_complete::Shell::Bash, &mut cmd, "flf", &mut buf);
    let script = String::from_utf8(buf).unwrap();
    for name in ["layout", "info", "export", "dump", "import", "completions"] {
        assert!(script.contains(name), "missing {}", name);
    }
}
