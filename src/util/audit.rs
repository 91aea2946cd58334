//! Audit logging for record writes.
//!
//! [`AuditLogger`] appends NDJSON events to a log file. `flf import` records
//! one `record_write` event per imported batch, bracketed by `session_start`
//! and `session_end` events for the invocation.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use chrono::Local;
use fs2::FileExt;
use serde::Serialize;

use crate::FlfError;

/// A single audit log event, serialized as tagged NDJSON.
#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Emitted once at the start of a CLI invocation.
    SessionStart {
        timestamp: String,
        args: Vec<String>,
        version: String,
    },

    /// Emitted after a contiguous run of records was written to a file.
    RecordWrite {
        timestamp: String,
        file: String,
        operation: String,
        first_record: u64,
        records_written: u64,
        record_size: usize,
    },

    /// Emitted once at the end of a CLI invocation.
    SessionEnd {
        timestamp: String,
        duration_ms: u64,
        records_written: u64,
        files_written: u64,
    },
}

struct AuditLoggerInner {
    file: File,
    records_written: u64,
    files_written: u64,
}

/// Thread-safe audit logger that appends NDJSON events to a file.
///
/// Each line is written under an exclusive `fs2` file lock so several
/// processes may share one log.
pub struct AuditLogger {
    inner: Mutex<AuditLoggerInner>,
    start: Instant,
}

impl AuditLogger {
    /// Open (or create) the audit log file in append mode.
    pub fn open(path: &str) -> Result<Self, FlfError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| FlfError::Io(format!("Cannot open audit log {}: {}", path, e)))?;

        Ok(Self {
            inner: Mutex::new(AuditLoggerInner {
                file,
                records_written: 0,
                files_written: 0,
            }),
            start: Instant::now(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, AuditLoggerInner>, FlfError> {
        self.inner
            .lock()
            .map_err(|_| FlfError::Io("Audit log state poisoned".to_string()))
    }

    fn write_line(inner: &mut AuditLoggerInner, line: &str) -> Result<(), FlfError> {
        inner
            .file
            .lock_exclusive()
            .map_err(|e| FlfError::Io(format!("Audit log lock error: {}", e)))?;
        let written = writeln!(inner.file, "{}", line)
            .and_then(|_| inner.file.flush())
            .map_err(|e| FlfError::Io(format!("Audit log write error: {}", e)));
        FileExt::unlock(&inner.file)
            .map_err(|e| FlfError::Io(format!("Audit log unlock error: {}", e)))?;
        written
    }

    /// Emit a single audit event as one NDJSON line.
    pub fn emit(&self, event: &AuditEvent) -> Result<(), FlfError> {
        let line = serde_json::to_string(event)
            .map_err(|e| FlfError::Parse(format!("Audit JSON error: {}", e)))?;
        let mut inner = self.lock()?;
        Self::write_line(&mut inner, &line)
    }

    /// Emit a `session_start` event.
    pub fn start_session(&self, args: Vec<String>) -> Result<(), FlfError> {
        self.emit(&AuditEvent::SessionStart {
            timestamp: now(),
            args,
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Emit a `session_end` event with the accumulated counters.
    pub fn end_session(&self) -> Result<(), FlfError> {
        let (records_written, files_written) = {
            let inner = self.lock()?;
            (inner.records_written, inner.files_written)
        };
        self.emit(&AuditEvent::SessionEnd {
            timestamp: now(),
            duration_ms: self.start.elapsed().as_millis() as u64,
            records_written,
            files_written,
        })
    }

    /// Log a run of `count` records written starting at `first_record`.
    pub fn log_record_write(
        &self,
        file: &str,
        operation: &str,
        first_record: u64,
        count: u64,
        record_size: usize,
    ) -> Result<(), FlfError> {
        let line = serde_json::to_string(&AuditEvent::RecordWrite {
            timestamp: now(),
            file: file.to_string(),
            operation: operation.to_string(),
            first_record,
            records_written: count,
            record_size,
        })
        .map_err(|e| FlfError::Parse(format!("Audit JSON error: {}", e)))?;

        let mut inner = self.lock()?;
        Self::write_line(&mut inner, &line)?;
        inner.records_written += count;
        inner.files_written += 1;
        Ok(())
    }
}

fn now() -> String {
    Local::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use tempfile::NamedTempFile;

    fn read_lines(path: &str) -> Vec<serde_json::Value> {
        let file = File::open(path).unwrap();
        BufReader::new(file)
            .lines()
            .map(|l| serde_json::from_str(&l.unwrap()).unwrap())
            .collect()
    }

    fn temp_path() -> String {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap().to_string();
        drop(tmp);
        path
    }

    #[test]
    fn test_session_events() {
        let path = temp_path();
        let logger = AuditLogger::open(&path).unwrap();
        logger
            .start_session(vec!["flf".into(), "import".into()])
            .unwrap();
        logger
            .log_record_write("data.bin", "import", 4, 3, 16)
            .unwrap();
        logger.end_session().unwrap();

        let events = read_lines(&path);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["event"], "session_start");
        assert_eq!(events[1]["event"], "record_write");
        assert_eq!(events[1]["first_record"], 4);
        assert_eq!(events[1]["records_written"], 3);
        assert_eq!(events[2]["event"], "session_end");
        assert_eq!(events[2]["records_written"], 3);
        assert_eq!(events[2]["files_written"], 1);
    }

    #[test]
    fn test_append_mode() {
        let path = temp_path();
        for name in ["one", "two"] {
            let logger = AuditLogger::open(&path).unwrap();
            logger.start_session(vec![name.into()]).unwrap();
        }
        let events = read_lines(&path);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1]["args"][0], "two");
    }

    #[test]
    fn test_concurrent_writers() {
        use std::sync::Arc;
        use std::thread;

        let path = temp_path();
        let logger = Arc::new(AuditLogger::open(&path).unwrap());
        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let lg = Arc::clone(&logger);
                thread::spawn(move || lg.log_record_write("x.bin", "import", i, 1, 8).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        logger.end_session().unwrap();

        let events = read_lines(&path);
        assert_eq!(events.len(), 9);
        assert_eq!(events[8]["records_written"], 8);
    }
}
