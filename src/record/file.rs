//! Random access to fixed-length record files.
//!
//! [`RecordFile`] binds a record layout to one store handle. Record `i`
//! occupies bytes `[i * record_size, (i + 1) * record_size)`; the record
//! count is the store length divided by the record size, so a trailing
//! partial record is ignored.
//!
//! The store is any `Read`/`Write` + `Seek` handle. Reads and writes share
//! the handle's position: a `RecordFile` must not be driven from two
//! places at once (it takes `&mut self` for every operation, which the
//! borrow checker enforces within one thread).
//!
//! Seeking past the end is not checked here; the failure surfaces from the
//! underlying store when the next read runs short.

use std::fs::{File, OpenOptions};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use crate::record::field::Record;
use crate::record::layout::RecordLayout;
use crate::record::reader::{seek_to, RecordReader};
use crate::record::writer::RecordWriter;
use crate::FlfError;

/// Number of whole records in a store of `total_bytes`.
pub fn record_count(total_bytes: u64, record_size: usize) -> u64 {
    if record_size == 0 {
        return 0;
    }
    total_bytes / record_size as u64
}

/// An open fixed-length record store.
pub struct RecordFile<R, S = File> {
    store: S,
    reader: RecordReader<R>,
    writer: RecordWriter<R>,
}

impl<R: Record> RecordFile<R, File> {
    /// Open an existing file for reading and writing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FlfError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| FlfError::Io(format!("Cannot open {}: {}", path.display(), e)))?;
        Self::new(file)
    }

    /// Open an existing file for reading only. Writes fail with `Io`.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self, FlfError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| FlfError::Io(format!("Cannot open {}: {}", path.display(), e)))?;
        Self::new(file)
    }

    /// Create (or truncate) a file for reading and writing.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, FlfError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| FlfError::Io(format!("Cannot create {}: {}", path.display(), e)))?;
        Self::new(file)
    }
}

impl<R: Record> RecordFile<R, Cursor<Vec<u8>>> {
    /// Wrap an in-memory buffer.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, FlfError> {
        Self::new(Cursor::new(data))
    }
}

impl<R: Record, S> RecordFile<R, S> {
    /// Bind `store` to the cached layout of `R`.
    pub fn new(store: S) -> Result<Self, FlfError> {
        Ok(Self::with_layout(store, RecordLayout::<R>::of()?))
    }
}

impl<R: Default, S> RecordFile<R, S> {
    /// Bind `store` to an explicit layout (runtime schemas).
    pub fn with_layout(store: S, layout: Arc<RecordLayout<R>>) -> Self {
        RecordFile {
            store,
            reader: RecordReader::new(Arc::clone(&layout)),
            writer: RecordWriter::new(layout),
        }
    }

    pub fn layout(&self) -> &Arc<RecordLayout<R>> {
        self.reader.layout()
    }

    pub fn record_size(&self) -> usize {
        self.layout().record_size()
    }

    pub fn get_ref(&self) -> &S {
        &self.store
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Release the store handle.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<R: Default, S: Seek> RecordFile<R, S> {
    /// Current byte position of the store.
    pub fn position(&mut self) -> Result<u64, FlfError> {
        self.store
            .stream_position()
            .map_err(|e| FlfError::Io(format!("Cannot get stream position: {}", e)))
    }

    /// Total length of the store in bytes. The position is preserved.
    pub fn total_len(&mut self) -> Result<u64, FlfError> {
        let pos = self.position()?;
        let len = self
            .store
            .seek(SeekFrom::End(0))
            .map_err(|e| FlfError::Io(format!("Cannot seek to end: {}", e)))?;
        if pos != len {
            seek_to(&mut self.store, pos)?;
        }
        Ok(len)
    }

    /// Number of whole records in the store.
    pub fn record_count(&mut self) -> Result<u64, FlfError> {
        Ok(record_count(self.total_len()?, self.record_size()))
    }

    /// Position the store at the start of record `index`.
    pub fn seek_to_record(&mut self, index: u64) -> Result<(), FlfError> {
        let offset = index
            .checked_mul(self.record_size() as u64)
            .ok_or_else(|| FlfError::Argument(format!("Record index {} overflows", index)))?;
        seek_to(&mut self.store, offset)
    }
}

impl<R: Default, S: Read + Seek> RecordFile<R, S> {
    /// Read the record at the current position and advance past it.
    pub fn read_next(&mut self) -> Result<R, FlfError> {
        self.reader.read(&mut self.store)
    }

    /// Read record `index`.
    pub fn read_record(&mut self, index: u64) -> Result<R, FlfError> {
        self.seek_to_record(index)?;
        self.read_next()
    }

    /// Read the raw bytes of record `index`.
    pub fn read_record_bytes(&mut self, index: u64) -> Result<Vec<u8>, FlfError> {
        self.seek_to_record(index)?;
        let mut buf = vec![0u8; self.record_size()];
        self.store
            .read_exact(&mut buf)
            .map_err(|e| FlfError::Io(format!("Cannot read record {}: {}", index, e)))?;
        Ok(buf)
    }

    /// Iterate over every whole record from the start of the store.
    pub fn for_each_record<F>(&mut self, mut f: F) -> Result<(), FlfError>
    where
        F: FnMut(u64, R) -> Result<(), FlfError>,
    {
        let count = self.record_count()?;
        self.seek_to_record(0)?;
        for index in 0..count {
            let record = self.read_next()?;
            f(index, record)?;
        }
        Ok(())
    }
}

impl<R: Default, S: Write + Seek> RecordFile<R, S> {
    /// Write `record` at the current position and advance past it.
    pub fn write_record(&mut self, record: &R) -> Result<(), FlfError> {
        self.writer.write(record, &mut self.store)
    }

    /// Overwrite record `index`.
    pub fn write_record_at(&mut self, index: u64, record: &R) -> Result<(), FlfError> {
        self.seek_to_record(index)?;
        self.write_record(record)
    }

    /// Write `record` after the last whole record and return its index.
    pub fn append(&mut self, record: &R) -> Result<u64, FlfError> {
        let len = self
            .store
            .seek(SeekFrom::End(0))
            .map_err(|e| FlfError::Io(format!("Cannot seek to end: {}", e)))?;
        let index = record_count(len, self.record_size());
        self.write_record_at(index, record)?;
        Ok(index)
    }

    pub fn flush(&mut self) -> Result<(), FlfError> {
        self.store
            .flush()
            .map_err(|e| FlfError::Io(format!("Cannot flush: {}", e)))
    }
}
