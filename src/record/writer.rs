//! Serialize one record into a byte sink.
//!
//! Only sequential fields are written, in layout order. Overlay fields are
//! skipped: their bytes are a sub-range of bytes a sequential field already
//! produces. Each field is encoded, checked against its width, written, and
//! zero padded up to the width, so every call advances the sink by exactly
//! one record size.
//!
//! A failing field aborts the write. Bytes already written for earlier
//! fields of the same record stay in the sink.

use std::io::Write;
use std::sync::Arc;

use crate::record::field::Record;
use crate::record::layout::RecordLayout;
use crate::FlfError;

/// Writes records of type `R` according to a layout.
pub struct RecordWriter<R> {
    layout: Arc<RecordLayout<R>>,
}

impl<R> Clone for RecordWriter<R> {
    fn clone(&self) -> Self {
        RecordWriter {
            layout: Arc::clone(&self.layout),
        }
    }
}

impl<R: Record> RecordWriter<R> {
    /// Writer for the cached layout of `R`.
    pub fn for_record() -> Result<Self, FlfError> {
        Ok(Self::new(RecordLayout::<R>::of()?))
    }
}

impl<R> RecordWriter<R> {
    pub fn new(layout: Arc<RecordLayout<R>>) -> Self {
        RecordWriter { layout }
    }

    pub fn layout(&self) -> &Arc<RecordLayout<R>> {
        &self.layout
    }

    /// Write one record at the sink's current position.
    pub fn write<W: Write>(&self, record: &R, sink: &mut W) -> Result<(), FlfError> {
        for field in self.layout.sequential_fields() {
            let value = field
                .descriptor
                .accessor
                .get(record)
                .ok_or_else(|| FlfError::NullValue {
                    field: field.name().to_string(),
                })?;

            let bytes = field.codec.encode(field.name(), &value)?;
            if bytes.len() > field.width {
                return Err(FlfError::LengthExceeded {
                    field: field.name().to_string(),
                    size: bytes.len(),
                    width: field.width,
                });
            }

            sink.write_all(&bytes).map_err(|e| {
                FlfError::Io(format!("Cannot write field '{}': {}", field.name(), e))
            })?;

            let pad = field.width - bytes.len();
            if pad > 0 {
                tracing::trace!(field = field.name(), pad, "zero padding short value");
                sink.write_all(&vec![0u8; pad]).map_err(|e| {
                    FlfError::Io(format!("Cannot pad field '{}': {}", field.name(), e))
                })?;
            }
        }
        Ok(())
    }

    /// Encode one record into a new buffer of exactly one record size.
    pub fn encode(&self, record: &R) -> Result<Vec<u8>, FlfError> {
        let mut buf = Vec::with_capacity(self.layout.record_size());
        self.write(record, &mut buf)?;
        Ok(buf)
    }
}
