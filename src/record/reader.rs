//! Materialize one record from a byte store.
//!
//! The reader starts at the store's current position (the record base) and
//! keeps a separate sequential cursor. Sequential fields are read at the
//! cursor, which then advances by the field width. Overlay fields seek to
//! `base + offset` and leave the cursor alone, so overlays may appear
//! anywhere between sequential fields. When all fields are read the store
//! is left at `base + record_size`, ready for the next record.
//!
//! Any field failure aborts the read; no partially populated record is
//! returned.

use std::io::{Cursor, Read, Seek, SeekFrom};
use std::sync::Arc;

use crate::record::field::Record;
use crate::record::layout::RecordLayout;
use crate::FlfError;

/// Reads records of type `R` according to a layout.
pub struct RecordReader<R> {
    layout: Arc<RecordLayout<R>>,
}

impl<R> Clone for RecordReader<R> {
    fn clone(&self) -> Self {
        RecordReader {
            layout: Arc::clone(&self.layout),
        }
    }
}

impl<R: Record> RecordReader<R> {
    /// Reader for the cached layout of `R`.
    pub fn for_record() -> Result<Self, FlfError> {
        Ok(Self::new(RecordLayout::<R>::of()?))
    }
}

impl<R: Default> RecordReader<R> {
    pub fn new(layout: Arc<RecordLayout<R>>) -> Self {
        RecordReader { layout }
    }

    pub fn layout(&self) -> &Arc<RecordLayout<R>> {
        &self.layout
    }

    /// Read one record starting at the store's current position.
    pub fn read<S: Read + Seek>(&self, store: &mut S) -> Result<R, FlfError> {
        let base = store
            .stream_position()
            .map_err(|e| FlfError::Io(format!("Cannot get stream position: {}", e)))?;

        let mut record = R::default();
        let mut buf = vec![0u8; self.layout.max_width()];
        let mut seq_cursor = base;
        let mut pos = base;

        for field in self.layout.fields() {
            let target = if field.is_overlay() {
                tracing::trace!(field = field.name(), offset = field.offset, "overlay read");
                offset_from(base, field.offset, field.name())?
            } else {
                seq_cursor
            };

            if pos != target {
                seek_to(store, target)?;
                pos = target;
            }

            let data = &mut buf[..field.width];
            store.read_exact(data).map_err(|e| {
                FlfError::Io(format!(
                    "Cannot read {} bytes of field '{}' at offset {}: {}",
                    field.width,
                    field.name(),
                    pos,
                    e
                ))
            })?;
            pos = offset_from(pos, field.width as u64, field.name())?;
            if !field.is_overlay() {
                seq_cursor = pos;
            }

            let value = field.codec.decode(field.name(), data)?;
            field
                .descriptor
                .accessor
                .set(&mut record, value)
                .map_err(|v| FlfError::TypeMismatch {
                    field: field.name().to_string(),
                    reason: format!("record cannot hold a {} value", v.semantic_type()),
                })?;
        }

        let end = base
            .checked_add(self.layout.record_size() as u64)
            .ok_or_else(|| FlfError::Argument(format!("Record end past offset {} is out of range", base)))?;
        if pos != end {
            seek_to(store, end)?;
        }

        Ok(record)
    }

    /// Decode a record from exactly one record's worth of bytes.
    pub fn decode(&self, bytes: &[u8]) -> Result<R, FlfError> {
        if bytes.len() < self.layout.record_size() {
            return Err(FlfError::Argument(format!(
                "Record data is {} bytes, expected {}",
                bytes.len(),
                self.layout.record_size()
            )));
        }
        self.read(&mut Cursor::new(bytes))
    }
}

pub(crate) fn seek_to<S: Seek>(store: &mut S, pos: u64) -> Result<(), FlfError> {
    store
        .seek(SeekFrom::Start(pos))
        .map_err(|e| FlfError::Io(format!("Cannot seek to offset {}: {}", pos, e)))?;
    Ok(())
}

fn offset_from(base: u64, delta: u64, field: &str) -> Result<u64, FlfError> {
    base.checked_add(delta).ok_or_else(|| {
        FlfError::Argument(format!(
            "Field '{}' at {} + {} is past the largest stream offset",
            field, base, delta
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::field::FieldSpec;
    use crate::record::types::SemanticType;
    use crate::record::value::Value;

    #[derive(Default, Debug, PartialEq)]
    struct Pair {
        wide: i64,
        low: i32,
        tail: u16,
    }

    fn pair_specs() -> Vec<FieldSpec<Pair>> {
        vec![
            FieldSpec::new(
                "wide",
                SemanticType::Int64,
                |r: &Pair| Some(r.wide.into()),
                |r: &mut Pair, v| {
                    r.wide = v.try_into()?;
                    Ok(())
                },
            )
            .order(0),
            FieldSpec::new(
                "low",
                SemanticType::Int32,
                |r: &Pair| Some(r.low.into()),
                |r: &mut Pair, v| {
                    r.low = v.try_into()?;
                    Ok(())
                },
            )
            .overlay(0),
            FieldSpec::new(
                "tail",
                SemanticType::UInt16,
                |r: &Pair| Some(r.tail.into()),
                |r: &mut Pair, v| {
                    r.tail = v.try_into()?;
                    Ok(())
                },
            )
            .order(1),
        ]
    }

    fn reader() -> RecordReader<Pair> {
        RecordReader::new(Arc::new(RecordLayout::from_specs(pair_specs()).unwrap()))
    }

    #[test]
    fn test_overlay_between_sequential_reads() {
        let mut data = Vec::new();
        data.extend_from_slice(&0x1122_3344_5566_7788i64.to_le_bytes());
        data.extend_from_slice(&0xBEEFu16.to_le_bytes());
        let rec = reader().decode(&data).unwrap();
        assert_eq!(rec.wide, 0x1122_3344_5566_7788);
        assert_eq!(rec.low, 0x5566_7788);
        assert_eq!(rec.tail, 0xBEEF);
    }

    #[test]
    fn test_position_ends_after_record() {
        let mut data = vec![0u8; 10];
        data.extend_from_slice(&7i64.to_le_bytes());
        data.extend_from_slice(&9u16.to_le_bytes());
        let mut cursor = Cursor::new(data);
        cursor.set_position(10);
        let rec = reader().read(&mut cursor).unwrap();
        assert_eq!(rec, Pair { wide: 7, low: 7, tail: 9 });
        assert_eq!(cursor.position(), 20);
    }

    #[test]
    fn test_overlay_past_stream_end_is_argument_error() {
        let specs = vec![
            FieldSpec::new(
                "wide",
                SemanticType::Int32,
                |_: &Pair| Some(Value::Int32(0)),
                |_: &mut Pair, _| Ok(()),
            )
            .order(0),
            FieldSpec::new(
                "far",
                SemanticType::Int32,
                |_: &Pair| Some(Value::Int32(0)),
                |_: &mut Pair, _| Ok(()),
            )
            .overlay(u64::MAX - 4),
        ];
        let reader = RecordReader::new(Arc::new(RecordLayout::from_specs(specs).unwrap()));
        let mut cursor = Cursor::new(vec![0u8; 9]);
        cursor.set_position(5);
        let err = reader.read(&mut cursor).unwrap_err();
        assert!(matches!(err, FlfError::Argument(ref msg) if msg.contains("'far'")));
    }

    #[test]
    fn test_short_store_is_io_error() {
        let mut cursor = Cursor::new(vec![0u8; 5]);
        let err = reader().read(&mut cursor).unwrap_err();
        assert!(matches!(err, FlfError::Io(_)));
    }

    #[test]
    fn test_setter_rejection_is_type_mismatch() {
        let spec = FieldSpec::new(
            "n",
            SemanticType::Int16,
            |_: &Pair| None,
            |_: &mut Pair, v: Value| Err(v),
        )
        .order(0);
        let reader = RecordReader::new(Arc::new(RecordLayout::from_specs(vec![spec]).unwrap()));
        let err = reader.decode(&[1, 0]).unwrap_err();
        assert!(matches!(err, FlfError::TypeMismatch { ref field, .. } if field == "n"));
    }
}
