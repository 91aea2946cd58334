//! Per-type default widths, decoders, and encoders.
//!
//! Every multi-byte number is stored little-endian regardless of the host.
//!
//! | Type | Default width | Encoding |
//! |------|---------------|----------|
//! | int16 / uint16 | 2 | LE two's complement / unsigned |
//! | int32 / uint32 | 4 | LE |
//! | int64 / uint64 | 8 | LE |
//! | bool | 1 | `0x00` false, anything else true |
//! | float32 / float64 | 4 / 8 | LE IEEE 754 |
//! | char16 | 2 | LE UTF-16 code unit |
//! | byte | 1 | raw |
//! | byte-buffer | declared | raw, zero padded |
//! | text | declared | field encoding, zero padded, trailing NULs stripped on read |
//! | timestamp | 8 | LE i64 ticks (100ns) since 0001-01-01T00:00:00 |
//! | duration | 8 | LE i64 ticks (100ns) |
//!
//! Fields declared narrower than their natural width decode by
//! zero-extending the bytes that are present.

use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, NaiveDateTime, TimeDelta};

use crate::record::types::{SemanticType, TextEncoding};
use crate::record::value::Value;
use crate::FlfError;

/// Ticks (100ns) per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks between 0001-01-01T00:00:00 and the Unix epoch.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Largest valid timestamp tick count (9999-12-31T23:59:59.9999999).
pub const MAX_TIMESTAMP_TICKS: i64 = 3_155_378_975_999_999_999;

/// Natural byte width of `ty`, or `None` for types that need a declared length.
pub fn default_width(ty: SemanticType) -> Option<usize> {
    match ty {
        SemanticType::Bool | SemanticType::Byte => Some(1),
        SemanticType::Int16 | SemanticType::UInt16 | SemanticType::Char16 => Some(2),
        SemanticType::Int32 | SemanticType::UInt32 | SemanticType::Float32 => Some(4),
        SemanticType::Int64
        | SemanticType::UInt64
        | SemanticType::Float64
        | SemanticType::Timestamp
        | SemanticType::Duration => Some(8),
        SemanticType::ByteBuffer | SemanticType::Text => None,
    }
}

/// Codec for one field: its semantic type plus text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeCodec {
    pub semantic_type: SemanticType,
    pub encoding: TextEncoding,
}

impl TypeCodec {
    pub fn new(semantic_type: SemanticType, encoding: TextEncoding) -> Self {
        TypeCodec {
            semantic_type,
            encoding,
        }
    }

    pub fn default_width(&self) -> Option<usize> {
        default_width(self.semantic_type)
    }

    /// Decode the bytes of one field. `data` is exactly the field's width.
    pub fn decode(&self, field: &str, data: &[u8]) -> Result<Value, FlfError> {
        let ty = self.semantic_type;
        if data.is_empty() && !ty.is_variable_width() {
            return Err(FlfError::NullValue {
                field: field.to_string(),
            });
        }

        let value = match ty {
            SemanticType::Int16 => Value::Int16(LittleEndian::read_i16(&widen::<2>(data))),
            SemanticType::Int32 => Value::Int32(LittleEndian::read_i32(&widen::<4>(data))),
            SemanticType::Int64 => Value::Int64(LittleEndian::read_i64(&widen::<8>(data))),
            SemanticType::UInt16 => Value::UInt16(LittleEndian::read_u16(&widen::<2>(data))),
            SemanticType::UInt32 => Value::UInt32(LittleEndian::read_u32(&widen::<4>(data))),
            SemanticType::UInt64 => Value::UInt64(LittleEndian::read_u64(&widen::<8>(data))),
            SemanticType::Bool => Value::Bool(data[0] != 0),
            SemanticType::Float32 => Value::Float32(LittleEndian::read_f32(&widen::<4>(data))),
            SemanticType::Float64 => Value::Float64(LittleEndian::read_f64(&widen::<8>(data))),
            SemanticType::Char16 => Value::Char16(LittleEndian::read_u16(&widen::<2>(data))),
            SemanticType::Byte => Value::Byte(data[0]),
            SemanticType::ByteBuffer => Value::Bytes(data.to_vec()),
            SemanticType::Text => {
                let text = self.encoding.decode(data);
                Value::Text(text.trim_end_matches('\0').to_string())
            }
            SemanticType::Timestamp => {
                let ticks = LittleEndian::read_i64(&widen::<8>(data));
                Value::Timestamp(ticks_to_timestamp(ticks).ok_or_else(|| {
                    FlfError::Parse(format!(
                        "Field '{}': timestamp ticks {} out of range",
                        field, ticks
                    ))
                })?)
            }
            SemanticType::Duration => {
                Value::Duration(ticks_to_duration(LittleEndian::read_i64(&widen::<8>(data))))
            }
        };
        Ok(value)
    }

    /// Encode one field value. The result may be shorter than the field
    /// width (the writer pads) or longer (the writer rejects).
    pub fn encode(&self, field: &str, value: &Value) -> Result<Vec<u8>, FlfError> {
        if value.semantic_type() != self.semantic_type {
            return Err(FlfError::TypeMismatch {
                field: field.to_string(),
                reason: format!(
                    "expected a {} value, got {}",
                    self.semantic_type,
                    value.semantic_type()
                ),
            });
        }

        let bytes = match value {
            Value::Int16(v) => v.to_le_bytes().to_vec(),
            Value::Int32(v) => v.to_le_bytes().to_vec(),
            Value::Int64(v) => v.to_le_bytes().to_vec(),
            Value::UInt16(v) => v.to_le_bytes().to_vec(),
            Value::UInt32(v) => v.to_le_bytes().to_vec(),
            Value::UInt64(v) => v.to_le_bytes().to_vec(),
            Value::Bool(v) => vec![u8::from(*v)],
            Value::Float32(v) => v.to_le_bytes().to_vec(),
            Value::Float64(v) => v.to_le_bytes().to_vec(),
            Value::Char16(v) => v.to_le_bytes().to_vec(),
            Value::Byte(v) => vec![*v],
            Value::Bytes(v) => v.clone(),
            Value::Text(v) => self.encoding.encode(v),
            Value::Timestamp(v) => {
                let ticks = timestamp_to_ticks(v).ok_or_else(|| {
                    FlfError::Argument(format!(
                        "Field '{}': timestamp {} is outside 0001-01-01..9999-12-31",
                        field, v
                    ))
                })?;
                ticks.to_le_bytes().to_vec()
            }
            Value::Duration(v) => {
                let ticks = duration_to_ticks(v).ok_or_else(|| {
                    FlfError::Argument(format!(
                        "Field '{}': duration {} does not fit in 64-bit ticks",
                        field, v
                    ))
                })?;
                ticks.to_le_bytes().to_vec()
            }
        };
        Ok(bytes)
    }
}

/// Copy up to `N` bytes of `data` into a zeroed array.
fn widen<const N: usize>(data: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    let n = data.len().min(N);
    buf[..n].copy_from_slice(&data[..n]);
    buf
}

/// Convert a naive timestamp to ticks since 0001-01-01.
pub fn timestamp_to_ticks(ts: &NaiveDateTime) -> Option<i64> {
    let utc = ts.and_utc();
    let ticks = utc
        .timestamp()
        .checked_mul(TICKS_PER_SECOND)?
        .checked_add(i64::from(utc.timestamp_subsec_nanos() / 100))?
        .checked_add(UNIX_EPOCH_TICKS)?;
    (0..=MAX_TIMESTAMP_TICKS).contains(&ticks).then_some(ticks)
}

/// Convert ticks since 0001-01-01 to a naive timestamp.
pub fn ticks_to_timestamp(ticks: i64) -> Option<NaiveDateTime> {
    if !(0..=MAX_TIMESTAMP_TICKS).contains(&ticks) {
        return None;
    }
    let unix_ticks = ticks - UNIX_EPOCH_TICKS;
    let secs = unix_ticks.div_euclid(TICKS_PER_SECOND);
    let nanos = (unix_ticks.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
}

/// Convert a duration to signed ticks, truncating sub-tick precision.
pub fn duration_to_ticks(d: &TimeDelta) -> Option<i64> {
    d.num_seconds()
        .checked_mul(TICKS_PER_SECOND)?
        .checked_add(i64::from(d.subsec_nanos() / 100))
}

/// Convert signed ticks to a duration.
pub fn ticks_to_duration(ticks: i64) -> TimeDelta {
    TimeDelta::seconds(ticks / TICKS_PER_SECOND)
        + TimeDelta::nanoseconds((ticks % TICKS_PER_SECOND) * 100)
}
