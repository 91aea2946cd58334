//! Field values exchanged between records and codecs.
//!
//! [`Value`] has one variant per [`SemanticType`]. Record accessors produce
//! and consume values; codecs turn them into bytes and back. Conversions
//! from and to the natural Rust carrier of each type are provided so that
//! accessor closures stay one-liners:
//!
//! ```
//! use fixedlen::record::value::Value;
//!
//! let v: Value = 42i32.into();
//! let back: i32 = v.try_into().unwrap();
//! assert_eq!(back, 42);
//! ```
//!
//! A failed `TryFrom` hands the original value back as the error, which is
//! what record setters return when a Rust field cannot hold a decoded value.

use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};

use crate::record::types::SemanticType;

/// A decoded or to-be-encoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Bool(bool),
    Float32(f32),
    Float64(f64),
    /// A single UTF-16 code unit (may be a lone surrogate).
    Char16(u16),
    Byte(u8),
    Bytes(Vec<u8>),
    Text(String),
    Timestamp(NaiveDateTime),
    Duration(TimeDelta),
}

impl Value {
    /// Returns the semantic type this value belongs to.
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            Value::Int16(_) => SemanticType::Int16,
            Value::Int32(_) => SemanticType::Int32,
            Value::Int64(_) => SemanticType::Int64,
            Value::UInt16(_) => SemanticType::UInt16,
            Value::UInt32(_) => SemanticType::UInt32,
            Value::UInt64(_) => SemanticType::UInt64,
            Value::Bool(_) => SemanticType::Bool,
            Value::Float32(_) => SemanticType::Float32,
            Value::Float64(_) => SemanticType::Float64,
            Value::Char16(_) => SemanticType::Char16,
            Value::Byte(_) => SemanticType::Byte,
            Value::Bytes(_) => SemanticType::ByteBuffer,
            Value::Text(_) => SemanticType::Text,
            Value::Timestamp(_) => SemanticType::Timestamp,
            Value::Duration(_) => SemanticType::Duration,
        }
    }

    /// Unwrap a `char16` code unit. `u16` itself converts to `UInt16`, so
    /// char fields go through this instead of `TryFrom`.
    pub fn into_char16(self) -> Result<u16, Value> {
        match self {
            Value::Char16(c) => Ok(c),
            other => Err(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Char16(v) => match char::from_u32(u32::from(*v)) {
                Some(c) if !c.is_control() => write!(f, "'{}'", c),
                _ => write!(f, "\\u{{{:04x}}}", v),
            },
            Value::Byte(v) => write!(f, "0x{:02x}", v),
            Value::Bytes(v) => write!(f, "{}", hex::encode(v)),
            Value::Text(v) => write!(f, "{:?}", v),
            Value::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Duration(v) => write!(f, "{}", v),
        }
    }
}

macro_rules! value_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }

            impl TryFrom<Value> for $ty {
                type Error = Value;

                fn try_from(v: Value) -> Result<Self, Self::Error> {
                    match v {
                        Value::$variant(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

value_conversions! {
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    bool => Bool,
    f32 => Float32,
    f64 => Float64,
    u8 => Byte,
    Vec<u8> => Bytes,
    String => Text,
    NaiveDateTime => Timestamp,
    TimeDelta => Duration,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}
