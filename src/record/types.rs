//! Semantic field types and text encodings.
//!
//! [`SemanticType`] is the closed set of field types a record may declare.
//! Each type maps to exactly one codec in [`crate::record::codec`]; the
//! mapping from a type *name* (as used in JSON schemas) to the enum is the
//! only place an unknown type can appear.
//!
//! [`TextEncoding`] covers the character encodings a `text` field may use.

use std::fmt;
use std::str::FromStr;

use crate::FlfError;

/// The semantic type of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Int16,
    Int32,
    Int64,
    UInt16,
    UInt32,
    UInt64,
    Bool,
    Float32,
    Float64,
    /// One UTF-16 code unit.
    Char16,
    Byte,
    /// Raw bytes; requires a declared length.
    ByteBuffer,
    /// Encoded characters; requires a declared length.
    Text,
    /// 100ns ticks since 0001-01-01T00:00:00.
    Timestamp,
    /// Signed 100ns ticks.
    Duration,
}

impl SemanticType {
    /// All semantic types, in declaration order.
    pub const ALL: [SemanticType; 15] = [
        SemanticType::Int16,
        SemanticType::Int32,
        SemanticType::Int64,
        SemanticType::UInt16,
        SemanticType::UInt32,
        SemanticType::UInt64,
        SemanticType::Bool,
        SemanticType::Float32,
        SemanticType::Float64,
        SemanticType::Char16,
        SemanticType::Byte,
        SemanticType::ByteBuffer,
        SemanticType::Text,
        SemanticType::Timestamp,
        SemanticType::Duration,
    ];

    /// Returns the canonical schema name of the type.
    pub fn name(self) -> &'static str {
        match self {
            SemanticType::Int16 => "int16",
            SemanticType::Int32 => "int32",
            SemanticType::Int64 => "int64",
            SemanticType::UInt16 => "uint16",
            SemanticType::UInt32 => "uint32",
            SemanticType::UInt64 => "uint64",
            SemanticType::Bool => "bool",
            SemanticType::Float32 => "float32",
            SemanticType::Float64 => "float64",
            SemanticType::Char16 => "char16",
            SemanticType::Byte => "byte",
            SemanticType::ByteBuffer => "byte-buffer",
            SemanticType::Text => "text",
            SemanticType::Timestamp => "timestamp",
            SemanticType::Duration => "duration",
        }
    }

    /// Returns true for types without a natural width.
    pub fn is_variable_width(self) -> bool {
        matches!(self, SemanticType::ByteBuffer | SemanticType::Text)
    }

    /// Parse a schema type name, attributing failures to `field`.
    pub fn parse_for_field(name: &str, field: &str) -> Result<Self, FlfError> {
        name.parse().map_err(|_| FlfError::UnsupportedType {
            field: field.to_string(),
            type_name: name.to_string(),
        })
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SemanticType {
    type Err = FlfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.to_ascii_lowercase().as_str() {
            "int16" | "i16" | "short" => SemanticType::Int16,
            "int32" | "i32" | "int" => SemanticType::Int32,
            "int64" | "i64" | "long" => SemanticType::Int64,
            "uint16" | "u16" | "ushort" => SemanticType::UInt16,
            "uint32" | "u32" | "uint" => SemanticType::UInt32,
            "uint64" | "u64" | "ulong" => SemanticType::UInt64,
            "bool" | "boolean" => SemanticType::Bool,
            "float32" | "f32" | "float" => SemanticType::Float32,
            "float64" | "f64" | "double" => SemanticType::Float64,
            "char16" | "char" => SemanticType::Char16,
            "byte" | "u8" => SemanticType::Byte,
            "byte-buffer" | "bytes" => SemanticType::ByteBuffer,
            "text" | "string" => SemanticType::Text,
            "timestamp" | "datetime" => SemanticType::Timestamp,
            "duration" | "timespan" => SemanticType::Duration,
            _ => {
                return Err(FlfError::UnsupportedType {
                    field: String::new(),
                    type_name: s.to_string(),
                })
            }
        };
        Ok(ty)
    }
}

/// Character encoding of a `text` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Ascii,
    Latin1,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    /// Returns the canonical name of the encoding.
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Latin1 => "latin1",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
        }
    }

    /// Decode `data` into a string. Never fails; unmappable input becomes
    /// U+FFFD (UTF-8/UTF-16) or `?` (ASCII).
    pub fn decode(self, data: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(data).into_owned(),
            TextEncoding::Ascii => data
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '?' })
                .collect(),
            TextEncoding::Latin1 => data.iter().map(|&b| b as char).collect(),
            TextEncoding::Utf16Le => {
                let units = data.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]]));
                char::decode_utf16(units)
                    .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect()
            }
            TextEncoding::Utf16Be => {
                let units = data.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]]));
                char::decode_utf16(units)
                    .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect()
            }
        }
    }

    /// Encode `text`. Characters outside ASCII/Latin-1 become `?`.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            TextEncoding::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            TextEncoding::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextEncoding {
    type Err = FlfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            "utf-16" | "utf16" | "utf-16le" | "unicode" => Ok(TextEncoding::Utf16Le),
            "utf-16be" | "bigendianunicode" => Ok(TextEncoding::Utf16Be),
            _ => Err(FlfError::UnsupportedEncoding(s.to_string())),
        }
    }
}
