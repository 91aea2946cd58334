//! JSON schemas and dynamic records.
//!
//! A [`SchemaDef`] describes a record type at runtime, so files can be read
//! and written without a Rust type for every format:
//!
//! ```json
//! {
//!   "name": "Model",
//!   "fields": [
//!     { "name": "label", "type": "text", "order": 0, "length": 100 },
//!     { "name": "tag", "type": "int32", "offset": 0 },
//!     { "name": "flag", "type": "bool", "sequential": true },
//!     { "name": "code", "type": "text", "order": 1, "length": 8, "encoding": "ascii" }
//!   ]
//! }
//! ```
//!
//! `order` (or `"sequential": true`) places a field sequentially, `offset`
//! makes it an overlay. Fields with neither are ignored, exactly like an
//! untagged field of a Rust record.
//!
//! Records of such a schema are [`DynamicRecord`]s: one optional value per
//! declared field. They convert to and from JSON objects, with byte buffers
//! as hex strings, timestamps as `YYYY-MM-DDTHH:MM:SS[.fffffff]` and
//! durations as signed 100ns tick counts.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as Json};

use crate::record::codec::{duration_to_ticks, ticks_to_duration};
use crate::record::field::{resolve_fields, FieldSpec};
use crate::record::layout::RecordLayout;
use crate::record::types::{SemanticType, TextEncoding};
use crate::record::value::Value;
use crate::FlfError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A record type described by a JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub fields: Vec<FieldDef>,
}

/// One field of a [`SchemaDef`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sequential: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

/// A record whose shape is given by a [`SchemaDef`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicRecord {
    values: Vec<Option<Value>>,
}

impl DynamicRecord {
    /// Value of the field declared at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Set the field declared at `index`.
    pub fn set(&mut self, index: usize, value: Value) {
        if self.values.len() <= index {
            self.values.resize(index + 1, None);
        }
        self.values[index] = Some(value);
    }
}

impl SchemaDef {
    /// Parse a schema from JSON text.
    pub fn from_json(text: &str) -> Result<Self, FlfError> {
        serde_json::from_str(text).map_err(|e| FlfError::Parse(format!("Invalid schema: {}", e)))
    }

    /// Load a schema from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FlfError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| FlfError::Io(format!("Cannot read schema {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Semantic types of all declared fields, in declaration order.
    fn semantic_types(&self) -> Result<Vec<SemanticType>, FlfError> {
        self.fields
            .iter()
            .map(|f| SemanticType::parse_for_field(&f.type_name, &f.name))
            .collect()
    }

    /// Field specs for [`DynamicRecord`]s, tags copied verbatim.
    pub fn field_specs(&self) -> Result<Vec<FieldSpec<DynamicRecord>>, FlfError> {
        let types = self.semantic_types()?;
        let mut specs = Vec::with_capacity(self.fields.len());

        for (index, (def, ty)) in self.fields.iter().zip(types).enumerate() {
            let mut spec = FieldSpec::new(
                def.name.clone(),
                ty,
                move |r: &DynamicRecord| r.get(index).cloned(),
                move |r: &mut DynamicRecord, v| {
                    r.set(index, v);
                    Ok(())
                },
            );
            if let Some(order) = def.order {
                spec = spec.order(order);
            } else if def.sequential {
                spec = spec.sequential();
            }
            if let Some(offset) = def.offset {
                spec = spec.overlay(offset);
            }
            if let Some(length) = def.length {
                spec = spec.length(length);
            }
            if let Some(ref name) = def.encoding {
                spec = spec.encoding(name.parse::<TextEncoding>()?);
            }
            specs.push(spec);
        }

        Ok(specs)
    }

    /// Resolve and build the layout of this schema.
    pub fn layout(&self) -> Result<Arc<RecordLayout<DynamicRecord>>, FlfError> {
        let descriptors = resolve_fields(self.field_specs()?)?;
        Ok(Arc::new(RecordLayout::build(descriptors)?))
    }

    /// Convert a record into a JSON object keyed by field name. Fields that
    /// are absent in the record (ignored by the layout) are omitted.
    pub fn record_to_json(&self, record: &DynamicRecord) -> Map<String, Json> {
        let mut obj = Map::new();
        for (index, def) in self.fields.iter().enumerate() {
            if let Some(value) = record.get(index) {
                obj.insert(def.name.clone(), value_to_json(value));
            }
        }
        obj
    }

    /// Build a record from a JSON object. Missing or `null` members leave
    /// the field absent.
    pub fn record_from_json(&self, obj: &Map<String, Json>) -> Result<DynamicRecord, FlfError> {
        if let Some(unknown) = obj.keys().find(|k| !self.fields.iter().any(|f| &f.name == *k)) {
            return Err(FlfError::Parse(format!(
                "Unknown field '{}' in record",
                unknown
            )));
        }

        let types = self.semantic_types()?;
        let mut record = DynamicRecord::default();
        for (index, (def, ty)) in self.fields.iter().zip(types).enumerate() {
            match obj.get(&def.name) {
                None | Some(Json::Null) => {}
                Some(json) => record.set(index, json_to_value(&def.name, ty, json)?),
            }
        }
        Ok(record)
    }
}

/// JSON representation of one value.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Int16(v) => Json::from(*v),
        Value::Int32(v) => Json::from(*v),
        Value::Int64(v) => Json::from(*v),
        Value::UInt16(v) => Json::from(*v),
        Value::UInt32(v) => Json::from(*v),
        Value::UInt64(v) => Json::from(*v),
        Value::Bool(v) => Json::Bool(*v),
        Value::Float32(v) => Number::from_f64(f64::from(*v)).map_or(Json::Null, Json::Number),
        Value::Float64(v) => Number::from_f64(*v).map_or(Json::Null, Json::Number),
        Value::Char16(v) => Json::from(*v),
        Value::Byte(v) => Json::from(*v),
        Value::Bytes(v) => Json::String(hex::encode(v)),
        Value::Text(v) => Json::String(v.clone()),
        Value::Timestamp(v) => Json::String(v.format(TIMESTAMP_FORMAT).to_string()),
        Value::Duration(v) => duration_to_ticks(v).map_or(Json::Null, Json::from),
    }
}

fn expected(field: &str, what: &str, json: &Json) -> FlfError {
    FlfError::Parse(format!("Field '{}': expected {}, got {}", field, what, json))
}

fn json_int<T: TryFrom<i64>>(field: &str, json: &Json, what: &str) -> Result<T, FlfError> {
    json.as_i64()
        .and_then(|n| T::try_from(n).ok())
        .ok_or_else(|| expected(field, what, json))
}

fn json_uint<T: TryFrom<u64>>(field: &str, json: &Json, what: &str) -> Result<T, FlfError> {
    json.as_u64()
        .and_then(|n| T::try_from(n).ok())
        .ok_or_else(|| expected(field, what, json))
}

/// Parse the JSON representation of a value of type `ty`.
pub fn json_to_value(field: &str, ty: SemanticType, json: &Json) -> Result<Value, FlfError> {
    let value = match ty {
        SemanticType::Int16 => Value::Int16(json_int(field, json, "an int16")?),
        SemanticType::Int32 => Value::Int32(json_int(field, json, "an int32")?),
        SemanticType::Int64 => Value::Int64(json_int(field, json, "an int64")?),
        SemanticType::UInt16 => Value::UInt16(json_uint(field, json, "a uint16")?),
        SemanticType::UInt32 => Value::UInt32(json_uint(field, json, "a uint32")?),
        SemanticType::UInt64 => Value::UInt64(json_uint(field, json, "a uint64")?),
        SemanticType::Bool => Value::Bool(json.as_bool().ok_or_else(|| expected(field, "a bool", json))?),
        SemanticType::Float32 => {
            Value::Float32(json.as_f64().ok_or_else(|| expected(field, "a number", json))? as f32)
        }
        SemanticType::Float64 => {
            Value::Float64(json.as_f64().ok_or_else(|| expected(field, "a number", json))?)
        }
        SemanticType::Char16 => match json {
            Json::String(s) => {
                let mut units = s.encode_utf16();
                match (units.next(), units.next()) {
                    (Some(unit), None) => Value::Char16(unit),
                    _ => return Err(expected(field, "a single UTF-16 code unit", json)),
                }
            }
            _ => Value::Char16(json_uint(field, json, "a char16")?),
        },
        SemanticType::Byte => Value::Byte(json_uint(field, json, "a byte")?),
        SemanticType::ByteBuffer => {
            let s = json.as_str().ok_or_else(|| expected(field, "a hex string", json))?;
            Value::Bytes(
                hex::decode(s)
                    .map_err(|e| FlfError::Parse(format!("Field '{}': invalid hex: {}", field, e)))?,
            )
        }
        SemanticType::Text => Value::Text(
            json.as_str()
                .ok_or_else(|| expected(field, "a string", json))?
                .to_string(),
        ),
        SemanticType::Timestamp => {
            let s = json.as_str().ok_or_else(|| expected(field, "a timestamp string", json))?;
            Value::Timestamp(NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map_err(|e| {
                FlfError::Parse(format!("Field '{}': invalid timestamp '{}': {}", field, s, e))
            })?)
        }
        SemanticType::Duration => Value::Duration(ticks_to_duration(json_int(field, json, "duration ticks")?)),
    };
    Ok(value)
}
