use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{load_schema, wprintln};
use crate::record::field::Placement;
use crate::record::layout::{LayoutField, RecordLayout};
use crate::record::schema::{DynamicRecord, SchemaDef};
use crate::record::types::SemanticType;
use crate::FlfError;

/// Options for the `flf layout` subcommand.
pub struct LayoutOptions {
    /// Path to the JSON schema.
    pub schema: String,
    /// Emit output as JSON.
    pub json: bool,
}

#[derive(Serialize)]
struct LayoutJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    record_size: usize,
    fields: Vec<FieldJson>,
    ignored: Vec<String>,
}

#[derive(Serialize)]
struct FieldJson {
    name: String,
    #[serde(rename = "type")]
    type_name: &'static str,
    placement: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<u32>,
    offset: u64,
    width: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding: Option<&'static str>,
}

impl FieldJson {
    fn from_field(field: &LayoutField<DynamicRecord>) -> Self {
        let desc = &field.descriptor;
        let (placement, order) = match desc.placement {
            Placement::Sequential(order) => ("sequential", order),
            Placement::Overlay(_) => ("overlay", None),
        };
        FieldJson {
            name: desc.name.clone(),
            type_name: desc.semantic_type.name(),
            placement,
            order,
            offset: field.offset,
            width: field.width,
            encoding: (desc.semantic_type == SemanticType::Text).then(|| desc.encoding().name()),
        }
    }
}

/// Names declared in the schema that carry no placement.
fn ignored_fields(schema: &SchemaDef, layout: &RecordLayout<DynamicRecord>) -> Vec<String> {
    schema
        .fields
        .iter()
        .filter(|f| layout.field(&f.name).is_none())
        .map(|f| f.name.clone())
        .collect()
}

/// Print the resolved layout of a schema.
///
/// Fields are listed in read order: sequential fields sorted by order, with
/// overlay fields in the slot they were declared in.
pub fn execute(opts: &LayoutOptions, writer: &mut dyn Write) -> Result<(), FlfError> {
    let (schema, layout) = load_schema(&opts.schema)?;
    let ignored = ignored_fields(&schema, &layout);

    if opts.json {
        let out = LayoutJson {
            name: schema.name.clone(),
            record_size: layout.record_size(),
            fields: layout.fields().iter().map(FieldJson::from_field).collect(),
            ignored,
        };
        let json = serde_json::to_string_pretty(&out)
            .map_err(|e| FlfError::Parse(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", json)?;
        return Ok(());
    }

    let title = schema.name.as_deref().unwrap_or(&opts.schema);
    wprintln!(writer, "{}", format!("Layout of {}", title).bold())?;
    wprintln!(writer)?;
    wprintln!(
        writer,
        "  {:<20} {:<12} {:<14} {:>6} {:>6}  {}",
        "Field", "Type", "Placement", "Offset", "Width", "Encoding"
    )?;

    for field in layout.fields() {
        let json = FieldJson::from_field(field);
        let placement = field.descriptor.placement.to_string();
        let placement = if field.is_overlay() {
            placement.yellow().to_string()
        } else {
            placement
        };
        wprintln!(
            writer,
            "  {:<20} {:<12} {:<14} {:>6} {:>6}  {}",
            json.name,
            json.type_name,
            placement,
            json.offset,
            json.width,
            json.encoding.unwrap_or("-")
        )?;
    }

    wprintln!(writer)?;
    wprintln!(
        writer,
        "Record size: {} bytes",
        layout.record_size().to_string().green()
    )?;
    if !ignored.is_empty() {
        wprintln!(writer, "Ignored (no placement): {}", ignored.join(", "))?;
    }

    Ok(())
}
