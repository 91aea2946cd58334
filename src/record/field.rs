//! Field registration and metadata resolution.
//!
//! A record type describes its fields with [`FieldSpec`] values: a name, a
//! [`SemanticType`], get/set accessors, and a set of metadata tags
//! (placement, length, encoding). Tags are recorded verbatim by the builder
//! and validated by [`resolve_fields`], which turns the specs into ordered
//! [`FieldDescriptor`]s.
//!
//! # Resolution rules
//!
//! | Tags present | Result |
//! |--------------|--------|
//! | no placement, no modifiers | field excluded from the schema |
//! | no placement, length or encoding | `SchemaConflict` (dangling modifier) |
//! | sequential and overlay | `SchemaConflict` |
//! | encoding on a non-text field | `TypeMismatch` |
//!
//! Sequential fields are sorted by explicit order; fields marked sequential
//! without an order sort after every ordered field, keeping their declaration
//! order among themselves. Overlay fields stay in their declaration slot.

use std::fmt;
use std::sync::Arc;

use crate::record::types::{SemanticType, TextEncoding};
use crate::record::value::Value;
use crate::FlfError;

/// Reads a field value from a record. `None` means the value is absent.
pub type Getter<R> = Arc<dyn Fn(&R) -> Option<Value> + Send + Sync>;

/// Stores a decoded value into a record, handing it back if the record
/// cannot hold it.
pub type Setter<R> = Arc<dyn Fn(&mut R, Value) -> Result<(), Value> + Send + Sync>;

/// A record type with a fixed-width binary layout.
///
/// `Default` provides the blank instance that the reader populates field by
/// field.
pub trait Record: Default + 'static {
    /// Declare the fields of the record, in declaration order.
    fn fields() -> Vec<FieldSpec<Self>>;
}

/// Get/set capability for one field of `R`.
pub struct Accessor<R> {
    get: Getter<R>,
    set: Setter<R>,
}

impl<R> Accessor<R> {
    /// Read the field from `record`.
    pub fn get(&self, record: &R) -> Option<Value> {
        (self.get)(record)
    }

    /// Store `value` into `record`.
    pub fn set(&self, record: &mut R, value: Value) -> Result<(), Value> {
        (self.set)(record, value)
    }
}

impl<R> Clone for Accessor<R> {
    fn clone(&self) -> Self {
        Accessor {
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

/// Declared metadata for one field, before validation.
pub struct FieldSpec<R> {
    name: String,
    semantic_type: SemanticType,
    /// `Some(None)` is a sequential tag without an explicit order.
    sequential: Option<Option<u32>>,
    overlay: Option<u64>,
    length: Option<usize>,
    encoding: Option<TextEncoding>,
    accessor: Accessor<R>,
}

impl<R> FieldSpec<R> {
    /// Start a field declaration with no tags.
    pub fn new<G, S>(name: impl Into<String>, semantic_type: SemanticType, get: G, set: S) -> Self
    where
        G: Fn(&R) -> Option<Value> + Send + Sync + 'static,
        S: Fn(&mut R, Value) -> Result<(), Value> + Send + Sync + 'static,
    {
        FieldSpec {
            name: name.into(),
            semantic_type,
            sequential: None,
            overlay: None,
            length: None,
            encoding: None,
            accessor: Accessor {
                get: Arc::new(get),
                set: Arc::new(set),
            },
        }
    }

    /// Tag the field as sequential with an explicit order.
    pub fn order(mut self, order: u32) -> Self {
        self.sequential = Some(Some(order));
        self
    }

    /// Tag the field as sequential without an explicit order.
    pub fn sequential(mut self) -> Self {
        self.sequential = Some(None);
        self
    }

    /// Tag the field as an overlay at `offset` bytes from the record start.
    pub fn overlay(mut self, offset: u64) -> Self {
        self.overlay = Some(offset);
        self
    }

    /// Declare an explicit byte width.
    pub fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Declare the text encoding.
    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Where a field lives inside its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Consumes its own range of the linear layout. `None` sorts last.
    Sequential(Option<u32>),
    /// Views bytes at an absolute offset from the record base.
    Overlay(u64),
}

impl Placement {
    pub fn is_overlay(&self) -> bool {
        matches!(self, Placement::Overlay(_))
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Sequential(Some(order)) => write!(f, "seq #{}", order),
            Placement::Sequential(None) => write!(f, "seq"),
            Placement::Overlay(offset) => write!(f, "overlay @{}", offset),
        }
    }
}

/// One validated field of a record type.
pub struct FieldDescriptor<R> {
    pub name: String,
    pub semantic_type: SemanticType,
    pub placement: Placement,
    pub declared_length: Option<usize>,
    /// Set only for text fields; defaults to UTF-8.
    pub text_encoding: Option<TextEncoding>,
    pub accessor: Accessor<R>,
}

impl<R> FieldDescriptor<R> {
    /// Effective encoding of a text field.
    pub fn encoding(&self) -> TextEncoding {
        self.text_encoding.unwrap_or_default()
    }
}

impl<R> Clone for FieldDescriptor<R> {
    fn clone(&self) -> Self {
        FieldDescriptor {
            name: self.name.clone(),
            semantic_type: self.semantic_type,
            placement: self.placement,
            declared_length: self.declared_length,
            text_encoding: self.text_encoding,
            accessor: self.accessor.clone(),
        }
    }
}

impl<R> fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("semantic_type", &self.semantic_type)
            .field("placement", &self.placement)
            .field("declared_length", &self.declared_length)
            .field("text_encoding", &self.text_encoding)
            .finish_non_exhaustive()
    }
}

/// Validate a single spec. `Ok(None)` means the field carries no placement
/// and is not part of the schema.
fn classify<R>(spec: FieldSpec<R>) -> Result<Option<FieldDescriptor<R>>, FlfError> {
    let placement = match (spec.sequential, spec.overlay) {
        (Some(_), Some(_)) => {
            return Err(FlfError::SchemaConflict {
                field: spec.name,
                reason: "only one of a sequential order and an overlay offset may be declared"
                    .to_string(),
            })
        }
        (Some(order), None) => Placement::Sequential(order),
        (None, Some(offset)) => Placement::Overlay(offset),
        (None, None) => {
            if spec.length.is_some() || spec.encoding.is_some() {
                return Err(FlfError::SchemaConflict {
                    field: spec.name,
                    reason: "length or encoding declared without a sequential or overlay placement"
                        .to_string(),
                });
            }
            return Ok(None);
        }
    };

    if spec.encoding.is_some() && spec.semantic_type != SemanticType::Text {
        return Err(FlfError::TypeMismatch {
            field: spec.name,
            reason: format!(
                "encoding applies only to text fields, field is {}",
                spec.semantic_type
            ),
        });
    }

    Ok(Some(FieldDescriptor {
        name: spec.name,
        semantic_type: spec.semantic_type,
        placement,
        declared_length: spec.length,
        text_encoding: spec.encoding,
        accessor: spec.accessor,
    }))
}

/// Resolve declared specs into ordered descriptors.
///
/// Sequential descriptors are stably sorted by order (absent order last)
/// and written back into the slots sequential fields occupied, so overlays
/// keep their declared position between them.
pub fn resolve_fields<R>(specs: Vec<FieldSpec<R>>) -> Result<Vec<FieldDescriptor<R>>, FlfError> {
    let mut resolved = Vec::with_capacity(specs.len());
    for spec in specs {
        if let Some(desc) = classify(spec)? {
            resolved.push(desc);
        }
    }

    for (i, a) in resolved.iter().enumerate() {
        if resolved[..i].iter().any(|b| b.name == a.name) {
            return Err(FlfError::SchemaConflict {
                field: a.name.clone(),
                reason: "field name declared more than once".to_string(),
            });
        }
    }

    let slots: Vec<usize> = resolved
        .iter()
        .enumerate()
        .filter(|(_, d)| !d.placement.is_overlay())
        .map(|(i, _)| i)
        .collect();

    let mut sequential: Vec<FieldDescriptor<R>> = slots.iter().map(|&i| resolved[i].clone()).collect();
    sequential.sort_by_key(|d| match d.placement {
        Placement::Sequential(Some(order)) => (0u8, order),
        _ => (1u8, 0),
    });

    for (slot, desc) in slots.into_iter().zip(sequential) {
        resolved[slot] = desc;
    }

    Ok(resolved)
}
