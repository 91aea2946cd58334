//! Fixed-width binary record toolkit.
//!
//! The `fixedlen-utils` crate (library name `fixedlen`) maps Rust record
//! types to and from flat files in which every record occupies the same
//! number of bytes and every field occupies a fixed byte range inside its
//! record.
//!
//! # CLI Reference
//!
//! Install the `flf` binary and use its subcommands to inspect fixed-length
//! files described by a JSON schema.
//!
//! ```text
//! cargo install fixedlen-utils
//! ```
//!
//! | Command | Purpose |
//! |---------|---------|
//! | [`flf layout`](cli::app::Commands::Layout) | Print the resolved field layout of a schema |
//! | [`flf info`](cli::app::Commands::Info) | File size, record size, and record count |
//! | [`flf export`](cli::app::Commands::Export) | Decode records as text or NDJSON |
//! | [`flf dump`](cli::app::Commands::Dump) | Hex dump of a single record |
//! | [`flf import`](cli::app::Commands::Import) | Encode NDJSON records into a file |
//! | [`flf completions`](cli::app::Commands::Completions) | Shell completion scripts |
//!
//! All subcommands accept `--color <auto|always|never>`, `--output <file>`,
//! `--audit-log <file>` and `-v`.
//!
//! # Library API
//!
//! ```toml
//! [dependencies]
//! fixedlen = { package = "fixedlen-utils", version = "0.3" }
//! ```
//!
//! ## Quick example
//!
//! ```no_run
//! use fixedlen::record::field::{FieldSpec, Record};
//! use fixedlen::record::file::RecordFile;
//! use fixedlen::record::types::SemanticType;
//!
//! #[derive(Default)]
//! struct Entry {
//!     id: i32,
//!     name: String,
//! }
//!
//! impl Record for Entry {
//!     fn fields() -> Vec<FieldSpec<Self>> {
//!         vec![
//!             FieldSpec::new(
//!                 "id",
//!                 SemanticType::Int32,
//!                 |r: &Entry| Some(r.id.into()),
//!                 |r: &mut Entry, v| {
//!                     r.id = v.try_into()?;
//!                     Ok(())
//!                 },
//!             )
//!             .order(0),
//!             FieldSpec::new(
//!                 "name",
//!                 SemanticType::Text,
//!                 |r: &Entry| Some(r.name.clone().into()),
//!                 |r: &mut Entry, v| {
//!                     r.name = v.try_into()?;
//!                     Ok(())
//!                 },
//!             )
//!             .order(1)
//!             .length(16),
//!         ]
//!     }
//! }
//!
//! let mut file = RecordFile::<Entry>::create("entries.bin").unwrap();
//! file.append(&Entry { id: 7, name: "seven".into() }).unwrap();
//! let first = file.read_record(0).unwrap();
//! assert_eq!(first.name, "seven");
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`record::types`] | Semantic field types and text encodings |
//! | [`record::value`] | The tagged value carried between records and codecs |
//! | [`record::field`] | Field registration and metadata resolution |
//! | [`record::codec`] | Per-type default widths, decoders, and encoders |
//! | [`record::layout`] | Record size and per-field byte ranges |
//! | [`record::reader`] | Materialize one record from a byte store |
//! | [`record::writer`] | Serialize one record into a byte store |
//! | [`record::file`] | Random access by record index |
//! | [`record::schema`] | JSON schemas and dynamic records |
//!
//! ## Feature flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | on | Builds the `flf` binary and its dependencies. |
//! | `async` | off | [`util::background`] adapter that runs record I/O on `tokio`'s blocking pool. |

#[cfg(feature = "cli")]
pub mod cli;
pub mod record;
pub mod util;

use thiserror::Error;

/// Errors returned by `fixedlen` operations.
#[derive(Error, Debug)]
pub enum FlfError {
    /// A field declares incompatible or dangling metadata.
    #[error("Schema conflict on field '{field}': {reason}")]
    SchemaConflict { field: String, reason: String },

    /// A metadata modifier or value does not fit the field's semantic type.
    #[error("Type mismatch on field '{field}': {reason}")]
    TypeMismatch { field: String, reason: String },

    /// A variable-width field has no declared length.
    #[error("Should specify length of field '{field}' ({semantic_type})")]
    MissingLength { field: String, semantic_type: String },

    /// A semantic type name with no codec.
    #[error("Type '{type_name}' of field '{field}' is not supported")]
    UnsupportedType { field: String, type_name: String },

    /// A field resolved to an absent value during read or write.
    #[error("The value of field '{field}' cannot be null")]
    NullValue { field: String },

    /// Encoded bytes do not fit the field's resolved width.
    #[error("The value size of field '{field}' ({size} bytes) exceeds the field length: {width}")]
    LengthExceeded {
        field: String,
        size: usize,
        width: usize,
    },

    /// A text encoding name with no known codec.
    #[error("Unsupported text encoding: {0}")]
    UnsupportedEncoding(String),

    /// A layout whose sequential fields occupy no bytes.
    #[error("Record layout has no sequential bytes")]
    EmptyLayout,

    /// An I/O error occurred (file open, read, seek, or write failure).
    #[error("I/O error: {0}")]
    Io(String),

    /// A parse error occurred (malformed data or schema documents).
    #[error("Parse error: {0}")]
    Parse(String),

    /// An invalid argument was supplied (out-of-range index, bad option, etc.).
    #[error("Invalid argument: {0}")]
    Argument(String),
}

impl FlfError {
    /// Name of the field the error is attributed to, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            FlfError::SchemaConflict { field, .. }
            | FlfError::TypeMismatch { field, .. }
            | FlfError::MissingLength { field, .. }
            | FlfError::UnsupportedType { field, .. }
            | FlfError::NullValue { field }
            | FlfError::LengthExceeded { field, .. } => Some(field),
            _ => None,
        }
    }
}
