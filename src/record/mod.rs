//! Fixed-width record mapping.
//!
//! A record type declares its fields ([`field`]); declarations are resolved
//! into an immutable [`layout::RecordLayout`] that fixes the byte range of
//! every field. [`reader`] and [`writer`] move one record between a layout
//! and a byte store, and [`file`] adds random access by record index.
//! [`schema`] builds layouts from JSON documents instead of Rust code.

pub mod codec;
pub mod field;
pub mod file;
pub mod layout;
pub mod reader;
pub mod schema;
pub mod types;
pub mod value;
pub mod writer;
