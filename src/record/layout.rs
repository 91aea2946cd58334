//! Record size and per-field byte ranges.
//!
//! [`RecordLayout`] combines resolved [`FieldDescriptor`]s with codec
//! widths. Sequential fields are laid out back to back in resolved order and
//! their widths sum to the record size. Overlay fields keep their declared
//! offset and contribute nothing to the record size; they view bytes that a
//! sequential field already owns.
//!
//! Layouts are immutable once built. [`RecordLayout::of`] builds the layout
//! of a [`Record`] type on first use and returns the cached `Arc` afterwards.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::{Arc, OnceLock, RwLock};

use crate::record::codec::TypeCodec;
use crate::record::field::{resolve_fields, FieldDescriptor, FieldSpec, Placement, Record};
use crate::FlfError;

/// Largest byte width accepted for a single field (1 GiB).
pub const MAX_FIELD_WIDTH: usize = 1 << 30;

/// A field together with its resolved byte range.
pub struct LayoutField<R> {
    pub descriptor: FieldDescriptor<R>,
    /// Offset from the record base (accumulated for sequential fields,
    /// declared for overlays).
    pub offset: u64,
    pub width: usize,
    pub codec: TypeCodec,
}

impl<R> LayoutField<R> {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn is_overlay(&self) -> bool {
        self.descriptor.placement.is_overlay()
    }

    /// Half-open byte range relative to the record base.
    ///
    /// [`RecordLayout::build`] rejects fields whose end does not fit in a `u64`.
    pub fn range(&self) -> Range<u64> {
        self.offset..self.offset.saturating_add(self.width as u64)
    }
}

impl<R> fmt::Debug for LayoutField<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutField")
            .field("name", &self.descriptor.name)
            .field("placement", &self.descriptor.placement)
            .field("offset", &self.offset)
            .field("width", &self.width)
            .finish()
    }
}

/// The resolved, immutable binary layout of one record type.
pub struct RecordLayout<R> {
    /// All fields in read order.
    fields: Vec<LayoutField<R>>,
    record_size: usize,
    max_width: usize,
}

impl<R> fmt::Debug for RecordLayout<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordLayout")
            .field("record_size", &self.record_size)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Resolve the byte width of a field: declared length, else the codec default.
fn field_width<R>(desc: &FieldDescriptor<R>) -> Result<usize, FlfError> {
    match desc.declared_length {
        Some(len) if len > MAX_FIELD_WIDTH => Err(FlfError::Argument(format!(
            "Field '{}' length {} exceeds the maximum of {} bytes",
            desc.name, len, MAX_FIELD_WIDTH
        ))),
        Some(len) => Ok(len),
        None => crate::record::codec::default_width(desc.semantic_type).ok_or_else(|| {
            FlfError::MissingLength {
                field: desc.name.clone(),
                semantic_type: desc.semantic_type.to_string(),
            }
        }),
    }
}

impl<R> RecordLayout<R> {
    /// Build a layout from resolved descriptors.
    pub fn build(descriptors: Vec<FieldDescriptor<R>>) -> Result<Self, FlfError> {
        let mut fields = Vec::with_capacity(descriptors.len());
        let mut cursor = 0u64;
        let mut max_width = 0usize;

        for desc in descriptors {
            let width = field_width(&desc)?;
            let offset = match desc.placement {
                Placement::Sequential(_) => {
                    let start = cursor;
                    cursor = cursor.checked_add(width as u64).ok_or_else(|| {
                        FlfError::Argument(format!(
                            "Record size overflows at field '{}'",
                            desc.name
                        ))
                    })?;
                    start
                }
                Placement::Overlay(offset) => {
                    if offset.checked_add(width as u64).is_none() {
                        return Err(FlfError::Argument(format!(
                            "Overlay field '{}' at offset {} with width {} is out of range",
                            desc.name, offset, width
                        )));
                    }
                    offset
                }
            };
            max_width = max_width.max(width);
            let codec = TypeCodec::new(desc.semantic_type, desc.encoding());
            fields.push(LayoutField {
                descriptor: desc,
                offset,
                width,
                codec,
            });
        }

        if cursor == 0 {
            return Err(FlfError::EmptyLayout);
        }

        let record_size = usize::try_from(cursor)
            .map_err(|_| FlfError::Argument(format!("Record size {} is too large", cursor)))?;

        tracing::debug!(
            record_size,
            fields = fields.len(),
            "built record layout"
        );

        Ok(RecordLayout {
            fields,
            record_size,
            max_width,
        })
    }

    /// Resolve specs and build the layout in one step.
    pub fn from_specs(specs: Vec<FieldSpec<R>>) -> Result<Self, FlfError> {
        Self::build(resolve_fields(specs)?)
    }

    /// Total bytes per record (sum of sequential widths).
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Widest single field, the size of a scratch buffer that fits any field.
    pub fn max_width(&self) -> usize {
        self.max_width
    }

    /// All fields in read order.
    pub fn fields(&self) -> &[LayoutField<R>] {
        &self.fields
    }

    /// Sequential fields in layout order.
    pub fn sequential_fields(&self) -> impl Iterator<Item = &LayoutField<R>> {
        self.fields.iter().filter(|f| !f.is_overlay())
    }

    /// Overlay fields in declaration order.
    pub fn overlay_fields(&self) -> impl Iterator<Item = &LayoutField<R>> {
        self.fields.iter().filter(|f| f.is_overlay())
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&LayoutField<R>> {
        self.fields.iter().find(|f| f.name() == name)
    }
}

type LayoutCache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

fn layout_cache() -> &'static LayoutCache {
    static CACHE: OnceLock<LayoutCache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

impl<R: Record> RecordLayout<R> {
    /// The layout of `R`, built on first use and shared afterwards.
    ///
    /// Schema errors are not cached; every call for an invalid type
    /// re-resolves and fails again.
    pub fn of() -> Result<Arc<Self>, FlfError> {
        let key = TypeId::of::<R>();

        if let Ok(cache) = layout_cache().read() {
            if let Some(cached) = cache.get(&key) {
                if let Ok(layout) = Arc::clone(cached).downcast::<Self>() {
                    return Ok(layout);
                }
            }
        }

        let layout = Arc::new(Self::from_specs(R::fields())?);
        if let Ok(mut cache) = layout_cache().write() {
            let entry = cache
                .entry(key)
                .or_insert_with(|| Arc::clone(&layout) as Arc<dyn Any + Send + Sync>);
            if let Ok(existing) = Arc::clone(entry).downcast::<Self>() {
                return Ok(existing);
            }
        }
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::types::{SemanticType, TextEncoding};
    use crate::record::value::Value;

    #[derive(Default)]
    struct Row {
        wide: i64,
        view: i32,
        label: String,
    }

    impl Record for Row {
        fn fields() -> Vec<FieldSpec<Self>> {
            vec![
                FieldSpec::new(
                    "label",
                    SemanticType::Text,
                    |r: &Row| Some(r.label.clone().into()),
                    |r: &mut Row, v| {
                        r.label = v.try_into()?;
                        Ok(())
                    },
                )
                .order(1)
                .length(8)
                .encoding(TextEncoding::Ascii),
                FieldSpec::new(
                    "view",
                    SemanticType::Int32,
                    |r: &Row| Some(r.view.into()),
                    |r: &mut Row, v| {
                        r.view = v.try_into()?;
                        Ok(())
                    },
                )
                .overlay(0),
                FieldSpec::new(
                    "wide",
                    SemanticType::Int64,
                    |r: &Row| Some(r.wide.into()),
                    |r: &mut Row, v| {
                        r.wide = v.try_into()?;
                        Ok(())
                    },
                )
                .order(0),
            ]
        }
    }

    fn bytes_field(length: Option<usize>) -> FieldSpec<Row> {
        let spec = FieldSpec::new(
            "blob",
            SemanticType::ByteBuffer,
            |_: &Row| Some(Value::Bytes(Vec::new())),
            |_: &mut Row, _| Ok(()),
        )
        .order(0);
        match length {
            Some(n) => spec.length(n),
            None => spec,
        }
    }

    #[test]
    fn test_sequential_offsets_accumulate() {
        let layout = RecordLayout::<Row>::from_specs(Row::fields()).unwrap();
        assert_eq!(layout.record_size(), 16);
        let wide = layout.field("wide").unwrap();
        assert_eq!(wide.range(), 0..8);
        let label = layout.field("label").unwrap();
        assert_eq!(label.range(), 8..16);
    }

    #[test]
    fn test_overlay_does_not_count() {
        let layout = RecordLayout::<Row>::from_specs(Row::fields()).unwrap();
        let view = layout.field("view").unwrap();
        assert_eq!(view.range(), 0..4);
        assert_eq!(layout.overlay_fields().count(), 1);
        assert_eq!(layout.sequential_fields().count(), 2);
        assert_eq!(layout.max_width(), 8);
    }

    #[test]
    fn test_declared_length_overrides_default() {
        let spec = FieldSpec::new(
            "n",
            SemanticType::Int32,
            |_: &Row| Some(Value::Int32(0)),
            |_: &mut Row, _| Ok(()),
        )
        .order(0)
        .length(10);
        let layout = RecordLayout::from_specs(vec![spec]).unwrap();
        assert_eq!(layout.record_size(), 10);
    }

    #[test]
    fn test_missing_length_for_byte_buffer() {
        let err = RecordLayout::from_specs(vec![bytes_field(None)]).unwrap_err();
        assert!(matches!(err, FlfError::MissingLength { ref field, .. } if field == "blob"));
        assert!(RecordLayout::from_specs(vec![bytes_field(Some(2))]).is_ok());
    }

    #[test]
    fn test_overlay_only_is_empty() {
        let spec = FieldSpec::new(
            "v",
            SemanticType::Int32,
            |_: &Row| Some(Value::Int32(0)),
            |_: &mut Row, _| Ok(()),
        )
        .overlay(0);
        let err = RecordLayout::from_specs(vec![spec]).unwrap_err();
        assert!(matches!(err, FlfError::EmptyLayout));
    }

    #[test]
    fn test_oversized_length_is_rejected() {
        let err = RecordLayout::from_specs(vec![bytes_field(Some(usize::MAX))]).unwrap_err();
        assert!(matches!(err, FlfError::Argument(ref msg) if msg.contains("blob")));
        assert!(RecordLayout::from_specs(vec![bytes_field(Some(MAX_FIELD_WIDTH))]).is_ok());
    }

    #[test]
    fn test_overlay_end_past_u64_is_rejected() {
        let overlay = FieldSpec::new(
            "v",
            SemanticType::Int32,
            |_: &Row| Some(Value::Int32(0)),
            |_: &mut Row, _| Ok(()),
        )
        .overlay(u64::MAX);
        let err = RecordLayout::from_specs(vec![bytes_field(Some(4)), overlay]).unwrap_err();
        assert!(matches!(err, FlfError::Argument(ref msg) if msg.contains("'v'")));
    }

    #[test]
    fn test_layout_is_cached_per_type() {
        let a = RecordLayout::<Row>::of().unwrap();
        let b = RecordLayout::<Row>::of().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
