//! Composite decoder and per-field type dispatch.
//!
//! The [`CompositeDecoderBuilder`] configures which registry to use and the
//! safety limits. The [`CompositeDecoder`] then:
//! 1. Walks the payload into field slots
//! 2. Short-circuits NULL slots without invoking a decoder
//! 3. Resolves each slot's OID and converts its bytes
//!
//! Unsupported OIDs are recorded in the output as [`Value::Unsupported`];
//! truncated payloads and malformed values abort the whole decode.
//!
//! # Example
//!
//! ```
//! use pgcomposite::{decode_composite, Value};
//!
//! let payload = [0, 0, 0, 1, 0, 0, 0, 23, 0, 0, 0, 4, 0, 0, 0, 42];
//! let fields = decode_composite(&payload).unwrap();
//!
//! assert_eq!(fields[0].type_name, "int4");
//! assert_eq!(fields[0].value, Value::Int4(42));
//! ```

use std::iter::FusedIterator;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{CompositeError, Result};
use crate::protocol::{walk, FieldSlot, FrameWalker, DEFAULT_MAX_FIELDS};
use crate::report::FieldReport;
use crate::types::{default_registry, Capability, TypeRegistry, Value, UNSUPPORTED_MARKER};

/// Default maximum nesting of record fields.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// A decoded field of a composite value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedField {
    /// Position of the field within the composite.
    pub index: u32,
    /// Wire type identifier.
    pub oid: u32,
    /// Canonical type name, `"Unsupported"` for unknown OIDs.
    pub type_name: &'static str,
    /// Declared length, `None` for NULL.
    pub length: Option<u32>,
    /// Decoded value.
    pub value: Value,
}

/// Builder for configuring a [`CompositeDecoder`].
#[derive(Debug, Clone)]
pub struct CompositeDecoderBuilder {
    registry: Option<Arc<TypeRegistry>>,
    max_depth: usize,
    max_fields: u32,
}

impl CompositeDecoderBuilder {
    /// Create a new builder with default limits and the default registry.
    pub fn new() -> Self {
        Self {
            registry: None,
            max_depth: DEFAULT_MAX_DEPTH,
            max_fields: DEFAULT_MAX_FIELDS,
        }
    }

    /// Use a custom type registry.
    pub fn registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the maximum nesting of record fields.
    ///
    /// Default: 16
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the maximum accepted field count.
    ///
    /// Default: 1664
    pub fn max_fields(mut self, count: u32) -> Self {
        self.max_fields = count;
        self
    }

    /// Build the decoder.
    pub fn build(self) -> CompositeDecoder {
        CompositeDecoder {
            registry: self.registry.unwrap_or_else(default_registry),
            max_depth: self.max_depth,
            max_fields: self.max_fields,
        }
    }
}

impl Default for CompositeDecoderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoder for binary composite payloads.
///
/// Holds only read-only state; one instance can be shared between threads
/// and reused for any number of payloads.
#[derive(Debug, Clone)]
pub struct CompositeDecoder {
    registry: Arc<TypeRegistry>,
    max_depth: usize,
    max_fields: u32,
}

impl CompositeDecoder {
    /// Create a decoder with the default registry and limits.
    pub fn new() -> Self {
        CompositeDecoderBuilder::new().build()
    }

    /// Create a new decoder builder.
    pub fn builder() -> CompositeDecoderBuilder {
        CompositeDecoderBuilder::new()
    }

    /// Get the type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Decode every field of a payload.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; no partial result is returned.
    pub fn decode(&self, payload: &[u8]) -> Result<Vec<DecodedField>> {
        self.decode_at_depth(payload, 0)
    }

    /// Lazily decode a payload, pairing each field with its raw slot.
    ///
    /// The iterator ends after the first error.
    pub fn fields<'a>(&'a self, payload: &'a [u8]) -> Result<Fields<'a>> {
        Ok(Fields {
            decoder: self,
            walker: self.walker(payload)?,
            done: false,
        })
    }

    /// Decode a single walked slot.
    pub fn decode_slot(&self, slot: &FieldSlot<'_>) -> Result<DecodedField> {
        self.decode_slot_at_depth(slot, 0)
    }

    /// Decode one value by OID, `None` bytes meaning NULL.
    ///
    /// Errors are attributed to field 0.
    ///
    /// # Example
    ///
    /// ```
    /// use pgcomposite::{CompositeDecoder, Value};
    ///
    /// let decoder = CompositeDecoder::new();
    /// let (value, name) = decoder.decode_value(701, Some(&1.5f64.to_be_bytes()[..])).unwrap();
    /// assert_eq!(value, Value::Float8(1.5));
    /// assert_eq!(name, "float8");
    ///
    /// let (value, name) = decoder.decode_value(9999, Some(&b"x"[..])).unwrap();
    /// assert_eq!((value, name), (Value::Unsupported, "Unsupported"));
    /// ```
    pub fn decode_value(&self, oid: u32, bytes: Option<&[u8]>) -> Result<(Value, &'static str)> {
        self.dispatch(0, oid, bytes, 0)
    }

    fn walker<'a>(&self, payload: &'a [u8]) -> Result<FrameWalker<'a>> {
        let walker = walk(payload)?;
        if walker.field_count() > self.max_fields {
            return Err(CompositeError::TooManyFields {
                count: walker.field_count(),
                max: self.max_fields,
            });
        }
        Ok(walker)
    }

    fn decode_at_depth(&self, payload: &[u8], depth: usize) -> Result<Vec<DecodedField>> {
        let walker = self.walker(payload)?;
        let mut fields = Vec::with_capacity(walker.field_count().min(self.max_fields) as usize);
        for slot in walker {
            fields.push(self.decode_slot_at_depth(&slot?, depth)?);
        }
        Ok(fields)
    }

    fn decode_slot_at_depth(&self, slot: &FieldSlot<'_>, depth: usize) -> Result<DecodedField> {
        let (value, type_name) = self.dispatch(slot.index, slot.oid(), slot.value(), depth)?;
        Ok(DecodedField {
            index: slot.index,
            oid: slot.oid(),
            type_name,
            length: slot.length(),
            value,
        })
    }

    /// Resolve the OID and convert the bytes of one field.
    fn dispatch(
        &self,
        index: u32,
        oid: u32,
        bytes: Option<&[u8]>,
        depth: usize,
    ) -> Result<(Value, &'static str)> {
        let entry = self.registry.resolve(oid);

        let Some(bytes) = bytes else {
            tracing::trace!("Field {} (OID {}) is NULL", index, oid);
            let name = entry.map_or(UNSUPPORTED_MARKER, |e| e.name);
            return Ok((Value::Null, name));
        };

        let Some(entry) = entry else {
            tracing::debug!("Unsupported OID {} in field {}", oid, index);
            return Ok((Value::Unsupported, UNSUPPORTED_MARKER));
        };

        let value = match entry.capability {
            Capability::Scalar(decoder) => {
                decoder
                    .decode(bytes)
                    .map_err(|reason| CompositeError::MalformedValue {
                        field: index,
                        oid,
                        type_name: entry.name.to_string(),
                        reason,
                    })?
            }
            Capability::Composite => {
                let depth = depth + 1;
                let fields = if depth > self.max_depth {
                    Err(CompositeError::DepthLimit { depth })
                } else {
                    self.decode_at_depth(bytes, depth)
                };
                // Inner errors carry inner indices; tie them to this field.
                Value::Record(fields.map_err(|e| CompositeError::NestedRecord {
                    field: index,
                    inner: Box::new(e),
                })?)
            }
            Capability::NameOnly => {
                return Err(CompositeError::MissingBinaryDecoder {
                    field: index,
                    oid,
                    type_name: entry.name.to_string(),
                });
            }
        };

        Ok((value, entry.name))
    }
}

impl Default for CompositeDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy iterator over the decoded fields of one payload.
///
/// Created by [`CompositeDecoder::fields`].
#[derive(Debug)]
pub struct Fields<'a> {
    decoder: &'a CompositeDecoder,
    walker: FrameWalker<'a>,
    done: bool,
}

impl<'a> Fields<'a> {
    /// Declared number of fields.
    pub fn field_count(&self) -> u32 {
        self.walker.field_count()
    }
}

impl<'a> Iterator for Fields<'a> {
    type Item = Result<FieldReport<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let item = self.walker.next()?.and_then(|slot| {
            let field = self.decoder.decode_slot(&slot)?;
            Ok(FieldReport::new(slot, field))
        });

        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

impl FusedIterator for Fields<'_> {}

/// Decode a payload with the default registry (standalone function).
#[inline]
pub fn decode_composite(payload: &[u8]) -> Result<Vec<DecodedField>> {
    CompositeDecoder::new().decode(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::CompositeBuilder;
    use crate::types::{oid, Decoder};

    #[test]
    fn test_scenario_single_int4() {
        let payload = [0, 0, 0, 1, 0, 0, 0, 23, 0, 0, 0, 4, 0, 0, 0, 0x2A];
        let fields = decode_composite(&payload).unwrap();

        assert_eq!(
            fields,
            vec![DecodedField {
                index: 0,
                oid: 23,
                type_name: "int4",
                length: Some(4),
                value: Value::Int4(42),
            }]
        );
    }

    #[test]
    fn test_scenario_null_int4() {
        let payload = [0, 0, 0, 1, 0, 0, 0, 23, 0xFF, 0xFF, 0xFF, 0xFF];
        let fields = decode_composite(&payload).unwrap();

        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].value, Value::Null);
        assert_eq!(fields[0].type_name, "int4");
        assert_eq!(fields[0].length, None);
    }

    #[test]
    fn test_scenario_unsupported_then_int4() {
        let payload = [
            0, 0, 0, 2, // count
            0, 0, 0x27, 0x0F, 0, 0, 0, 3, 1, 2, 3, // OID 9999
            0, 0, 0, 23, 0, 0, 0, 4, 0, 0, 0, 1, // int4 1
        ];
        let fields = decode_composite(&payload).unwrap();

        assert_eq!(fields[0].oid, 9999);
        assert_eq!(fields[0].value, Value::Unsupported);
        assert_eq!(fields[0].type_name, "Unsupported");
        assert_eq!(fields[1].value, Value::Int4(1));
    }

    #[test]
    fn test_scenario_truncated_value() {
        let payload = [0, 0, 0, 1, 0, 0, 0, 23, 0, 0, 0, 4, 0, 0];
        let err = decode_composite(&payload).unwrap_err();
        assert!(matches!(
            err,
            CompositeError::TruncatedPayload { field: Some(0), .. }
        ));
    }

    #[test]
    fn test_null_of_unknown_type() {
        let payload = CompositeBuilder::new().null(9999).finish();
        let fields = decode_composite(&payload).unwrap();

        assert_eq!(fields[0].value, Value::Null);
        assert_eq!(fields[0].type_name, "Unsupported");
    }

    #[test]
    fn test_zero_length_invokes_decoder() {
        let payload = CompositeBuilder::new()
            .field(oid::TEXT, &[])
            .field(oid::INT4, &[])
            .finish();

        // Text accepts an empty span, int4 rejects it.
        let decoder = CompositeDecoder::new();
        let mut fields = decoder.fields(&payload).unwrap();
        let first = fields.next().unwrap().unwrap();
        assert_eq!(first.field.value, Value::Text(String::new()));
        assert_eq!(first.field.length, Some(0));

        let err = fields.next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            CompositeError::MalformedValue { field: 1, oid: 23, .. }
        ));
        assert!(fields.next().is_none());
    }

    #[test]
    fn test_malformed_value_is_fatal() {
        let payload = CompositeBuilder::new()
            .field(oid::INT4, &[0, 0, 0, 1])
            .field(oid::FLOAT8, &[0, 0, 0, 0])
            .finish();
        let err = decode_composite(&payload).unwrap_err();

        assert_eq!(err.field(), Some(1));
        assert!(err.to_string().contains("float8"));
    }

    #[test]
    fn test_name_only_type() {
        let mut registry = TypeRegistry::with_defaults();
        registry.register_name_only(oid::NUMERIC, "numeric");
        let decoder = CompositeDecoder::builder()
            .registry(Arc::new(registry))
            .build();

        let null = CompositeBuilder::new().null(oid::NUMERIC).finish();
        let fields = decoder.decode(&null).unwrap();
        assert_eq!(fields[0].type_name, "numeric");
        assert_eq!(fields[0].value, Value::Null);

        let present = CompositeBuilder::new().field(oid::NUMERIC, &[0; 8]).finish();
        let err = decoder.decode(&present).unwrap_err();
        assert!(matches!(
            err,
            CompositeError::MissingBinaryDecoder { field: 0, oid: 1700, .. }
        ));
    }

    #[test]
    fn test_custom_registry_entry() {
        let mut registry = TypeRegistry::new();
        registry.register(16_384, "tiny_flag", Decoder::Bool);
        let decoder = CompositeDecoder::builder()
            .registry(Arc::new(registry))
            .build();

        let payload = CompositeBuilder::new()
            .field(16_384, &[1])
            .field(oid::INT4, &[0, 0, 0, 1])
            .finish();
        let fields = decoder.decode(&payload).unwrap();

        assert_eq!(fields[0].value, Value::Bool(true));
        assert_eq!(fields[0].type_name, "tiny_flag");
        // Not in this registry.
        assert_eq!(fields[1].value, Value::Unsupported);
    }

    #[test]
    fn test_nested_record() {
        let inner = CompositeBuilder::new()
            .field(oid::TEXT, b"foo")
            .null(oid::INT4)
            .finish();
        let payload = CompositeBuilder::new()
            .field(oid::INT4, &7i32.to_be_bytes())
            .field(oid::RECORD, &inner)
            .finish();

        let fields = decode_composite(&payload).unwrap();
        assert_eq!(fields[1].type_name, "record");

        let Value::Record(inner_fields) = &fields[1].value else {
            panic!("expected record, got {:?}", fields[1].value);
        };
        assert_eq!(inner_fields.len(), 2);
        assert_eq!(inner_fields[0].value, Value::Text("foo".to_string()));
        assert_eq!(inner_fields[1].value, Value::Null);
        assert_eq!(fields[1].value.to_string(), "(foo,(NULL))");
    }

    #[test]
    fn test_nested_depth_limit() {
        let mut payload = CompositeBuilder::new().finish();
        for _ in 0..3 {
            payload = CompositeBuilder::new().field(oid::RECORD, &payload).finish();
        }

        let shallow = CompositeDecoder::builder().max_depth(2).build();
        let err = shallow.decode(&payload).unwrap_err();
        assert!(matches!(
            err.innermost(),
            CompositeError::DepthLimit { depth: 3 }
        ));
        assert_eq!(err.field_path(), vec![0, 0, 0]);

        let deep = CompositeDecoder::builder().max_depth(3).build();
        assert!(deep.decode(&payload).is_ok());
    }

    #[test]
    fn test_nested_error_names_outer_field() {
        let inner = CompositeBuilder::new()
            .field(oid::INT4, &[0, 0, 1])
            .finish();
        let payload = CompositeBuilder::new()
            .field(oid::INT4, &1i32.to_be_bytes())
            .field(oid::RECORD, &inner)
            .finish();

        let err = decode_composite(&payload).unwrap_err();

        assert_eq!(err.field(), Some(1));
        assert_eq!(err.field_path(), vec![1, 0]);
        assert!(matches!(
            err.innermost(),
            CompositeError::MalformedValue { field: 0, oid: 23, .. }
        ));
        assert!(err.to_string().starts_with("Nested record in field 1: "));
        assert!(!err.is_framing());
    }

    #[test]
    fn test_truncated_nested_record_is_framing() {
        let payload = CompositeBuilder::new()
            .null(oid::TEXT)
            .field(oid::RECORD, &[0, 0, 0, 1, 0, 0])
            .finish();

        let err = decode_composite(&payload).unwrap_err();
        assert_eq!(err.field(), Some(1));
        assert!(err.is_framing());
    }

    #[test]
    fn test_default_accepts_widest_row() {
        let mut builder = CompositeBuilder::new();
        for _ in 0..1650 {
            builder.push_field(oid::INT4, None);
        }
        let fields = decode_composite(&builder.finish()).unwrap();
        assert_eq!(fields.len(), 1650);

        let mut builder = CompositeBuilder::new();
        for _ in 0..DEFAULT_MAX_FIELDS {
            builder.push_field(oid::INT4, None);
        }
        assert!(decode_composite(&builder.finish()).is_ok());

        builder = CompositeBuilder::new();
        for _ in 0..=DEFAULT_MAX_FIELDS {
            builder.push_field(oid::INT4, None);
        }
        assert!(matches!(
            decode_composite(&builder.finish()).unwrap_err(),
            CompositeError::TooManyFields { count: 1665, max: 1664 }
        ));
    }

    #[test]
    fn test_too_many_fields() {
        let payload = CompositeBuilder::new()
            .null(oid::INT4)
            .null(oid::INT4)
            .null(oid::INT4)
            .finish();
        let decoder = CompositeDecoder::builder().max_fields(2).build();

        assert!(matches!(
            decoder.decode(&payload).unwrap_err(),
            CompositeError::TooManyFields { count: 3, max: 2 }
        ));
    }

    #[test]
    fn test_decode_value_standalone() {
        let decoder = CompositeDecoder::new();

        let (value, name) = decoder.decode_value(oid::INT4, None).unwrap();
        assert_eq!((value, name), (Value::Null, "int4"));

        let err = decoder.decode_value(oid::INT4, Some(&[1u8][..])).unwrap_err();
        assert_eq!(err.field(), Some(0));
    }

    #[test]
    fn test_fields_count() {
        let payload = CompositeBuilder::new().null(oid::INT4).finish();
        let decoder = CompositeDecoder::new();
        let fields = decoder.fields(&payload).unwrap();
        assert_eq!(fields.field_count(), 1);
        assert_eq!(fields.count(), 1);
    }
}
