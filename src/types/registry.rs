//! Type registry mapping wire type identifiers to decoders.
//!
//! The registry is filled once at startup and only read afterwards. The
//! process-wide default lives behind [`default_registry`]; callers that need
//! extra types build their own from [`TypeRegistry::with_defaults`].
//!
//! # Example
//!
//! ```
//! use pgcomposite::types::{oid, Decoder, TypeRegistry};
//!
//! let mut registry = TypeRegistry::with_defaults();
//! registry.register(16_384, "my_flag", Decoder::Bool);
//! registry.register_name_only(oid::NUMERIC, "numeric");
//!
//! assert_eq!(registry.type_name(oid::INT4), Some("int4"));
//! assert_eq!(registry.type_name(16_384), Some("my_flag"));
//! assert!(registry.resolve(9999).is_none());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::Decoder;

/// Wire type identifiers of built-in types.
pub mod oid {
    pub const BOOL: u32 = 16;
    pub const BYTEA: u32 = 17;
    pub const CHAR: u32 = 18;
    pub const NAME: u32 = 19;
    pub const INT8: u32 = 20;
    pub const INT2: u32 = 21;
    pub const INT4: u32 = 23;
    pub const TEXT: u32 = 25;
    pub const OID: u32 = 26;
    pub const JSON: u32 = 114;
    pub const FLOAT4: u32 = 700;
    pub const FLOAT8: u32 = 701;
    pub const UNKNOWN: u32 = 705;
    pub const BPCHAR: u32 = 1042;
    pub const VARCHAR: u32 = 1043;
    pub const DATE: u32 = 1082;
    pub const TIMESTAMP: u32 = 1114;
    pub const TIMESTAMPTZ: u32 = 1184;
    pub const NUMERIC: u32 = 1700;
    pub const RECORD: u32 = 2249;
    pub const UUID: u32 = 2950;
    pub const JSONB: u32 = 3802;
}

/// How values of a registered type are converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Scalar binary conversion.
    Scalar(Decoder),
    /// Nested anonymous composite, decoded recursively.
    Composite,
    /// Known by name only; non-NULL values cannot be decoded.
    NameOnly,
}

/// Entry for a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeEntry {
    /// Wire type identifier.
    pub oid: u32,
    /// Canonical type name.
    pub name: &'static str,
    /// Conversion capability.
    pub capability: Capability,
}

/// Registry mapping wire type identifiers to type entries.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: HashMap<u32, TypeEntry>,
}

impl TypeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in decoder.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(oid::BOOL, "bool", Decoder::Bool);
        registry.register(oid::BYTEA, "bytea", Decoder::Bytea);
        registry.register(oid::CHAR, "char", Decoder::Char);
        registry.register(oid::NAME, "name", Decoder::Text);
        registry.register(oid::INT8, "int8", Decoder::Int8);
        registry.register(oid::INT2, "int2", Decoder::Int2);
        registry.register(oid::INT4, "int4", Decoder::Int4);
        registry.register(oid::TEXT, "text", Decoder::Text);
        registry.register(oid::OID, "oid", Decoder::Oid);
        registry.register(oid::JSON, "json", Decoder::Json);
        registry.register(oid::FLOAT4, "float4", Decoder::Float4);
        registry.register(oid::FLOAT8, "float8", Decoder::Float8);
        registry.register(oid::UNKNOWN, "unknown", Decoder::Text);
        registry.register(oid::BPCHAR, "bpchar", Decoder::Text);
        registry.register(oid::VARCHAR, "varchar", Decoder::Text);
        registry.register(oid::DATE, "date", Decoder::Date);
        registry.register(oid::TIMESTAMP, "timestamp", Decoder::Timestamp);
        registry.register(oid::TIMESTAMPTZ, "timestamptz", Decoder::TimestampTz);
        registry.register(oid::UUID, "uuid", Decoder::Uuid);
        registry.register(oid::JSONB, "jsonb", Decoder::Jsonb);
        registry.register_composite(oid::RECORD, "record");

        registry
    }

    /// Register a type with a scalar decoder.
    ///
    /// Replaces any existing entry for the same OID.
    pub fn register(&mut self, oid: u32, name: &'static str, decoder: Decoder) {
        self.insert(oid, name, Capability::Scalar(decoder));
    }

    /// Register a type decoded as a nested composite.
    pub fn register_composite(&mut self, oid: u32, name: &'static str) {
        self.insert(oid, name, Capability::Composite);
    }

    /// Register a type by name without a binary decoder.
    ///
    /// NULLs of this type carry its name; present values fail to decode.
    pub fn register_name_only(&mut self, oid: u32, name: &'static str) {
        self.insert(oid, name, Capability::NameOnly);
    }

    fn insert(&mut self, oid: u32, name: &'static str, capability: Capability) {
        self.entries.insert(
            oid,
            TypeEntry {
                oid,
                name,
                capability,
            },
        );
    }

    /// Resolve a wire type identifier.
    #[inline]
    pub fn resolve(&self, oid: u32) -> Option<&TypeEntry> {
        self.entries.get(&oid)
    }

    /// Get the canonical type name for an OID.
    pub fn type_name(&self, oid: u32) -> Option<&'static str> {
        self.resolve(oid).map(|e| e.name)
    }

    /// Check if an OID is registered.
    pub fn contains(&self, oid: u32) -> bool {
        self.entries.contains_key(&oid)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The shared, read-only registry holding the built-in decoders.
pub fn default_registry() -> Arc<TypeRegistry> {
    static DEFAULT: OnceLock<Arc<TypeRegistry>> = OnceLock::new();
    DEFAULT
        .get_or_init(|| Arc::new(TypeRegistry::with_defaults()))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_core_types() {
        let registry = TypeRegistry::with_defaults();

        let int4 = registry.resolve(oid::INT4).unwrap();
        assert_eq!(int4.name, "int4");
        assert_eq!(int4.capability, Capability::Scalar(Decoder::Int4));

        assert_eq!(registry.type_name(oid::FLOAT8), Some("float8"));
        assert_eq!(registry.type_name(oid::TEXT), Some("text"));
        assert_eq!(
            registry.resolve(oid::TIMESTAMPTZ).unwrap().capability,
            Capability::Scalar(Decoder::TimestampTz)
        );
        assert_eq!(registry.type_name(oid::DATE), Some("date"));
        assert_eq!(
            registry.resolve(oid::RECORD).unwrap().capability,
            Capability::Composite
        );
    }

    #[test]
    fn test_unknown_oid_not_found() {
        let registry = TypeRegistry::with_defaults();
        assert!(registry.resolve(9999).is_none());
        assert!(registry.type_name(9999).is_none());
        // numeric has no binary decoder yet.
        assert!(!registry.contains(oid::NUMERIC));
    }

    #[test]
    fn test_register_replaces_entry() {
        let mut registry = TypeRegistry::new();
        assert!(registry.is_empty());

        registry.register(oid::TEXT, "text", Decoder::Text);
        registry.register(oid::TEXT, "bytes", Decoder::Bytea);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.type_name(oid::TEXT), Some("bytes"));
    }

    #[test]
    fn test_register_name_only() {
        let mut registry = TypeRegistry::new();
        registry.register_name_only(oid::NUMERIC, "numeric");

        let entry = registry.resolve(oid::NUMERIC).unwrap();
        assert_eq!(entry.capability, Capability::NameOnly);
        assert_eq!(entry.oid, oid::NUMERIC);
    }

    #[test]
    fn test_default_registry_is_shared() {
        let a = default_registry();
        let b = default_registry();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.contains(oid::INT4));
    }
}
