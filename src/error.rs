//! Error types for pgcomposite.

use thiserror::Error;

/// Main error type for all composite decoding operations.
///
/// Every variant here is fatal for the payload being decoded. Unsupported
/// type identifiers and NULL fields are not errors; they show up as
/// [`Value::Unsupported`](crate::types::Value::Unsupported) and
/// [`Value::Null`](crate::types::Value::Null) in the decoded output.
#[derive(Debug, Error)]
pub enum CompositeError {
    /// A header or value read would run past the end of the payload.
    ///
    /// `field` is `None` when the leading field count itself is cut short.
    #[error(
        "Truncated payload{}: need {needed} bytes at offset {offset}, {available} available",
        field_suffix(.field)
    )]
    TruncatedPayload {
        field: Option<u32>,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Bytes left over after the last declared field.
    #[error("Trailing bytes: consumed {consumed} of {len} payload bytes")]
    TrailingBytes { consumed: usize, len: usize },

    /// The leading field count exceeds the configured limit.
    #[error("Field count {count} exceeds maximum {max}")]
    TooManyFields { count: u32, max: u32 },

    /// Value bytes do not match the encoding of the resolved type.
    #[error("Malformed {type_name} value (OID {oid}) in field {field}: {reason}")]
    MalformedValue {
        field: u32,
        oid: u32,
        type_name: String,
        reason: ValueError,
    },

    /// The type is registered but has no binary conversion.
    #[error("Type {type_name} (OID {oid}) in field {field} has no binary decoder")]
    MissingBinaryDecoder {
        field: u32,
        oid: u32,
        type_name: String,
    },

    /// Nested records exceed the configured depth.
    #[error("Nested record depth {depth} exceeds maximum")]
    DepthLimit { depth: usize },

    /// A nested record field failed to decode.
    ///
    /// `field` is the index of the record within the enclosing composite;
    /// `inner` carries the failure reported by the record's own fields.
    #[error("Nested record in field {field}: {inner}")]
    NestedRecord {
        field: u32,
        inner: Box<CompositeError>,
    },

    /// The query produced no rows.
    #[error("Query returned no rows")]
    NoRows,

    /// Connection or query failure from the database driver.
    #[error("Database error: {0}")]
    Collaborator(#[from] tokio_postgres::Error),

    /// I/O error while writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn field_suffix(field: &Option<u32>) -> String {
    match field {
        Some(i) => format!(" in field {}", i),
        None => String::new(),
    }
}

/// Failure converting a single value span into a typed value.
#[derive(Debug, Error, PartialEq)]
pub enum ValueError {
    /// Fixed-width type received the wrong number of bytes.
    #[error("expected {expected} bytes, got {actual}")]
    WrongWidth { expected: usize, actual: usize },

    /// Textual type received bytes that are not UTF-8.
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Boolean byte other than 0 or 1.
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),

    /// Unknown jsonb format version byte.
    #[error("unsupported jsonb version {0}")]
    JsonbVersion(u8),

    /// jsonb value without its version byte.
    #[error("empty jsonb value")]
    EmptyJsonb,
}

impl CompositeError {
    /// Index of the top-level field the error occurred at, if it is tied to one.
    pub fn field(&self) -> Option<u32> {
        match self {
            CompositeError::TruncatedPayload { field, .. } => *field,
            CompositeError::MalformedValue { field, .. }
            | CompositeError::MissingBinaryDecoder { field, .. }
            | CompositeError::NestedRecord { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// Field indices from the top-level composite down to the failing field.
    ///
    /// Empty when the error is not tied to a field.
    pub fn field_path(&self) -> Vec<u32> {
        let mut path = Vec::new();
        let mut err = self;
        while let CompositeError::NestedRecord { field, inner } = err {
            path.push(*field);
            err = inner.as_ref();
        }
        path.extend(err.field());
        path
    }

    /// The error underneath any nested record wrappers.
    pub fn innermost(&self) -> &CompositeError {
        match self {
            CompositeError::NestedRecord { inner, .. } => inner.innermost(),
            other => other,
        }
    }

    /// Whether this error comes from the payload layout rather than a value.
    ///
    /// Nested record failures are classified by their innermost error.
    pub fn is_framing(&self) -> bool {
        matches!(
            self.innermost(),
            CompositeError::TruncatedPayload { .. }
                | CompositeError::TrailingBytes { .. }
                | CompositeError::TooManyFields { .. }
        )
    }
}

/// Result type alias using CompositeError.
pub type Result<T> = std::result::Result<T, CompositeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_message_names_field() {
        let err = CompositeError::TruncatedPayload {
            field: Some(2),
            offset: 20,
            needed: 4,
            available: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("in field 2"));
        assert!(msg.contains("need 4 bytes at offset 20"));
        assert_eq!(err.field(), Some(2));
        assert!(err.is_framing());
    }

    #[test]
    fn test_truncated_count_has_no_field() {
        let err = CompositeError::TruncatedPayload {
            field: None,
            offset: 0,
            needed: 4,
            available: 2,
        };
        assert!(!err.to_string().contains("in field"));
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_malformed_value_message() {
        let err = CompositeError::MalformedValue {
            field: 1,
            oid: 23,
            type_name: "int4".to_string(),
            reason: ValueError::WrongWidth {
                expected: 4,
                actual: 3,
            },
        };
        assert_eq!(
            err.to_string(),
            "Malformed int4 value (OID 23) in field 1: expected 4 bytes, got 3"
        );
        assert!(!err.is_framing());
    }

    #[test]
    fn test_nested_record_reports_outer_field() {
        let err = CompositeError::NestedRecord {
            field: 3,
            inner: Box::new(CompositeError::NestedRecord {
                field: 1,
                inner: Box::new(CompositeError::TruncatedPayload {
                    field: Some(0),
                    offset: 12,
                    needed: 4,
                    available: 2,
                }),
            }),
        };

        assert_eq!(err.field(), Some(3));
        assert_eq!(err.field_path(), vec![3, 1, 0]);
        assert!(matches!(
            err.innermost(),
            CompositeError::TruncatedPayload { field: Some(0), .. }
        ));
        assert!(err.is_framing());
        assert!(err
            .to_string()
            .starts_with("Nested record in field 3: Nested record in field 1: Truncated payload in field 0"));
    }
}
