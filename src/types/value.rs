//! Typed values produced by the decoders.
//!
//! [`Value`] is a closed sum type: every consumer has to handle NULL and
//! unsupported fields explicitly.

use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::decode::DecodedField;
use crate::protocol::CompositeBuilder;

/// Rendering of a NULL field.
pub const NULL_MARKER: &str = "(NULL)";

/// Rendering of a field whose type has no registry entry.
pub const UNSUPPORTED_MARKER: &str = "Unsupported";

/// Seconds from the Unix epoch to 2000-01-01, the zero point of dates and
/// timestamps on the wire.
const PG_EPOCH_UNIX_SECS: i64 = 946_684_800;

const MICROS_PER_SEC: i64 = 1_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SEC;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Bytea(Vec<u8>),
    /// Single-byte `"char"`.
    Char(u8),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Oid(u32),
    /// text, varchar, bpchar, name and unknown.
    Text(String),
    /// json and jsonb, kept as JSON text.
    Json(String),
    Uuid([u8; 16]),
    /// Days since 2000-01-01.
    Date(i32),
    /// Microseconds since 2000-01-01 00:00:00.
    Timestamp(i64),
    /// Microseconds since 2000-01-01 00:00:00 UTC.
    TimestampTz(i64),
    /// Nested anonymous composite.
    Record(Vec<DecodedField>),
    /// The field is absent.
    Null,
    /// No decoder is registered for the field's type.
    Unsupported,
}

impl Value {
    /// Check if this is a NULL.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this field's type is unsupported.
    #[inline]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Value::Unsupported)
    }

    /// Get the integer value of any integer variant, widened to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int2(v) => Some(i64::from(*v)),
            Value::Int4(v) => Some(i64::from(*v)),
            Value::Int8(v) => Some(*v),
            Value::Oid(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Get the value of any floating point variant, widened to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float4(v) => Some(f64::from(*v)),
            Value::Float8(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the string content of text and json values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Json(s) => Some(s),
            _ => None,
        }
    }

    /// Encode the value in its binary wire form.
    ///
    /// Returns `None` for `Null` and `Unsupported`, which have no value bytes.
    /// `Json` is encoded as plain json text; prefix it with a version byte
    /// when sending it as jsonb.
    pub fn encode_binary(&self) -> Option<Vec<u8>> {
        let bytes = match self {
            Value::Bool(v) => vec![u8::from(*v)],
            Value::Bytea(v) => v.clone(),
            Value::Char(v) => vec![*v],
            Value::Int2(v) => v.to_be_bytes().to_vec(),
            Value::Int4(v) => v.to_be_bytes().to_vec(),
            Value::Int8(v) => v.to_be_bytes().to_vec(),
            Value::Float4(v) => v.to_be_bytes().to_vec(),
            Value::Float8(v) => v.to_be_bytes().to_vec(),
            Value::Oid(v) => v.to_be_bytes().to_vec(),
            Value::Text(s) | Value::Json(s) => s.as_bytes().to_vec(),
            Value::Uuid(v) => v.to_vec(),
            Value::Date(v) => v.to_be_bytes().to_vec(),
            Value::Timestamp(v) | Value::TimestampTz(v) => v.to_be_bytes().to_vec(),
            Value::Record(fields) => {
                let mut builder = CompositeBuilder::new();
                for field in fields {
                    let bytes = field.value.encode_binary();
                    builder.push_field(field.oid, bytes.as_deref());
                }
                builder.finish().to_vec()
            }
            Value::Null | Value::Unsupported => return None,
        };
        Some(bytes)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Bytea(v) => {
                f.write_str("\\x")?;
                for b in v {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            Value::Char(v) => write!(f, "{}", char::from(*v)),
            Value::Int2(v) => write!(f, "{}", v),
            Value::Int4(v) => write!(f, "{}", v),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Float4(v) => write_float(f, f64::from(*v), v),
            Value::Float8(v) => write_float(f, *v, v),
            Value::Oid(v) => write!(f, "{}", v),
            // A string equal to the NULL marker is quoted so it can't pass for NULL.
            Value::Text(s) | Value::Json(s) if s == NULL_MARKER => write!(f, "\"{}\"", s),
            Value::Text(s) | Value::Json(s) => f.write_str(s),
            Value::Uuid(v) => write_uuid(f, v),
            Value::Date(v) => write_date(f, *v),
            Value::Timestamp(v) => write_timestamp(f, *v, ""),
            Value::TimestampTz(v) => write_timestamp(f, *v, "+00"),
            Value::Record(fields) => {
                f.write_str("(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", field.value)?;
                }
                f.write_str(")")
            }
            Value::Null => f.write_str(NULL_MARKER),
            Value::Unsupported => f.write_str(UNSUPPORTED_MARKER),
        }
    }
}

/// Name of a non-finite float as the database prints it.
fn non_finite_name(v: f64) -> Option<&'static str> {
    if v.is_nan() {
        Some("NaN")
    } else if v == f64::INFINITY {
        Some("Infinity")
    } else if v == f64::NEG_INFINITY {
        Some("-Infinity")
    } else {
        None
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, wide: f64, v: &dyn fmt::Display) -> fmt::Result {
    match non_finite_name(wide) {
        Some(name) => f.write_str(name),
        None => write!(f, "{}", v),
    }
}

/// Calendar time of a microsecond offset from 2000-01-01.
fn datetime(micros: i64) -> Option<NaiveDateTime> {
    let secs = micros
        .div_euclid(MICROS_PER_SEC)
        .checked_add(PG_EPOCH_UNIX_SECS)?;
    let nanos = (micros.rem_euclid(MICROS_PER_SEC) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
}

// i32::MAX/MIN and i64::MAX/MIN encode +/-infinity. Values outside the
// calendar range render as their raw count.
fn write_date(f: &mut fmt::Formatter<'_>, days: i32) -> fmt::Result {
    match days {
        i32::MAX => return f.write_str("infinity"),
        i32::MIN => return f.write_str("-infinity"),
        _ => {}
    }
    match i64::from(days).checked_mul(MICROS_PER_DAY).and_then(datetime) {
        Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d")),
        None => write!(f, "{}", days),
    }
}

fn write_timestamp(f: &mut fmt::Formatter<'_>, micros: i64, zone: &str) -> fmt::Result {
    match micros {
        i64::MAX => return f.write_str("infinity"),
        i64::MIN => return f.write_str("-infinity"),
        _ => {}
    }
    let Some(dt) = datetime(micros) else {
        return write!(f, "{}", micros);
    };
    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))?;
    let frac = micros.rem_euclid(MICROS_PER_SEC);
    if frac != 0 {
        let digits = format!("{:06}", frac);
        write!(f, ".{}", digits.trim_end_matches('0'))?;
    }
    f.write_str(zone)
}

fn write_uuid(f: &mut fmt::Formatter<'_>, bytes: &[u8; 16]) -> fmt::Result {
    for (i, b) in bytes.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            f.write_str("-")?;
        }
        write!(f, "{:02x}", b)?;
    }
    Ok(())
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int2(v) => serializer.serialize_i16(*v),
            Value::Int4(v) => serializer.serialize_i32(*v),
            Value::Int8(v) => serializer.serialize_i64(*v),
            // JSON numbers can't hold NaN or infinities; name them instead of
            // letting them collapse into null.
            Value::Float4(v) => match non_finite_name(f64::from(*v)) {
                Some(name) => serializer.serialize_str(name),
                None => serializer.serialize_f32(*v),
            },
            Value::Float8(v) => match non_finite_name(*v) {
                Some(name) => serializer.serialize_str(name),
                None => serializer.serialize_f64(*v),
            },
            Value::Oid(v) => serializer.serialize_u32(*v),
            Value::Text(s) | Value::Json(s) => serializer.serialize_str(s),
            Value::Bytea(_)
            | Value::Char(_)
            | Value::Uuid(_)
            | Value::Date(_)
            | Value::Timestamp(_)
            | Value::TimestampTz(_) => serializer.collect_str(self),
            Value::Record(fields) => {
                let mut seq = serializer.serialize_seq(Some(fields.len()))?;
                for field in fields {
                    seq.serialize_element(field)?;
                }
                seq.end()
            }
            Value::Null => serializer.serialize_none(),
            Value::Unsupported => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("unsupported", &true)?;
                map.end()
            }
        }
    }
}
