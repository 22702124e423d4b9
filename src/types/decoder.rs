//! Per-type binary conversions.
//!
//! Fixed-width types check the exact byte count before interpreting the
//! span and fail rather than guess when it does not match.

use super::Value;
use crate::error::ValueError;

/// jsonb binary format version understood by [`Decoder::Jsonb`].
pub const JSONB_VERSION: u8 = 1;

/// Binary conversion for one scalar wire type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    Bool,
    Bytea,
    Char,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Oid,
    Text,
    Json,
    Jsonb,
    Uuid,
    /// 4-byte day count.
    Date,
    /// 8-byte microsecond count, no zone.
    Timestamp,
    /// 8-byte microsecond count in UTC.
    TimestampTz,
}

impl Decoder {
    /// Convert a value span into a typed value.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes do not match the encoding of this type.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value, ValueError> {
        let value = match self {
            Decoder::Bool => match fixed::<1>(bytes)? {
                [0] => Value::Bool(false),
                [1] => Value::Bool(true),
                [b] => return Err(ValueError::InvalidBool(b)),
            },
            Decoder::Bytea => Value::Bytea(bytes.to_vec()),
            Decoder::Char => Value::Char(fixed::<1>(bytes)?[0]),
            Decoder::Int2 => Value::Int2(i16::from_be_bytes(fixed(bytes)?)),
            Decoder::Int4 => Value::Int4(i32::from_be_bytes(fixed(bytes)?)),
            Decoder::Int8 => Value::Int8(i64::from_be_bytes(fixed(bytes)?)),
            Decoder::Float4 => Value::Float4(f32::from_be_bytes(fixed(bytes)?)),
            Decoder::Float8 => Value::Float8(f64::from_be_bytes(fixed(bytes)?)),
            Decoder::Oid => Value::Oid(u32::from_be_bytes(fixed(bytes)?)),
            Decoder::Text => Value::Text(std::str::from_utf8(bytes)?.to_string()),
            Decoder::Json => Value::Json(std::str::from_utf8(bytes)?.to_string()),
            Decoder::Jsonb => {
                let (&version, rest) = bytes.split_first().ok_or(ValueError::EmptyJsonb)?;
                if version != JSONB_VERSION {
                    return Err(ValueError::JsonbVersion(version));
                }
                Value::Json(std::str::from_utf8(rest)?.to_string())
            }
            Decoder::Uuid => Value::Uuid(fixed(bytes)?),
            Decoder::Date => Value::Date(i32::from_be_bytes(fixed(bytes)?)),
            Decoder::Timestamp => Value::Timestamp(i64::from_be_bytes(fixed(bytes)?)),
            Decoder::TimestampTz => Value::TimestampTz(i64::from_be_bytes(fixed(bytes)?)),
        };
        Ok(value)
    }

    /// Exact byte width for fixed-width types.
    pub fn width(&self) -> Option<usize> {
        match self {
            Decoder::Bool | Decoder::Char => Some(1),
            Decoder::Int2 => Some(2),
            Decoder::Int4 | Decoder::Float4 | Decoder::Oid | Decoder::Date => Some(4),
            Decoder::Int8 | Decoder::Float8 | Decoder::Timestamp | Decoder::TimestampTz => {
                Some(8)
            }
            Decoder::Uuid => Some(16),
            Decoder::Bytea | Decoder::Text | Decoder::Json | Decoder::Jsonb => None,
        }
    }
}

#[inline]
fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], ValueError> {
    bytes.try_into().map_err(|_| ValueError::WrongWidth {
        expected: N,
        actual: bytes.len(),
    })
}
