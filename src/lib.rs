//! # pgcomposite
//!
//! Decoder for the binary wire encoding of anonymous composite (row) values
//! sent by PostgreSQL.
//!
//! A composite payload carries its own field count and, per field, a type
//! OID and a length, so it can be decoded without any external schema.
//!
//! ## Architecture
//!
//! - **Frame walker** ([`protocol`]): splits the payload into borrowed field slots
//! - **Type registry** ([`types`]): maps OIDs to canonical names and decoders
//! - **Dispatcher** ([`CompositeDecoder`]): turns each slot into a typed [`Value`]
//!
//! ## Example
//!
//! ```
//! use pgcomposite::protocol::CompositeBuilder;
//! use pgcomposite::{decode_composite, Value};
//!
//! let payload = CompositeBuilder::new()
//!     .field(23, &42i32.to_be_bytes())
//!     .field(25, b"foo")
//!     .null(701)
//!     .finish();
//!
//! let fields = decode_composite(&payload).unwrap();
//! assert_eq!(fields[0].value, Value::Int4(42));
//! assert_eq!(fields[1].value, Value::Text("foo".to_string()));
//! assert_eq!(fields[2].value, Value::Null);
//! assert_eq!(fields[2].type_name, "float8");
//! ```

pub mod error;
pub mod protocol;
pub mod report;
pub mod source;
pub mod types;

mod decode;

pub use decode::{
    decode_composite, CompositeDecoder, CompositeDecoderBuilder, DecodedField, Fields,
    DEFAULT_MAX_DEPTH,
};
pub use error::{CompositeError, ValueError};
pub use report::FieldReport;
pub use types::{TypeRegistry, Value};
