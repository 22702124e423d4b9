//! Types module - typed values, decoders and the type registry.
//!
//! - [`Value`] - closed set of decoded values, including NULL and unsupported
//! - [`Decoder`] - binary conversion for one scalar wire type
//! - [`TypeRegistry`] - maps wire type identifiers to names and decoders

mod decoder;
mod registry;
mod value;

pub use decoder::{Decoder, JSONB_VERSION};
pub use registry::{default_registry, oid, Capability, TypeEntry, TypeRegistry};
pub use value::{Value, NULL_MARKER, UNSUPPORTED_MARKER};
