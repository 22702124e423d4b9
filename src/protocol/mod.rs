//! Protocol module - composite wire format, slots, and the frame walker.
//!
//! This module implements the binary layout of an anonymous composite value:
//! - Field count and slot header encoding/decoding
//! - Borrowed field slots and a payload builder
//! - The walker that splits a payload into slots

mod slot;
mod walker;
mod wire_format;

pub use slot::{CompositeBuilder, FieldSlot};
pub use walker::{walk, walk_all, FrameWalker};
pub use wire_format::{
    decode_field_count, encode_field_count, SlotHeader, DEFAULT_MAX_FIELDS, FIELD_COUNT_SIZE,
    NULL_LENGTH, SLOT_HEADER_SIZE,
};
