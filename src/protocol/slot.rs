//! Field slots and the payload builder.
//!
//! A [`FieldSlot`] is a borrowed view into a composite payload: it never owns
//! its bytes and cannot outlive the buffer it was walked from.
//!
//! # Example
//!
//! ```
//! use pgcomposite::protocol::{walk, CompositeBuilder};
//!
//! let payload = CompositeBuilder::new()
//!     .field(23, &42i32.to_be_bytes())
//!     .null(25)
//!     .finish();
//!
//! let slots: Vec<_> = walk(&payload).unwrap().collect::<Result<_, _>>().unwrap();
//! assert_eq!(slots[0].value(), Some(&[0, 0, 0, 42][..]));
//! assert!(slots[1].is_null());
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::wire_format::{SlotHeader, FIELD_COUNT_SIZE, NULL_LENGTH, SLOT_HEADER_SIZE};

/// One field of a composite payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot<'a> {
    /// Position of the field within the composite.
    pub index: u32,
    /// Decoded slot header.
    pub header: SlotHeader,
    /// Byte offset of the slot header within the payload.
    pub offset: usize,
    /// Value bytes (empty for NULL).
    pub bytes: &'a [u8],
}

impl<'a> FieldSlot<'a> {
    /// Get the wire type identifier.
    #[inline]
    pub fn oid(&self) -> u32 {
        self.header.oid
    }

    /// Get the declared length, `None` for NULL.
    #[inline]
    pub fn length(&self) -> Option<u32> {
        self.header.length()
    }

    /// Check if this field is NULL.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.header.is_null()
    }

    /// Get the value bytes, `None` for NULL.
    ///
    /// A zero-length present value yields `Some(&[])`.
    #[inline]
    pub fn value(&self) -> Option<&'a [u8]> {
        if self.is_null() {
            None
        } else {
            Some(self.bytes)
        }
    }

    /// Total bytes this slot occupies in the payload.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        SLOT_HEADER_SIZE + self.bytes.len()
    }
}

/// Builder producing a binary composite payload.
///
/// The field count is written when [`finish`](Self::finish) is called.
#[derive(Debug, Clone)]
pub struct CompositeBuilder {
    body: BytesMut,
    count: u32,
}

impl CompositeBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            body: BytesMut::with_capacity(64),
            count: 0,
        }
    }

    /// Append a present field with the given value bytes.
    pub fn field(mut self, oid: u32, value: &[u8]) -> Self {
        self.push_field(oid, Some(value));
        self
    }

    /// Append a NULL field.
    pub fn null(mut self, oid: u32) -> Self {
        self.push_field(oid, None);
        self
    }

    /// Append a field in place, `None` writes a NULL.
    ///
    /// # Panics
    ///
    /// Panics if the value is `u32::MAX` bytes or longer, which the wire
    /// format cannot express.
    pub fn push_field(&mut self, oid: u32, value: Option<&[u8]>) {
        self.body.put_u32(oid);
        match value {
            Some(bytes) => {
                let len = u32::try_from(bytes.len())
                    .ok()
                    .filter(|&len| len != NULL_LENGTH)
                    .expect("value too large for composite field");
                self.body.put_u32(len);
                self.body.put_slice(bytes);
            }
            None => self.body.put_u32(NULL_LENGTH),
        }
        self.count += 1;
    }

    /// Number of fields appended so far.
    pub fn len(&self) -> u32 {
        self.count
    }

    /// Check if no fields were appended.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Produce the complete payload.
    pub fn finish(self) -> Bytes {
        let mut buf = BytesMut::with_capacity(FIELD_COUNT_SIZE + self.body.len());
        buf.put_u32(self.count);
        buf.extend_from_slice(&self.body);
        buf.freeze()
    }
}

impl Default for CompositeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
