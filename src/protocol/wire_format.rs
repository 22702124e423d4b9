//! Wire format encoding and decoding.
//!
//! A binary composite value is laid out as:
//! ```text
//! ┌─────────────┬──────────┬──────────┬───────────────┬─────
//! │ Field count │ OID      │ Length   │ Value         │ ...
//! │ 4 bytes     │ 4 bytes  │ 4 bytes  │ Length bytes  │
//! │ uint32 BE   │ uint32 BE│ uint32 BE│ (none if NULL)│
//! └─────────────┴──────────┴──────────┴───────────────┴─────
//! ```
//!
//! All multi-byte integers are Big Endian. A length of `0xFFFFFFFF` marks
//! a NULL field and is followed by no value bytes.

/// Size of the leading field count in bytes.
pub const FIELD_COUNT_SIZE: usize = 4;

/// Size of a per-field slot header (OID + length) in bytes.
pub const SLOT_HEADER_SIZE: usize = 8;

/// Declared length marking a NULL field.
pub const NULL_LENGTH: u32 = 0xFFFF_FFFF;

/// Default cap on the leading field count.
///
/// Matches the widest tuple the server can form; table rows stop at 1600
/// columns but anonymous rows may reach 1664.
pub const DEFAULT_MAX_FIELDS: u32 = 1664;

/// Decoded slot header from wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotHeader {
    /// Wire type identifier.
    pub oid: u32,
    /// Declared length as sent, `NULL_LENGTH` for NULL.
    pub raw_length: u32,
}

impl SlotHeader {
    /// Create a slot header for a present value.
    pub fn new(oid: u32, length: u32) -> Self {
        Self {
            oid,
            raw_length: length,
        }
    }

    /// Create a slot header for a NULL field.
    pub fn null(oid: u32) -> Self {
        Self {
            oid,
            raw_length: NULL_LENGTH,
        }
    }

    /// Encode header to bytes (Big Endian).
    ///
    /// # Example
    ///
    /// ```
    /// use pgcomposite::protocol::SlotHeader;
    ///
    /// let bytes = SlotHeader::new(23, 4).encode();
    /// assert_eq!(bytes, [0, 0, 0, 23, 0, 0, 0, 4]);
    /// ```
    pub fn encode(&self) -> [u8; SLOT_HEADER_SIZE] {
        let mut buf = [0u8; SLOT_HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.oid.to_be_bytes());
        buf[4..8].copy_from_slice(&self.raw_length.to_be_bytes());
        buf
    }

    /// Decode header from bytes (Big Endian).
    ///
    /// Returns `None` if buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < SLOT_HEADER_SIZE {
            return None;
        }
        Some(Self {
            oid: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            raw_length: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
        })
    }

    /// Check if this header marks a NULL field.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.raw_length == NULL_LENGTH
    }

    /// Declared length, `None` for NULL.
    #[inline]
    pub fn length(&self) -> Option<u32> {
        if self.is_null() {
            None
        } else {
            Some(self.raw_length)
        }
    }

    /// Number of value bytes following this header.
    #[inline]
    pub fn value_len(&self) -> usize {
        self.length().map_or(0, |len| len as usize)
    }
}

/// Decode the leading field count.
///
/// Returns `None` if buffer is too short.
#[inline]
pub fn decode_field_count(buf: &[u8]) -> Option<u32> {
    let bytes: [u8; FIELD_COUNT_SIZE] = buf.get(..FIELD_COUNT_SIZE)?.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}

/// Encode a field count (standalone function).
#[inline]
pub fn encode_field_count(count: u32) -> [u8; FIELD_COUNT_SIZE] {
    count.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_header_big_endian_byte_order() {
        let bytes = SlotHeader::new(0x01020304, 0x05060708).encode();
        assert_eq!(bytes, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
    }

    #[test]
    fn test_slot_header_decode() {
        let header = SlotHeader::decode(&[0, 0, 0x02, 0xBD, 0, 0, 0, 8]).unwrap();
        assert_eq!(header.oid, 701);
        assert_eq!(header.length(), Some(8));
        assert_eq!(header.value_len(), 8);
        assert!(!header.is_null());
    }

    #[test]
    fn test_null_header_has_no_value_bytes() {
        let header = SlotHeader::decode(&[0, 0, 0, 23, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap();
        assert!(header.is_null());
        assert_eq!(header.length(), None);
        assert_eq!(header.value_len(), 0);
        assert_eq!(header, SlotHeader::null(23));
    }

    #[test]
    fn test_zero_length_is_not_null() {
        let header = SlotHeader::new(25, 0);
        assert!(!header.is_null());
        assert_eq!(header.length(), Some(0));
    }

    #[test]
    fn test_decode_too_short_buffer() {
        assert!(SlotHeader::decode(&[0u8; 7]).is_none());
        assert!(decode_field_count(&[0u8; 3]).is_none());
    }

    #[test]
    fn test_field_count() {
        assert_eq!(decode_field_count(&[0, 0, 0, 2, 0xAA]), Some(2));
        assert_eq!(encode_field_count(2), [0, 0, 0, 2]);
    }
}
