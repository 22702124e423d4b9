//! Frame walker splitting a composite payload into field slots.
//!
//! The walker is a one-shot cursor over a single payload:
//! - Reads the leading field count when created
//! - Yields one [`FieldSlot`] per declared field
//! - Checks that the last field ends exactly at the end of the payload
//!
//! Any read that would run past the buffer is reported as
//! [`CompositeError::TruncatedPayload`] and ends the iteration.
//!
//! # Example
//!
//! ```
//! use pgcomposite::protocol::walk;
//!
//! let payload = [0, 0, 0, 1, 0, 0, 0, 23, 0, 0, 0, 4, 0, 0, 0, 42];
//! let mut walker = walk(&payload).unwrap();
//! assert_eq!(walker.field_count(), 1);
//!
//! let slot = walker.next().unwrap().unwrap();
//! assert_eq!(slot.oid(), 23);
//! assert_eq!(slot.value(), Some(&[0, 0, 0, 42][..]));
//! assert!(walker.next().is_none());
//! ```

use std::iter::FusedIterator;

use super::slot::FieldSlot;
use super::wire_format::{decode_field_count, SlotHeader, FIELD_COUNT_SIZE, SLOT_HEADER_SIZE};
use crate::error::{CompositeError, Result};

/// Walker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// More slots to read.
    Walking,
    /// All slots read, trailing check done or error reported.
    Done,
}

/// Iterator over the field slots of one composite payload.
#[derive(Debug)]
pub struct FrameWalker<'a> {
    /// The payload being walked.
    payload: &'a [u8],
    /// Offset of the next unread byte.
    cursor: usize,
    /// Declared number of fields.
    count: u32,
    /// Index of the next field.
    next_index: u32,
    state: State,
}

impl<'a> FrameWalker<'a> {
    /// Start walking a payload.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedPayload` if the payload is shorter than the
    /// 4-byte field count.
    pub fn new(payload: &'a [u8]) -> Result<Self> {
        let count = decode_field_count(payload).ok_or(CompositeError::TruncatedPayload {
            field: None,
            offset: 0,
            needed: FIELD_COUNT_SIZE,
            available: payload.len(),
        })?;

        Ok(Self {
            payload,
            cursor: FIELD_COUNT_SIZE,
            count,
            next_index: 0,
            state: State::Walking,
        })
    }

    /// Declared number of fields.
    #[inline]
    pub fn field_count(&self) -> u32 {
        self.count
    }

    /// Bytes consumed so far, including the field count.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.cursor
    }

    /// Bytes not consumed yet.
    #[inline]
    fn remaining(&self) -> usize {
        self.payload.len() - self.cursor
    }

    /// Read the next slot.
    ///
    /// Returns:
    /// - `Ok(Some(slot))` if a complete slot was read
    /// - `Ok(None)` once all declared fields were read and the payload is exhausted
    /// - `Err(...)` if the payload is truncated or has trailing bytes
    fn try_next(&mut self) -> Result<Option<FieldSlot<'a>>> {
        if self.next_index == self.count {
            if self.cursor != self.payload.len() {
                return Err(CompositeError::TrailingBytes {
                    consumed: self.cursor,
                    len: self.payload.len(),
                });
            }
            return Ok(None);
        }

        let index = self.next_index;
        let offset = self.cursor;

        let header = SlotHeader::decode(&self.payload[offset..]).ok_or(
            CompositeError::TruncatedPayload {
                field: Some(index),
                offset,
                needed: SLOT_HEADER_SIZE,
                available: self.remaining(),
            },
        )?;

        let value_start = offset + SLOT_HEADER_SIZE;
        let value_len = header.value_len();
        let available = self.payload.len() - value_start;
        if value_len > available {
            return Err(CompositeError::TruncatedPayload {
                field: Some(index),
                offset: value_start,
                needed: value_len,
                available,
            });
        }

        let bytes = &self.payload[value_start..value_start + value_len];
        self.cursor = value_start + value_len;
        self.next_index += 1;

        tracing::trace!(
            "Walked field {} (OID {}, length {:?}) at offset {}",
            index,
            header.oid,
            header.length(),
            offset
        );

        Ok(Some(FieldSlot {
            index,
            header,
            offset,
            bytes,
        }))
    }
}

impl<'a> Iterator for FrameWalker<'a> {
    type Item = Result<FieldSlot<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == State::Done {
            return None;
        }

        match self.try_next() {
            Ok(Some(slot)) => Some(Ok(slot)),
            Ok(None) => {
                self.state = State::Done;
                None
            }
            Err(e) => {
                self.state = State::Done;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.state {
            State::Done => (0, Some(0)),
            // One extra item may be the trailing-bytes error.
            State::Walking => (0, Some((self.count - self.next_index) as usize + 1)),
        }
    }
}

impl FusedIterator for FrameWalker<'_> {}

/// Start walking a composite payload (standalone function).
#[inline]
pub fn walk(payload: &[u8]) -> Result<FrameWalker<'_>> {
    FrameWalker::new(payload)
}

/// Walk a whole payload, failing on the first framing error.
///
/// Nothing is returned unless the entire payload is well-formed.
pub fn walk_all(payload: &[u8]) -> Result<Vec<FieldSlot<'_>>> {
    walk(payload)?.collect()
}
