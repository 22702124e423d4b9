//! Human and JSON renderings of a decoded composite.
//!
//! Reports go to stdout; logs go to stderr through `tracing`, so the two
//! never mix.
//!
//! # Example
//!
//! ```
//! use pgcomposite::CompositeDecoder;
//!
//! let payload = [0, 0, 0, 1, 0, 0, 0, 23, 0, 0, 0, 4, 0, 0, 0, 42];
//! let decoder = CompositeDecoder::new();
//! let report = decoder.fields(&payload).unwrap().next().unwrap().unwrap();
//!
//! assert_eq!(
//!     report.to_string(),
//!     "Field 0:\n\tOID: 23 ([0 0 0 23])\n\tType int4\n\tLength: 4 ([0 0 0 4])\n\tValue: 42 ([0 0 0 42])\n"
//! );
//! ```

use std::fmt;
use std::io::Write;

use serde::Serialize;

use crate::decode::{CompositeDecoder, DecodedField};
use crate::error::Result;
use crate::protocol::{FieldSlot, FIELD_COUNT_SIZE};

/// A decoded field together with the raw slot it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldReport<'a> {
    /// Raw slot borrowed from the payload.
    pub slot: FieldSlot<'a>,
    /// Decoded field.
    pub field: DecodedField,
}

impl<'a> FieldReport<'a> {
    /// Pair a slot with its decoded field.
    pub fn new(slot: FieldSlot<'a>, field: DecodedField) -> Self {
        Self { slot, field }
    }
}

impl fmt::Display for FieldReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.slot.header;
        writeln!(f, "Field {}:", self.field.index)?;
        writeln!(
            f,
            "\tOID: {} ({})",
            header.oid,
            ByteList(&header.oid.to_be_bytes())
        )?;
        writeln!(f, "\tType {}", self.field.type_name)?;
        writeln!(
            f,
            "\tLength: {} ({})",
            header.raw_length,
            ByteList(&header.raw_length.to_be_bytes())
        )?;
        writeln!(f, "\tValue: {} ({})", self.field.value, ByteList(self.slot.bytes))
    }
}

/// Renders bytes as a bracketed decimal list, e.g. `[0 0 0 42]`.
#[derive(Debug, Clone, Copy)]
pub struct ByteList<'a>(pub &'a [u8]);

impl fmt::Display for ByteList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", b)?;
        }
        f.write_str("]")
    }
}

/// JSON document describing one composite value.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeDocument {
    /// Textual form of the value, when it was fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Declared number of fields.
    pub field_count: u32,
    /// Decoded fields in order.
    pub fields: Vec<DecodedField>,
}

/// Render the full text report of a payload.
///
/// Produces the payload summary lines followed by one block per field.
///
/// # Errors
///
/// Returns the first fatal decode error.
pub fn render_text(
    decoder: &CompositeDecoder,
    text: Option<&str>,
    payload: &[u8],
) -> Result<String> {
    use fmt::Write as _;

    let fields = decoder.fields(payload)?;
    let mut out = String::new();

    // Writing into a String cannot fail.
    if let Some(text) = text {
        let _ = writeln!(out, "Text: {}", text);
    }
    let _ = writeln!(out, "Binary: {}", ByteList(payload));
    let _ = writeln!(
        out,
        "Num of fields: {} ({})",
        ByteList(&payload[..FIELD_COUNT_SIZE]),
        fields.field_count()
    );

    for report in fields {
        let _ = write!(out, "{}", report?);
    }
    Ok(out)
}

/// Render a payload as a pretty-printed JSON document.
///
/// # Errors
///
/// Returns the first fatal decode error, or a JSON error.
pub fn render_json(
    decoder: &CompositeDecoder,
    text: Option<&str>,
    payload: &[u8],
) -> Result<String> {
    let fields = decoder.fields(payload)?;
    let field_count = fields.field_count();
    let fields = fields
        .map(|report| report.map(|r| r.field))
        .collect::<Result<Vec<_>>>()?;

    let document = CompositeDocument {
        text: text.map(str::to_string),
        field_count,
        fields,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Write a string to stdout and flush.
///
/// # Errors
///
/// Returns IO error if write or flush fails.
pub fn write_stdout(out: &str) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(out.as_bytes())?;
    if !out.ends_with('\n') {
        handle.write_all(b"\n")?;
    }
    handle.flush()?;
    Ok(())
}
