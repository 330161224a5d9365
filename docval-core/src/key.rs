//! # Order-Preserving Key Encoding
//!
//! Encodes values into byte strings whose unsigned lexicographic order matches
//! the ordering of [`crate::compare`], so index keys can be compared with a
//! plain byte comparison. The encoding is one-way; keys are never decoded.
//!
//! ## Layout
//!
//! Every value starts with its type tag, so values of unrelated types sort by
//! tag (Null lowest). The rest depends on the type:
//!
//! ```text
//! Null      [tag]
//! Bool      [tag][0x00 | 0x01]
//! Number    [tag][f64: 8 bytes][i64: 8 bytes]      (unified numbers)
//! Integer   [tag][i64: 8 bytes]                     (separate numbers)
//! Double    [tag][f64: 8 bytes]                     (separate numbers)
//! Text/Blob [tag][ordered base64 of the bytes]
//! Array     [tag][v0][0x1f][v1]...[0x1e]
//! Document  [tag][b64(name0)][0x1d][v0][0x1c][b64(name1)][0x1d][v1]...[0x1b]
//! Composite [v0][0x1a][v1]...
//! ```
//!
//! - `i64` is written big-endian with the sign bit flipped.
//! - `f64` is written big-endian after flipping the sign bit of non-negative
//!   values and every bit of negative ones. `-0.0` is written as `0.0` and
//!   every NaN as one canonical NaN, which sorts after `+inf`.
//! - With unified numbers, Integer, Duration and Double share the Double tag.
//!   The `f64` image orders them and the trailing `i64` (the integer itself,
//!   or the truncated double) separates integers that round to the same double.
//! - Byte strings use base64 over an alphabet in ascending ASCII order,
//!   without padding, so encoded strings keep the order of the originals. The
//!   alphabet starts at `-` (0x2d), above every structural delimiter, which
//!   keeps a shorter string or array ahead of a longer one sharing its prefix.
//! - Document fields are written sorted by name.

use base64::alphabet::Alphabet;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::data::{ArrayValue, DocumentValue, Payload, Value, ValueType};
use crate::document::{Array, Document};
use crate::error::Result;

/// Separates consecutive top-level values of a composite key.
pub const KEY_VALUE_DELIM: u8 = 0x1a;
pub const ARRAY_END: u8 = 0x1e;
pub const ARRAY_VALUE_DELIM: u8 = 0x1f;
pub const DOCUMENT_END: u8 = 0x1b;
pub const DOCUMENT_FIELD_DELIM: u8 = 0x1c;
pub const DOCUMENT_VALUE_DELIM: u8 = 0x1d;

const ORDERED_ALPHABET: Alphabet =
    match Alphabet::new("-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz") {
        Ok(alphabet) => alphabet,
        Err(_) => panic!("ordered base64 alphabet is invalid"),
    };

/// Base64 engine whose output sorts like its input.
pub const ORDERED_BASE64: GeneralPurpose = GeneralPurpose::new(&ORDERED_ALPHABET, NO_PAD);

/// Key encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Encode Integer, Duration and Double in one comparable space.
    pub unify_numbers: bool,
    /// Encode Text and Blob under one tag.
    pub unify_bytes: bool,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            unify_numbers: true,
            unify_bytes: true,
        }
    }
}

/// Builds an index key from one or more values
#[derive(Debug, Clone, Default)]
pub struct KeyEncoder {
    buf: Vec<u8>,
    config: KeyConfig,
}

impl KeyEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: KeyConfig) -> Self {
        KeyEncoder {
            buf: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> KeyConfig {
        self.config
    }

    /// Append the encoding of `value`, after a separator if the key already
    /// holds a value.
    pub fn encode(&mut self, value: &Value<'_>) -> Result<()> {
        if !self.buf.is_empty() {
            self.buf.push(KEY_VALUE_DELIM);
        }
        self.write_value(value)
    }

    fn write_value(&mut self, value: &Value<'_>) -> Result<()> {
        match value.decode()? {
            Payload::Null => self.buf.push(ValueType::Null.tag()),
            Payload::Bool(b) => {
                self.buf.push(ValueType::Bool.tag());
                self.buf.push(u8::from(*b));
            }
            Payload::Integer(n) => self.write_integer(ValueType::Integer, *n),
            Payload::Duration(d) => self.write_integer(ValueType::Duration, d.as_nanos()),
            Payload::Double(x) => self.write_double(*x),
            Payload::Blob(b) => self.write_bytes(ValueType::Blob, b),
            Payload::Text(s) => self.write_bytes(ValueType::Text, s.as_bytes()),
            Payload::Array(a) => self.write_array(a)?,
            Payload::Document(d) => self.write_document(d)?,
        }
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }

    pub fn finish(self) -> Vec<u8> {
        trace!(bytes = self.buf.len(), "encoded key");
        self.buf
    }

    fn write_integer(&mut self, kind: ValueType, n: i64) {
        if self.config.unify_numbers {
            self.buf.push(ValueType::Double.tag());
            self.buf.extend_from_slice(&sortable_f64(n as f64));
        } else {
            self.buf.push(kind.tag());
        }
        self.buf.extend_from_slice(&sortable_i64(n));
    }

    fn write_double(&mut self, x: f64) {
        self.buf.push(ValueType::Double.tag());
        self.buf.extend_from_slice(&sortable_f64(x));
        if self.config.unify_numbers {
            // Saturating truncation; NaN becomes 0.
            self.buf.extend_from_slice(&sortable_i64(x as i64));
        }
    }

    fn write_bytes(&mut self, kind: ValueType, bytes: &[u8]) {
        let tag = if self.config.unify_bytes {
            ValueType::Blob
        } else {
            kind
        };
        self.buf.push(tag.tag());
        self.write_base64(bytes);
    }

    fn write_base64(&mut self, bytes: &[u8]) {
        let encoded = ORDERED_BASE64.encode(bytes);
        self.buf.extend_from_slice(encoded.as_bytes());
    }

    fn write_array(&mut self, array: &ArrayValue<'_>) -> Result<()> {
        self.buf.push(ValueType::Array.tag());
        for (i, value) in array.values().enumerate() {
            if i > 0 {
                self.buf.push(ARRAY_VALUE_DELIM);
            }
            self.write_value(&value?)?;
        }
        self.buf.push(ARRAY_END);
        Ok(())
    }

    fn write_document(&mut self, doc: &DocumentValue<'_>) -> Result<()> {
        let mut fields = doc.fields().collect::<Result<Vec<_>>>()?;
        fields.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));

        self.buf.push(ValueType::Document.tag());
        for (i, (name, value)) in fields.iter().enumerate() {
            if i > 0 {
                self.buf.push(DOCUMENT_FIELD_DELIM);
            }
            self.write_base64(name.as_bytes());
            self.buf.push(DOCUMENT_VALUE_DELIM);
            self.write_value(value)?;
        }
        self.buf.push(DOCUMENT_END);
        Ok(())
    }
}

/// Encode a single value with the default settings.
pub fn encode_key(value: &Value<'_>) -> Result<Vec<u8>> {
    let mut encoder = KeyEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.finish())
}

fn sortable_i64(n: i64) -> [u8; 8] {
    ((n as u64) ^ (1 << 63)).to_be_bytes()
}

fn sortable_f64(x: f64) -> [u8; 8] {
    let x = if x == 0.0 {
        0.0
    } else if x.is_nan() {
        f64::NAN
    } else {
        x
    };
    let bits = x.to_bits();
    let ordered = if x.is_sign_negative() {
        !bits
    } else {
        bits ^ (1 << 63)
    };
    ordered.to_be_bytes()
}
