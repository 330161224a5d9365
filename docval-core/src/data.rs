// Core value types for docval

use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, OnceLock};

use bstr::ByteSlice;

use crate::binary::{self, EncodedArray, EncodedDocument};
use crate::document::{Array, Document, FieldBuffer, ValueBuffer};
use crate::error::{DecodeError, Result};
use crate::time::Duration;

/// Type tag carried by every value
///
/// Tags are partitioned into families by numeric range so family checks are
/// range tests. The ordering of the tags is also the order in which values of
/// unrelated types sort inside index keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ValueType {
    Null = 0x80,
    Bool = 0x81,
    Integer = 0x90,
    Duration = 0x98,
    Double = 0xA0,
    Blob = 0xC0,
    Text = 0xD0,
    Array = 0xE0,
    Document = 0xF0,
}

const NUMBER_FAMILY: std::ops::RangeInclusive<u8> = 0x90..=0xAF;
const INTEGER_FAMILY: std::ops::RangeInclusive<u8> = 0x90..=0x9F;
const BYTES_FAMILY: std::ops::RangeInclusive<u8> = 0xC0..=0xDF;

impl ValueType {
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Map a wire tag back to its type.
    pub fn from_tag(tag: u64) -> std::result::Result<Self, DecodeError> {
        match tag {
            0x80 => Ok(ValueType::Null),
            0x81 => Ok(ValueType::Bool),
            0x90 => Ok(ValueType::Integer),
            0x98 => Ok(ValueType::Duration),
            0xA0 => Ok(ValueType::Double),
            0xC0 => Ok(ValueType::Blob),
            0xD0 => Ok(ValueType::Text),
            0xE0 => Ok(ValueType::Array),
            0xF0 => Ok(ValueType::Document),
            other => Err(DecodeError::InvalidTypeTag(other)),
        }
    }

    /// Integer, Duration or Double.
    pub fn is_number(self) -> bool {
        NUMBER_FAMILY.contains(&self.tag())
    }

    /// Types whose payload is a signed 64-bit magnitude.
    pub fn is_integer_like(self) -> bool {
        INTEGER_FAMILY.contains(&self.tag())
    }

    /// Text or Blob.
    pub fn is_bytes(self) -> bool {
        BYTES_FAMILY.contains(&self.tag())
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Integer => "integer",
            ValueType::Duration => "duration",
            ValueType::Double => "double",
            ValueType::Blob => "blob",
            ValueType::Text => "text",
            ValueType::Array => "array",
            ValueType::Document => "document",
        };
        f.write_str(name)
    }
}

/// Decoded payload of a value
#[derive(Debug, Clone)]
pub enum Payload<'a> {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    Duration(Duration),
    Blob(Cow<'a, [u8]>),
    Text(Cow<'a, str>),
    Array(ArrayValue<'a>),
    Document(DocumentValue<'a>),
}

/// Array payload: either an in-memory buffer or an encoded slice
#[derive(Debug, Clone)]
pub enum ArrayValue<'a> {
    Buffer(Arc<ValueBuffer<'a>>),
    Encoded(EncodedArray<'a>),
}

/// Document payload: either an in-memory buffer or an encoded slice
#[derive(Debug, Clone)]
pub enum DocumentValue<'a> {
    Buffer(Arc<FieldBuffer<'a>>),
    Encoded(EncodedDocument<'a>),
}

impl<'a> Array<'a> for ArrayValue<'a> {
    fn values(&self) -> Box<dyn Iterator<Item = Result<Value<'a>>> + '_> {
        match self {
            ArrayValue::Buffer(buf) => buf.values(),
            ArrayValue::Encoded(enc) => enc.values(),
        }
    }

    fn get_by_index(&self, index: usize) -> Result<Value<'a>> {
        match self {
            ArrayValue::Buffer(buf) => buf.get_by_index(index),
            ArrayValue::Encoded(enc) => enc.get_by_index(index),
        }
    }

    fn len(&self) -> Result<usize> {
        match self {
            ArrayValue::Buffer(buf) => Ok(buf.len()),
            ArrayValue::Encoded(enc) => Array::len(enc),
        }
    }
}

impl<'a> Document<'a> for DocumentValue<'a> {
    fn fields(&self) -> Box<dyn Iterator<Item = Result<(&str, Value<'a>)>> + '_> {
        match self {
            DocumentValue::Buffer(buf) => buf.fields(),
            DocumentValue::Encoded(enc) => enc.fields(),
        }
    }

    fn get_by_field(&self, name: &str) -> Result<Value<'a>> {
        match self {
            DocumentValue::Buffer(buf) => buf.get_by_field(name),
            DocumentValue::Encoded(enc) => enc.get_by_field(name),
        }
    }

    fn len(&self) -> Result<usize> {
        match self {
            DocumentValue::Buffer(buf) => Ok(buf.len()),
            DocumentValue::Encoded(enc) => Document::len(enc),
        }
    }

    fn is_empty(&self) -> Result<bool> {
        match self {
            DocumentValue::Buffer(buf) => Ok(buf.is_empty()),
            DocumentValue::Encoded(enc) => Document::is_empty(enc),
        }
    }
}

/// An immutable typed value
///
/// Values built in memory carry their payload from the start. Values read
/// out of an encoded document keep the raw body bytes and decode them the
/// first time the payload is requested; the result is cached for the
/// lifetime of the value.
#[derive(Clone)]
pub struct Value<'a> {
    kind: ValueType,
    raw: Option<&'a [u8]>,
    payload: OnceLock<Payload<'a>>,
}

impl<'a> Value<'a> {
    fn with_payload(kind: ValueType, payload: Payload<'a>) -> Self {
        Value {
            kind,
            raw: None,
            payload: OnceLock::from(payload),
        }
    }

    /// Wrap an encoded body without decoding it.
    pub(crate) fn from_raw(kind: ValueType, raw: &'a [u8]) -> Self {
        Value {
            kind,
            raw: Some(raw),
            payload: OnceLock::new(),
        }
    }

    pub fn null() -> Self {
        Self::with_payload(ValueType::Null, Payload::Null)
    }

    pub fn bool(b: bool) -> Self {
        Self::with_payload(ValueType::Bool, Payload::Bool(b))
    }

    pub fn integer(n: i64) -> Self {
        Self::with_payload(ValueType::Integer, Payload::Integer(n))
    }

    pub fn double(x: f64) -> Self {
        Self::with_payload(ValueType::Double, Payload::Double(x))
    }

    pub fn duration(d: Duration) -> Self {
        Self::with_payload(ValueType::Duration, Payload::Duration(d))
    }

    pub fn blob(bytes: impl Into<Cow<'a, [u8]>>) -> Self {
        Self::with_payload(ValueType::Blob, Payload::Blob(bytes.into()))
    }

    pub fn text(s: impl Into<Cow<'a, str>>) -> Self {
        Self::with_payload(ValueType::Text, Payload::Text(s.into()))
    }

    pub fn array(array: impl Into<ArrayValue<'a>>) -> Self {
        Self::with_payload(ValueType::Array, Payload::Array(array.into()))
    }

    pub fn document(document: impl Into<DocumentValue<'a>>) -> Self {
        Self::with_payload(ValueType::Document, Payload::Document(document.into()))
    }

    /// The zero value of `kind`: false, 0, 0.0, an empty duration, or an
    /// empty blob, text, array or document. Null maps to Null.
    pub fn zero(kind: ValueType) -> Self {
        match kind {
            ValueType::Null => Value::null(),
            ValueType::Bool => Value::bool(false),
            ValueType::Integer => Value::integer(0),
            ValueType::Double => Value::double(0.0),
            ValueType::Duration => Value::duration(Duration::ZERO),
            ValueType::Blob => Value::blob(Vec::new()),
            ValueType::Text => Value::text(""),
            ValueType::Array => Value::array(ValueBuffer::new()),
            ValueType::Document => Value::document(FieldBuffer::new()),
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.kind
    }

    pub fn is_null(&self) -> bool {
        self.kind == ValueType::Null
    }

    /// Raw body bytes if this value was read from an encoded buffer.
    pub fn raw_bytes(&self) -> Option<&'a [u8]> {
        self.raw
    }

    /// Native payload, decoded on first access and cached afterwards.
    pub fn decode(&self) -> Result<&Payload<'a>> {
        if let Some(payload) = self.payload.get() {
            return Ok(payload);
        }
        // Only wire values reach this point; in-memory values are built with a payload.
        let decoded = binary::decode_body(self.kind, self.raw.unwrap_or_default())?;
        Ok(self.payload.get_or_init(|| decoded))
    }

    /// True unless the value is Null or the zero value of its type.
    pub fn is_truthy(&self) -> Result<bool> {
        if self.is_null() {
            return Ok(false);
        }
        Ok(!self.is_zero_value()?)
    }

    /// Whether the payload equals the additive identity or empty value of its type.
    pub fn is_zero_value(&self) -> Result<bool> {
        let zero = match self.decode()? {
            Payload::Null => false,
            Payload::Bool(b) => !*b,
            Payload::Integer(n) => *n == 0,
            Payload::Double(x) => *x == 0.0,
            Payload::Duration(d) => d.is_zero(),
            Payload::Blob(b) => b.is_empty(),
            Payload::Text(s) => s.is_empty(),
            Payload::Array(a) => match a.get_by_index(0) {
                Ok(_) => false,
                Err(e) if e.is_not_found() => true,
                Err(e) => return Err(e),
            },
            Payload::Document(d) => d.is_empty()?,
        };
        Ok(zero)
    }

    /// Deep copy that no longer borrows from any encoded buffer.
    pub fn to_owned_value(&self) -> Result<Value<'static>> {
        let owned = match self.decode()? {
            Payload::Null => Value::null(),
            Payload::Bool(b) => Value::bool(*b),
            Payload::Integer(n) => Value::integer(*n),
            Payload::Double(x) => Value::double(*x),
            Payload::Duration(d) => Value::duration(*d),
            Payload::Blob(b) => Value::blob(b.to_vec()),
            Payload::Text(s) => Value::text(s.to_string()),
            Payload::Array(a) => {
                let mut buf = ValueBuffer::new();
                for value in a.values() {
                    buf.push(value?.to_owned_value()?);
                }
                Value::array(buf)
            }
            Payload::Document(d) => {
                let mut buf = FieldBuffer::new();
                for field in d.fields() {
                    let (name, value) = field?;
                    buf.add(name, value.to_owned_value()?);
                }
                Value::document(buf)
            }
        };
        Ok(owned)
    }
}

impl<'a> From<ValueBuffer<'a>> for ArrayValue<'a> {
    fn from(buf: ValueBuffer<'a>) -> Self {
        ArrayValue::Buffer(Arc::new(buf))
    }
}

impl<'a> From<EncodedArray<'a>> for ArrayValue<'a> {
    fn from(enc: EncodedArray<'a>) -> Self {
        ArrayValue::Encoded(enc)
    }
}

impl<'a> From<FieldBuffer<'a>> for DocumentValue<'a> {
    fn from(buf: FieldBuffer<'a>) -> Self {
        DocumentValue::Buffer(Arc::new(buf))
    }
}

impl<'a> From<EncodedDocument<'a>> for DocumentValue<'a> {
    fn from(enc: EncodedDocument<'a>) -> Self {
        DocumentValue::Encoded(enc)
    }
}

impl<'a> From<bool> for Value<'a> {
    fn from(b: bool) -> Self {
        Value::bool(b)
    }
}

impl<'a> From<i64> for Value<'a> {
    fn from(n: i64) -> Self {
        Value::integer(n)
    }
}

impl<'a> From<f64> for Value<'a> {
    fn from(x: f64) -> Self {
        Value::double(x)
    }
}

impl<'a> From<Duration> for Value<'a> {
    fn from(d: Duration) -> Self {
        Value::duration(d)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::text(s)
    }
}

impl<'a> From<String> for Value<'a> {
    fn from(s: String) -> Self {
        Value::text(s)
    }
}

impl<'a> From<Vec<u8>> for Value<'a> {
    fn from(bytes: Vec<u8>) -> Self {
        Value::blob(bytes)
    }
}

impl<'a> From<FieldBuffer<'a>> for Value<'a> {
    fn from(buf: FieldBuffer<'a>) -> Self {
        Value::document(buf)
    }
}

impl<'a> From<ValueBuffer<'a>> for Value<'a> {
    fn from(buf: ValueBuffer<'a>) -> Self {
        Value::array(buf)
    }
}

/// Two values are equal when they have the same type and compare equal.
impl<'a, 'b> PartialEq<Value<'b>> for Value<'a> {
    fn eq(&self, other: &Value<'b>) -> bool {
        self.kind == other.kind && crate::compare::is_equal(self, other).unwrap_or(false)
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            Ok(Payload::Null) => f.write_str("NULL"),
            Ok(Payload::Double(x)) if !x.is_finite() => write!(f, "{}", x),
            Ok(_) => match crate::json::to_json(self) {
                Ok(text) => f.write_str(&text),
                Err(e) => write!(f, "<{}>", e),
            },
            Err(e) => write!(f, "<{}>", e),
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            // Blobs show their bytes rather than base64.
            Ok(Payload::Blob(b)) => write!(f, "{}({:?})", self.kind, b.as_bstr()),
            _ => write!(f, "{}({})", self.kind, self),
        }
    }
}
