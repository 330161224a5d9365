// Binary layer - random-access document format
//
// Layout:
// ```text
// [Header Size: varint] byte length of everything up to the body
// [Field Count: varint]
// [Field Header 0] varint(name len) | name | varint(type tag) | varint(size) | varint(offset)
// [Field Header 1] ...
// [Body] each field's encoded value, concatenated in header order
// ```
//
// Documents are written with their fields sorted by name so equal documents
// produce equal bytes. Arrays use the decimal position as the field name and
// keep positional order. Nested documents and arrays are encoded with this
// same layout inside the parent body and decoded only when asked for.

use std::borrow::Cow;

use tracing::{debug, trace};

use crate::data::{ArrayValue, DocumentValue, Payload, Value, ValueType};
use crate::document::{Array, Document};
use crate::error::{DecodeError, Error, Result};
use crate::time::Duration;
use crate::varint::{put_uvarint, put_varint, read_uvarint, read_varint};

/// Metadata for one encoded field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldHeader<'a> {
    pub name: &'a [u8],
    pub type_tag: ValueType,
    /// Byte length of the value in the body.
    pub size: u64,
    /// Position of the value from the start of the body.
    pub offset: u64,
}

/// Field headers of an encoded document or array
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Header<'a> {
    pub fields: Vec<FieldHeader<'a>>,
}

/// A decoded header together with the body it describes
#[derive(Debug, Clone, PartialEq)]
pub struct Format<'a> {
    pub header: Header<'a>,
    pub body: &'a [u8],
}

fn read_header_uvarint(
    data: &[u8],
    pos: &mut usize,
) -> std::result::Result<u64, DecodeError> {
    let (value, n) = read_uvarint(&data[*pos..])?;
    *pos += n;
    Ok(value)
}

impl<'a> FieldHeader<'a> {
    /// Write the field header
    pub fn write_to(&self, out: &mut Vec<u8>) {
        put_uvarint(out, self.name.len() as u64);
        out.extend_from_slice(self.name);
        put_uvarint(out, u64::from(self.type_tag.tag()));
        put_uvarint(out, self.size);
        put_uvarint(out, self.offset);
    }

    /// Read one field header from the front of `data`, returning the bytes consumed.
    pub fn read_from(data: &'a [u8]) -> Result<(Self, usize)> {
        let mut pos = 0;

        let name_len = read_header_uvarint(data, &mut pos)?;
        let name_end = usize::try_from(name_len)
            .ok()
            .and_then(|len| pos.checked_add(len))
            .filter(|end| *end <= data.len())
            .ok_or(DecodeError::TruncatedHeader("field name"))?;
        let name = &data[pos..name_end];
        pos = name_end;

        let type_tag = ValueType::from_tag(read_header_uvarint(data, &mut pos)?)?;
        let size = read_header_uvarint(data, &mut pos)?;
        let offset = read_header_uvarint(data, &mut pos)?;

        let header = FieldHeader {
            name,
            type_tag,
            size,
            offset,
        };
        Ok((header, pos))
    }

    /// Field name as text.
    pub fn name_str(&self) -> Result<&'a str> {
        Ok(std::str::from_utf8(self.name)?)
    }

    /// Slice this field's value out of `body`.
    pub fn value_in(&self, body: &'a [u8]) -> Result<Value<'a>> {
        let out_of_bounds = || DecodeError::FieldOutOfBounds {
            offset: self.offset,
            size: self.size,
            body: body.len(),
        };
        let start = usize::try_from(self.offset).map_err(|_| out_of_bounds())?;
        let end = usize::try_from(self.size)
            .ok()
            .and_then(|size| start.checked_add(size))
            .filter(|end| *end <= body.len())
            .ok_or_else(out_of_bounds)?;
        Ok(Value::from_raw(self.type_tag, &body[start..end]))
    }
}

impl<'a> Header<'a> {
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Sum of all field sizes.
    pub fn body_size(&self) -> u64 {
        self.fields.iter().map(|f| f.size).sum()
    }

    /// Write the size-prefixed header
    pub fn write_to(&self, out: &mut Vec<u8>) {
        let mut buf = Vec::new();
        put_uvarint(&mut buf, self.fields.len() as u64);
        for field in &self.fields {
            field.write_to(&mut buf);
        }
        put_uvarint(out, buf.len() as u64);
        out.extend_from_slice(&buf);
    }

    /// Read a size-prefixed header, returning it and the bytes consumed.
    pub fn read_from(data: &'a [u8]) -> Result<(Self, usize)> {
        let raw = RawHeader::split(data)?;
        let fields = raw.field_headers().collect::<Result<Vec<_>>>()?;
        Ok((Header { fields }, data.len() - raw.body.len()))
    }
}

impl<'a> Format<'a> {
    /// Decode the header and check that the fields tile the body exactly.
    pub fn decode(data: &'a [u8]) -> Result<Self> {
        let (header, consumed) = Header::read_from(data)?;
        let body = &data[consumed..];

        let mut expected_offset = 0u64;
        for field in &header.fields {
            let packed = field.offset == expected_offset
                && field
                    .offset
                    .checked_add(field.size)
                    .map_or(false, |end| end <= body.len() as u64);
            if !packed {
                debug!(
                    offset = field.offset,
                    size = field.size,
                    body = body.len(),
                    "field does not continue the packed body"
                );
                return Err(DecodeError::FieldOutOfBounds {
                    offset: field.offset,
                    size: field.size,
                    body: body.len(),
                }
                .into());
            }
            expected_offset += field.size;
        }
        if expected_offset != body.len() as u64 {
            return Err(DecodeError::FieldOutOfBounds {
                offset: expected_offset,
                size: 0,
                body: body.len(),
            }
            .into());
        }

        Ok(Format { header, body })
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        self.header.write_to(out);
        out.extend_from_slice(self.body);
    }
}

// Header bytes split from the body without parsing any field header yet.
struct RawHeader<'a> {
    field_count: u64,
    fields: &'a [u8],
    body: &'a [u8],
}

impl<'a> RawHeader<'a> {
    fn split(data: &'a [u8]) -> Result<Self> {
        let (size, n) = read_uvarint(data).map_err(|e| {
            debug!(error = %e, "unreadable header size");
            e
        })?;
        let available = data.len() - n;
        let end = usize::try_from(size)
            .ok()
            .filter(|size| *size <= available)
            .map(|size| n + size)
            .ok_or_else(|| {
                debug!(size, available, "header size exceeds buffer");
                DecodeError::HeaderOutOfBounds { size, available }
            })?;

        let header = &data[n..end];
        let (field_count, m) =
            read_uvarint(header).map_err(|_| DecodeError::TruncatedHeader("field count"))?;

        Ok(RawHeader {
            field_count,
            fields: &header[m..],
            body: &data[end..],
        })
    }

    fn field_headers(&self) -> FieldHeaders<'a> {
        FieldHeaders {
            rest: self.fields,
            declared: self.field_count,
            seen: 0,
            done: false,
        }
    }
}

// Walks field headers one at a time; a declared count that disagrees with
// the headers present is reported once the headers run out.
struct FieldHeaders<'a> {
    rest: &'a [u8],
    declared: u64,
    seen: usize,
    done: bool,
}

impl<'a> Iterator for FieldHeaders<'a> {
    type Item = Result<FieldHeader<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.rest.is_empty() {
            self.done = true;
            if self.seen as u64 != self.declared {
                debug!(
                    declared = self.declared,
                    found = self.seen,
                    "field count mismatch"
                );
                return Some(Err(DecodeError::FieldCountMismatch {
                    declared: self.declared,
                    found: self.seen,
                }
                .into()));
            }
            return None;
        }
        match FieldHeader::read_from(self.rest) {
            Ok((field, n)) => {
                self.rest = &self.rest[n..];
                self.seen += 1;
                Some(Ok(field))
            }
            Err(e) => {
                debug!(error = %e, field = self.seen, "corrupt field header");
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Encode a document with its fields sorted by name.
pub fn encode_document<'a, D: Document<'a> + ?Sized>(doc: &D) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_document(doc, &mut out)?;
    trace!(bytes = out.len(), "encoded document");
    Ok(out)
}

/// Encode an array, naming each element after its position.
pub fn encode_array<'a, A: Array<'a> + ?Sized>(array: &A) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_array(array, &mut out)?;
    trace!(bytes = out.len(), "encoded array");
    Ok(out)
}

fn write_document<'a, D: Document<'a> + ?Sized>(doc: &D, out: &mut Vec<u8>) -> Result<()> {
    let mut fields = doc.fields().collect::<Result<Vec<_>>>()?;
    fields.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));
    write_fields(fields.iter().map(|(name, value)| (name.as_bytes(), value)), out)
}

fn write_array<'a, A: Array<'a> + ?Sized>(array: &A, out: &mut Vec<u8>) -> Result<()> {
    let values = array.values().collect::<Result<Vec<_>>>()?;
    let names: Vec<String> = (0..values.len()).map(|i| i.to_string()).collect();
    write_fields(names.iter().map(|n| n.as_bytes()).zip(values.iter()), out)
}

fn write_fields<'n, 'v: 'n>(
    fields: impl Iterator<Item = (&'n [u8], &'n Value<'v>)>,
    out: &mut Vec<u8>,
) -> Result<()> {
    let mut header = Header::default();
    let mut body = Vec::new();

    for (name, value) in fields {
        let offset = body.len() as u64;
        write_body(value, &mut body)?;
        header.fields.push(FieldHeader {
            name,
            type_tag: value.value_type(),
            size: body.len() as u64 - offset,
            offset,
        });
    }

    header.write_to(out);
    out.extend_from_slice(&body);
    trace!(
        fields = header.field_count(),
        body = body.len(),
        "wrote fields"
    );
    Ok(())
}

/// Append the body encoding of a single value.
///
/// Values read from an encoded buffer are copied through unchanged.
pub fn write_body(value: &Value<'_>, out: &mut Vec<u8>) -> Result<()> {
    if let Some(raw) = value.raw_bytes() {
        out.extend_from_slice(raw);
        return Ok(());
    }
    match value.decode()? {
        Payload::Null => {}
        Payload::Bool(b) => out.push(u8::from(*b)),
        Payload::Integer(n) => {
            put_varint(out, *n);
        }
        Payload::Double(x) => out.extend_from_slice(&x.to_bits().to_be_bytes()),
        Payload::Duration(d) => {
            put_varint(out, d.as_nanos());
        }
        Payload::Blob(b) => out.extend_from_slice(b),
        Payload::Text(s) => out.extend_from_slice(s.as_bytes()),
        Payload::Array(ArrayValue::Encoded(enc)) => out.extend_from_slice(enc.as_bytes()),
        Payload::Array(ArrayValue::Buffer(buf)) => write_array(buf.as_ref(), out)?,
        Payload::Document(DocumentValue::Encoded(enc)) => out.extend_from_slice(enc.as_bytes()),
        Payload::Document(DocumentValue::Buffer(buf)) => write_document(buf.as_ref(), out)?,
    }
    Ok(())
}

fn expect_len(kind: ValueType, raw: &[u8], expected: usize) -> Result<()> {
    if raw.len() != expected {
        return Err(DecodeError::InvalidLength {
            kind,
            expected,
            actual: raw.len(),
        }
        .into());
    }
    Ok(())
}

fn read_whole_varint(kind: ValueType, raw: &[u8]) -> Result<i64> {
    let (n, consumed) = read_varint(raw)?;
    expect_len(kind, raw, consumed)?;
    Ok(n)
}

/// Decode the body of a single value of type `kind`.
///
/// Nested documents and arrays are wrapped, not decoded.
pub fn decode_body(kind: ValueType, raw: &[u8]) -> Result<Payload<'_>> {
    let payload = match kind {
        ValueType::Null => {
            expect_len(kind, raw, 0)?;
            Payload::Null
        }
        ValueType::Bool => {
            expect_len(kind, raw, 1)?;
            Payload::Bool(raw[0] != 0)
        }
        ValueType::Integer => Payload::Integer(read_whole_varint(kind, raw)?),
        ValueType::Duration => {
            Payload::Duration(Duration::from_nanos(read_whole_varint(kind, raw)?))
        }
        ValueType::Double => {
            let bytes = <[u8; 8]>::try_from(raw).map_err(|_| DecodeError::InvalidLength {
                kind,
                expected: 8,
                actual: raw.len(),
            })?;
            Payload::Double(f64::from_bits(u64::from_be_bytes(bytes)))
        }
        ValueType::Blob => Payload::Blob(Cow::Borrowed(raw)),
        ValueType::Text => Payload::Text(Cow::Borrowed(std::str::from_utf8(raw)?)),
        ValueType::Array => Payload::Array(ArrayValue::Encoded(EncodedArray::new(raw))),
        ValueType::Document => {
            Payload::Document(DocumentValue::Encoded(EncodedDocument::new(raw)))
        }
    };
    Ok(payload)
}

/// Decode a single field, reading only the header and that field's bytes.
pub fn decode_value<'a>(data: &'a [u8], field: &str) -> Result<Value<'a>> {
    let raw = RawHeader::split(data)?;
    for header in raw.field_headers() {
        let header = header?;
        if header.name == field.as_bytes() {
            return header.value_in(raw.body);
        }
    }
    Err(Error::field_not_found(field))
}

/// Encoded document borrowing its bytes
///
/// Nothing is decoded up front and nothing is cached: every call walks the header again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedDocument<'a> {
    data: &'a [u8],
}

impl<'a> EncodedDocument<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        EncodedDocument { data }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Fully decoded header and body.
    pub fn format(&self) -> Result<Format<'a>> {
        Format::decode(self.data)
    }
}

fn fields_of<'s, 'a: 's>(
    data: &'a [u8],
) -> Box<dyn Iterator<Item = Result<(&'s str, Value<'a>)>> + 's> {
    match RawHeader::split(data) {
        Ok(raw) => {
            let body = raw.body;
            Box::new(raw.field_headers().map(move |header| {
                let header = header?;
                Ok((header.name_str()?, header.value_in(body)?))
            }))
        }
        Err(e) => Box::new(std::iter::once(Err(e))),
    }
}

impl<'a> Document<'a> for EncodedDocument<'a> {
    fn fields(&self) -> Box<dyn Iterator<Item = Result<(&str, Value<'a>)>> + '_> {
        fields_of(self.data)
    }

    fn get_by_field(&self, name: &str) -> Result<Value<'a>> {
        decode_value(self.data, name)
    }

    fn len(&self) -> Result<usize> {
        Ok(RawHeader::split(self.data)?.field_count as usize)
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(RawHeader::split(self.data)?.field_count == 0)
    }
}

/// Encoded array borrowing its bytes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedArray<'a> {
    data: &'a [u8],
}

impl<'a> EncodedArray<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        EncodedArray { data }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn format(&self) -> Result<Format<'a>> {
        Format::decode(self.data)
    }
}

impl<'a> Array<'a> for EncodedArray<'a> {
    fn values(&self) -> Box<dyn Iterator<Item = Result<Value<'a>>> + '_> {
        Box::new(
            fields_of(self.data)
                .enumerate()
                .map(|(index, field)| {
                    let (name, value) = field?;
                    if name != index.to_string() {
                        return Err(DecodeError::InvalidIndex {
                            expected: index,
                            found: name.to_string(),
                        }
                        .into());
                    }
                    Ok(value)
                }),
        )
    }

    fn get_by_index(&self, index: usize) -> Result<Value<'a>> {
        decode_value(self.data, &index.to_string()).map_err(|e| {
            if e.is_not_found() {
                Error::index_out_of_bounds(index)
            } else {
                e
            }
        })
    }

    fn len(&self) -> Result<usize> {
        Ok(RawHeader::split(self.data)?.field_count as usize)
    }
}
