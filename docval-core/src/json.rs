// JSON text form of values
//
// Rendering writes arrays as `[v, v]` and documents as `{"name": v, "name": v}`,
// fields in iteration order. Parsing goes through the serde impls below.

use std::fmt;
use std::marker::PhantomData;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::data::{Payload, Value};
use crate::document::{Array, Document, FieldBuffer, ValueBuffer};
use crate::error::{EncodeError, Result};

/// Render a value as JSON text.
pub fn to_json(value: &Value<'_>) -> Result<String> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out)
}

/// Render a document as a JSON object.
pub fn document_to_json<'a, D: Document<'a> + ?Sized>(doc: &D) -> Result<String> {
    let mut out = String::new();
    write_document(&mut out, doc)?;
    Ok(out)
}

/// Render an array as a JSON array.
pub fn array_to_json<'a, A: Array<'a> + ?Sized>(array: &A) -> Result<String> {
    let mut out = String::new();
    write_array(&mut out, array)?;
    Ok(out)
}

/// Parse JSON text into a value. Objects become field buffers that keep the
/// order of their keys.
pub fn from_json<'a>(text: &str) -> std::result::Result<Value<'a>, serde_json::Error> {
    serde_json::from_str(text)
}

pub fn write_value(out: &mut String, value: &Value<'_>) -> Result<()> {
    match value.decode()? {
        Payload::Null => out.push_str("null"),
        Payload::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Payload::Integer(n) => out.push_str(&n.to_string()),
        Payload::Double(x) => out.push_str(&format_double(*x)?),
        Payload::Duration(d) => write_string(out, &d.to_string())?,
        Payload::Blob(b) => write_string(out, &STANDARD.encode(b))?,
        Payload::Text(s) => write_string(out, s)?,
        Payload::Array(a) => write_array(out, a)?,
        Payload::Document(d) => write_document(out, d)?,
    }
    Ok(())
}

fn write_string(out: &mut String, s: &str) -> Result<()> {
    let quoted = serde_json::to_string(s).map_err(EncodeError::from)?;
    out.push_str(&quoted);
    Ok(())
}

fn write_array<'a, A: Array<'a> + ?Sized>(out: &mut String, array: &A) -> Result<()> {
    out.push('[');
    for (i, value) in array.values().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_value(out, &value?)?;
    }
    out.push(']');
    Ok(())
}

fn write_document<'a, D: Document<'a> + ?Sized>(out: &mut String, doc: &D) -> Result<()> {
    out.push('{');
    for (i, field) in doc.fields().enumerate() {
        let (name, value) = field?;
        if i > 0 {
            out.push_str(", ");
        }
        write_string(out, name)?;
        out.push_str(": ");
        write_value(out, &value)?;
    }
    out.push('}');
    Ok(())
}

/// Shortest round-trippable form. Integral values keep a `.0` so they read
/// back as doubles; very large and very small magnitudes use an exponent.
pub fn format_double(x: f64) -> Result<String> {
    if !x.is_finite() {
        return Err(EncodeError::NonFiniteDouble(x).into());
    }
    let abs = x.abs();
    if abs != 0.0 && !(1e-6..1e21).contains(&abs) {
        return Ok(format!("{:e}", x));
    }
    let mut s = x.to_string();
    if !s.contains('.') {
        s.push_str(".0");
    }
    Ok(s)
}

impl Serialize for Value<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.decode().map_err(<S::Error as ser::Error>::custom)? {
            Payload::Null => serializer.serialize_unit(),
            Payload::Bool(b) => serializer.serialize_bool(*b),
            Payload::Integer(n) => serializer.serialize_i64(*n),
            Payload::Double(x) => serializer.serialize_f64(*x),
            Payload::Duration(d) => serializer.collect_str(d),
            Payload::Blob(b) => serializer.serialize_bytes(b),
            Payload::Text(s) => serializer.serialize_str(s),
            Payload::Array(a) => {
                let mut seq = serializer.serialize_seq(None)?;
                for value in a.values() {
                    seq.serialize_element(&value.map_err(<S::Error as ser::Error>::custom)?)?;
                }
                seq.end()
            }
            Payload::Document(d) => {
                let mut map = serializer.serialize_map(None)?;
                for field in d.fields() {
                    let (name, value) = field.map_err(<S::Error as ser::Error>::custom)?;
                    map.serialize_entry(name, &value)?;
                }
                map.end()
            }
        }
    }
}

struct ValueVisitor<'a>(PhantomData<fn() -> Value<'a>>);

impl<'de, 'a> Visitor<'de> for ValueVisitor<'a> {
    type Value = Value<'a>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> std::result::Result<Self::Value, E> {
        Ok(Value::bool(b))
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> std::result::Result<Self::Value, E> {
        Ok(Value::integer(n))
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> std::result::Result<Self::Value, E> {
        Ok(match i64::try_from(n) {
            Ok(n) => Value::integer(n),
            Err(_) => Value::double(n as f64),
        })
    }

    fn visit_f64<E: de::Error>(self, x: f64) -> std::result::Result<Self::Value, E> {
        Ok(Value::double(x))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> std::result::Result<Self::Value, E> {
        Ok(Value::text(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> std::result::Result<Self::Value, E> {
        Ok(Value::text(s))
    }

    fn visit_bytes<E: de::Error>(self, b: &[u8]) -> std::result::Result<Self::Value, E> {
        Ok(Value::blob(b.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, b: Vec<u8>) -> std::result::Result<Self::Value, E> {
        Ok(Value::blob(b))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(Value::null())
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(Value::null())
    }

    fn visit_some<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Self::Value, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
        let mut buf = ValueBuffer::new();
        while let Some(value) = seq.next_element::<Value<'a>>()? {
            buf.push(value);
        }
        Ok(Value::array(buf))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut buf = FieldBuffer::new();
        while let Some((name, value)) = map.next_entry::<String, Value<'a>>()? {
            buf.add(name, value);
        }
        Ok(Value::document(buf))
    }
}

impl<'de, 'a> Deserialize<'de> for Value<'a> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::{encode_document, EncodedDocument};
    use crate::error::Error;
    use crate::time::Duration;

    #[test]
    fn test_scalars() {
        assert_eq!(to_json(&Value::null()).unwrap(), "null");
        assert_eq!(to_json(&Value::bool(false)).unwrap(), "false");
        assert_eq!(to_json(&Value::integer(-42)).unwrap(), "-42");
        assert_eq!(to_json(&Value::text("a\"b\n")).unwrap(), r#""a\"b\n""#);
        assert_eq!(to_json(&Value::blob(b"hi".to_vec())).unwrap(), r#""aGk=""#);
        assert_eq!(
            to_json(&Value::duration(Duration::from_millis(1500))).unwrap(),
            r#""1.5s""#
        );
    }

    #[test]
    fn test_doubles() {
        assert_eq!(format_double(1.0).unwrap(), "1.0");
        assert_eq!(format_double(-0.5).unwrap(), "-0.5");
        assert_eq!(format_double(0.1 + 0.2).unwrap(), "0.30000000000000004");
        assert_eq!(format_double(1e21).unwrap(), "1e21");
        assert_eq!(format_double(1.5e-7).unwrap(), "1.5e-7");
        assert_eq!(format_double(123456789.0).unwrap(), "123456789.0");
        assert!(matches!(
            format_double(f64::NAN),
            Err(Error::Encode(EncodeError::NonFiniteDouble(_)))
        ));
        assert!(to_json(&Value::double(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_nested_layout() {
        let doc = FieldBuffer::new()
            .with("b", Value::integer(1))
            .with(
                "a",
                Value::array(ValueBuffer::new().with(Value::double(2.0)).with("x")),
            )
            .with("c", Value::document(FieldBuffer::new()));
        assert_eq!(
            document_to_json(&doc).unwrap(),
            r#"{"b": 1, "a": [2.0, "x"], "c": {}}"#
        );

        // Encoded documents iterate in sorted order.
        let encoded = encode_document(&doc).unwrap();
        assert_eq!(
            document_to_json(&EncodedDocument::new(&encoded)).unwrap(),
            r#"{"a": [2.0, "x"], "b": 1, "c": {}}"#
        );
    }

    #[test]
    fn test_parse_keeps_key_order_and_types() {
        let text = r#"{"z": 1, "a": [1.5, null, true], "m": "s", "big": 18446744073709551615}"#;
        let value: Value = from_json(text).unwrap();
        assert_eq!(
            value.to_string(),
            r#"{"z": 1, "a": [1.5, null, true], "m": "s", "big": 18446744073709552000.0}"#
        );
    }

    #[test]
    fn test_render_parse_roundtrip() {
        let text = r#"{"n": -7, "d": 2.0, "t": "x", "xs": [1, [2]], "o": {"k": false}}"#;
        let value: Value = from_json(text).unwrap();
        assert_eq!(to_json(&value).unwrap(), text);
    }

    #[test]
    fn test_serialize_with_serde_json() {
        let doc = Value::document(
            FieldBuffer::new()
                .with("n", Value::integer(1))
                .with("wait", Value::duration(Duration::from_secs(2))),
        );
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(json, r#"{"n":1,"wait":"2s"}"#);
    }
}
