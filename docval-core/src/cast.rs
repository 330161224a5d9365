// Conversions between value types

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::data::{Payload, Value, ValueType};
use crate::error::{CastError, Result};
use crate::json;
use crate::time::Duration;

// i64::MIN and i64::MAX + 1 are both exact doubles.
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

impl<'a> Value<'a> {
    /// Convert to `target`. See [`cast_as`].
    pub fn cast_as(&self, target: ValueType) -> Result<Value<'a>> {
        cast_as(self, target)
    }
}

/// Convert `value` to `target`.
///
/// Casting to the current type returns the value unchanged and Null stays
/// Null whatever the target. Every other conversion either follows a rule
/// of the target type or fails with a [`CastError`].
pub fn cast_as<'a>(value: &Value<'a>, target: ValueType) -> Result<Value<'a>> {
    let from = value.value_type();
    if from == target || from == ValueType::Null {
        return Ok(value.clone());
    }

    let payload = value.decode()?;
    let unsupported = CastError::Unsupported { from, to: target };

    let cast = match (target, payload) {
        (ValueType::Bool, Payload::Integer(n)) => Value::bool(*n != 0),
        (ValueType::Bool, Payload::Text(s)) => Value::bool(parse_bool(s).ok_or_else(|| {
            malformed(s, target, "expected one of 1, t, true, 0, f, false")
        })?),

        (ValueType::Integer, Payload::Bool(b)) => Value::integer(i64::from(*b)),
        (ValueType::Integer, Payload::Double(x)) => Value::integer(truncate(*x)?),
        (ValueType::Integer, Payload::Duration(d)) => Value::integer(d.as_nanos()),
        (ValueType::Integer, Payload::Text(s)) => Value::integer(parse_integer(s)?),

        (ValueType::Double, Payload::Integer(n)) => Value::double(*n as f64),
        (ValueType::Double, Payload::Text(s)) => Value::double(
            s.trim()
                .parse::<f64>()
                .map_err(|e| malformed(s, target, e))?,
        ),

        (ValueType::Duration, Payload::Integer(n)) => Value::duration(Duration::from_nanos(*n)),
        (ValueType::Duration, Payload::Text(s)) => {
            Value::duration(s.parse::<Duration>().map_err(|e| malformed(s, target, e))?)
        }

        (ValueType::Text, Payload::Blob(b)) => Value::text(STANDARD.encode(b)),
        (ValueType::Text, Payload::Duration(d)) => Value::text(d.to_string()),
        (ValueType::Text, _) => Value::text(json::to_json(value)?),

        (ValueType::Blob, Payload::Text(s)) => {
            Value::blob(STANDARD.decode(s.as_bytes()).map_err(|e| malformed(s, target, e))?)
        }

        (ValueType::Array, Payload::Text(s)) => {
            let parsed = json::from_json(s).map_err(|e| malformed(s, target, e))?;
            if parsed.value_type() != ValueType::Array {
                return Err(malformed(s, target, "expected a JSON array").into());
            }
            parsed
        }
        (ValueType::Document, Payload::Text(s)) => {
            let parsed = json::from_json(s).map_err(|e| malformed(s, target, e))?;
            if parsed.value_type() != ValueType::Document {
                return Err(malformed(s, target, "expected a JSON object").into());
            }
            parsed
        }

        _ => return Err(unsupported.into()),
    };
    Ok(cast)
}

fn malformed(text: &str, to: ValueType, reason: impl ToString) -> CastError {
    CastError::Malformed {
        value: text.to_string(),
        from: ValueType::Text,
        to,
        reason: reason.to_string(),
    }
}

// Accepted boolean literals; anything else is malformed.
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn truncate(x: f64) -> std::result::Result<i64, CastError> {
    let t = x.trunc();
    if t.is_nan() || !(I64_LOWER..I64_UPPER).contains(&t) {
        return Err(CastError::OutOfRange {
            value: x.to_string(),
            to: ValueType::Integer,
        });
    }
    Ok(t as i64)
}

// Integer literal first, then a float literal truncated toward zero.
fn parse_integer(s: &str) -> Result<i64> {
    let trimmed = s.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n);
    }
    let x = trimmed
        .parse::<f64>()
        .map_err(|e| malformed(s, ValueType::Integer, e))?;
    Ok(truncate(x)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FieldBuffer, ValueBuffer};
    use crate::error::Error;

    fn all_types() -> [ValueType; 9] {
        [
            ValueType::Null,
            ValueType::Bool,
            ValueType::Integer,
            ValueType::Duration,
            ValueType::Double,
            ValueType::Blob,
            ValueType::Text,
            ValueType::Array,
            ValueType::Document,
        ]
    }

    #[test]
    fn test_identity_and_null() {
        let v = Value::integer(9);
        assert_eq!(v.cast_as(ValueType::Integer).unwrap(), v);
        for t in all_types() {
            let cast = Value::null().cast_as(t).unwrap();
            assert!(cast.is_null());
        }
    }

    #[test]
    fn test_to_bool() {
        assert_eq!(
            Value::integer(0).cast_as(ValueType::Bool).unwrap(),
            Value::bool(false)
        );
        assert_eq!(
            Value::integer(-3).cast_as(ValueType::Bool).unwrap(),
            Value::bool(true)
        );
        assert_eq!(
            Value::text("TRUE").cast_as(ValueType::Bool).unwrap(),
            Value::bool(true)
        );
        assert!(matches!(
            Value::text("yes").cast_as(ValueType::Bool),
            Err(Error::Cast(CastError::Malformed { .. }))
        ));
        assert!(matches!(
            Value::double(1.0).cast_as(ValueType::Bool),
            Err(Error::Cast(CastError::Unsupported {
                from: ValueType::Double,
                to: ValueType::Bool
            }))
        ));
    }

    #[test]
    fn test_to_integer() {
        assert_eq!(
            Value::text("12.7").cast_as(ValueType::Integer).unwrap(),
            Value::integer(12)
        );
        assert_eq!(
            Value::text("-12.7").cast_as(ValueType::Integer).unwrap(),
            Value::integer(-12)
        );
        assert_eq!(
            Value::text("9223372036854775807")
                .cast_as(ValueType::Integer)
                .unwrap(),
            Value::integer(i64::MAX)
        );
        assert_eq!(
            Value::double(-3.99).cast_as(ValueType::Integer).unwrap(),
            Value::integer(-3)
        );
        assert_eq!(
            Value::bool(true).cast_as(ValueType::Integer).unwrap(),
            Value::integer(1)
        );
        assert_eq!(
            Value::duration(Duration::from_millis(1))
                .cast_as(ValueType::Integer)
                .unwrap(),
            Value::integer(1_000_000)
        );
        assert!(matches!(
            Value::double(1e19).cast_as(ValueType::Integer),
            Err(Error::Cast(CastError::OutOfRange { .. }))
        ));
        assert!(matches!(
            Value::double(f64::NAN).cast_as(ValueType::Integer),
            Err(Error::Cast(CastError::OutOfRange { .. }))
        ));
        assert!(matches!(
            Value::text("twelve").cast_as(ValueType::Integer),
            Err(Error::Cast(CastError::Malformed { .. }))
        ));
    }

    #[test]
    fn test_to_double_and_duration() {
        assert_eq!(
            Value::integer(3).cast_as(ValueType::Double).unwrap(),
            Value::double(3.0)
        );
        assert_eq!(
            Value::text("2.5").cast_as(ValueType::Double).unwrap(),
            Value::double(2.5)
        );
        assert_eq!(
            Value::text("1m30s").cast_as(ValueType::Duration).unwrap(),
            Value::duration(Duration::from_secs(90))
        );
        assert_eq!(
            Value::integer(5).cast_as(ValueType::Duration).unwrap(),
            Value::duration(Duration::from_nanos(5))
        );
        assert!(Value::text("soon").cast_as(ValueType::Duration).is_err());
    }

    #[test]
    fn test_to_text() {
        let text = |v: Value<'static>| v.cast_as(ValueType::Text).unwrap().to_string();
        assert_eq!(text(Value::integer(7)), r#""7""#);
        assert_eq!(text(Value::double(7.0)), r#""7.0""#);
        assert_eq!(text(Value::bool(true)), r#""true""#);
        assert_eq!(text(Value::blob(b"hi".to_vec())), r#""aGk=""#);
        assert_eq!(
            text(Value::duration(Duration::from_millis(150))),
            r#""150ms""#
        );
        assert_eq!(
            text(Value::array(ValueBuffer::new().with(Value::integer(1)).with("a"))),
            r#""[1, \"a\"]""#
        );
    }

    #[test]
    fn test_blob_from_base64() {
        assert_eq!(
            Value::text("aGk=").cast_as(ValueType::Blob).unwrap(),
            Value::blob(b"hi".to_vec())
        );
        assert!(Value::text("*").cast_as(ValueType::Blob).is_err());
        assert!(Value::integer(1).cast_as(ValueType::Blob).is_err());
    }

    #[test]
    fn test_array_and_document_from_json() {
        let arr = Value::text("[1, \"a\"]").cast_as(ValueType::Array).unwrap();
        assert_eq!(
            arr,
            Value::array(ValueBuffer::new().with(Value::integer(1)).with("a"))
        );

        let doc = Value::text(r#"{"b": 1, "a": 2}"#)
            .cast_as(ValueType::Document)
            .unwrap();
        assert_eq!(
            doc,
            Value::document(
                FieldBuffer::new()
                    .with("a", Value::integer(2))
                    .with("b", Value::integer(1))
            )
        );

        let err = Value::text("not json")
            .cast_as(ValueType::Array)
            .unwrap_err();
        match err {
            Error::Cast(CastError::Malformed {
                ref value, from, to, ..
            }) => {
                assert_eq!(value, "not json");
                assert_eq!(from, ValueType::Text);
                assert_eq!(to, ValueType::Array);
            }
            other => panic!("unexpected error {:?}", other),
        }

        assert!(Value::text("{}").cast_as(ValueType::Array).is_err());
        assert!(Value::text("[]").cast_as(ValueType::Document).is_err());
        assert!(Value::integer(1).cast_as(ValueType::Document).is_err());
    }
}
