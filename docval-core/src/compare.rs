// Comparison of values across types
//
// Rules are tried in order; the first that applies decides the result:
// 1. Null only equals Null and is never strictly ordered.
// 2. Documents support equality only, regardless of field order.
// 3. Arrays compare element by element; a strict prefix sorts first.
// 4. Booleans compare to booleans and numbers by truthiness (1 or 0).
// 5. Text and blobs compare as raw bytes, with each other too.
// 6. Integers and durations compare as signed 64-bit integers.
// 7. Any other pair of numbers compares as doubles.
// 8. Every other pairing is neither equal nor ordered.

use std::cmp::Ordering;
use std::fmt;

use crate::data::{ArrayValue, DocumentValue, Payload, Value, ValueType};
use crate::document::{Array, Document};
use crate::error::Result;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Gte => ordering != Ordering::Less,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Lte => ordering != Ordering::Greater,
        }
    }

    /// Operator that holds for `b op' a` exactly when `a op b` holds.
    pub fn flip(self) -> Self {
        match self {
            Operator::Eq => Operator::Eq,
            Operator::Gt => Operator::Lt,
            Operator::Gte => Operator::Lte,
            Operator::Lt => Operator::Gt,
            Operator::Lte => Operator::Gte,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
        };
        f.write_str(symbol)
    }
}

/// Evaluate `left op right`.
///
/// Incomparable values yield `Ok(false)`; errors only come from decoding.
pub fn compare(op: Operator, left: &Value<'_>, right: &Value<'_>) -> Result<bool> {
    let (lt, rt) = (left.value_type(), right.value_type());

    if lt == ValueType::Null || rt == ValueType::Null {
        let both = lt == rt;
        return Ok(match op {
            Operator::Eq | Operator::Gte | Operator::Lte => both,
            Operator::Gt | Operator::Lt => false,
        });
    }

    let (lp, rp) = (left.decode()?, right.decode()?);

    match (lp, rp) {
        (Payload::Document(a), Payload::Document(b)) => {
            if op != Operator::Eq {
                return Ok(false);
            }
            documents_equal(a, b)
        }
        (Payload::Array(a), Payload::Array(b)) => compare_arrays(op, a, b),
        (Payload::Bool(_), _) | (_, Payload::Bool(_)) => {
            let comparable = |t: ValueType| t == ValueType::Bool || t.is_number();
            if !comparable(lt) || !comparable(rt) {
                return Ok(false);
            }
            let a = i64::from(left.is_truthy()?);
            let b = i64::from(right.is_truthy()?);
            Ok(op.accepts(a.cmp(&b)))
        }
        _ if lt.is_bytes() && rt.is_bytes() => {
            match (bytes_of(lp), bytes_of(rp)) {
                (Some(a), Some(b)) => Ok(op.accepts(a.cmp(b))),
                _ => Ok(false),
            }
        }
        _ if lt.is_integer_like() && rt.is_integer_like() => {
            match (integer_of(lp), integer_of(rp)) {
                (Some(a), Some(b)) => Ok(op.accepts(a.cmp(&b))),
                _ => Ok(false),
            }
        }
        _ if lt.is_number() && rt.is_number() => {
            match (double_of(lp), double_of(rp)) {
                // NaN is unordered and unequal to everything.
                (Some(a), Some(b)) => Ok(a.partial_cmp(&b).map_or(false, |o| op.accepts(o))),
                _ => Ok(false),
            }
        }
        _ => Ok(false),
    }
}

pub(crate) fn bytes_of<'p>(payload: &'p Payload<'_>) -> Option<&'p [u8]> {
    match payload {
        Payload::Text(s) => Some(s.as_bytes()),
        Payload::Blob(b) => Some(b.as_ref()),
        _ => None,
    }
}

pub(crate) fn integer_of(payload: &Payload<'_>) -> Option<i64> {
    match payload {
        Payload::Integer(n) => Some(*n),
        Payload::Duration(d) => Some(d.as_nanos()),
        _ => None,
    }
}

pub(crate) fn double_of(payload: &Payload<'_>) -> Option<f64> {
    match payload {
        Payload::Double(x) => Some(*x),
        other => integer_of(other).map(|n| n as f64),
    }
}

fn documents_equal(a: &DocumentValue<'_>, b: &DocumentValue<'_>) -> Result<bool> {
    if a.len()? != b.len()? {
        return Ok(false);
    }
    for field in a.fields() {
        let (name, left) = field?;
        let right = match b.get_by_field(name) {
            Ok(v) => v,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        };
        if !compare(Operator::Eq, &left, &right)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn compare_arrays(op: Operator, a: &ArrayValue<'_>, b: &ArrayValue<'_>) -> Result<bool> {
    let mut left = a.values();
    let mut right = b.values();

    loop {
        match (left.next().transpose()?, right.next().transpose()?) {
            (None, None) => {
                return Ok(matches!(op, Operator::Eq | Operator::Gte | Operator::Lte))
            }
            (None, Some(_)) => return Ok(matches!(op, Operator::Lt | Operator::Lte)),
            (Some(_), None) => return Ok(matches!(op, Operator::Gt | Operator::Gte)),
            (Some(l), Some(r)) => {
                if compare(Operator::Eq, &l, &r)? {
                    continue;
                }
                if op == Operator::Eq {
                    return Ok(false);
                }
                return compare(op, &l, &r);
            }
        }
    }
}

pub fn is_equal(left: &Value<'_>, right: &Value<'_>) -> Result<bool> {
    compare(Operator::Eq, left, right)
}

pub fn is_not_equal(left: &Value<'_>, right: &Value<'_>) -> Result<bool> {
    Ok(!is_equal(left, right)?)
}

pub fn is_greater_than(left: &Value<'_>, right: &Value<'_>) -> Result<bool> {
    compare(Operator::Gt, left, right)
}

pub fn is_greater_than_or_equal(left: &Value<'_>, right: &Value<'_>) -> Result<bool> {
    compare(Operator::Gte, left, right)
}

pub fn is_lesser_than(left: &Value<'_>, right: &Value<'_>) -> Result<bool> {
    compare(Operator::Lt, left, right)
}

pub fn is_lesser_than_or_equal(left: &Value<'_>, right: &Value<'_>) -> Result<bool> {
    compare(Operator::Lte, left, right)
}
