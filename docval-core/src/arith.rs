// Arithmetic and bitwise operators over values
//
// Only numbers take part: any other operand (Null and booleans included)
// makes the result Null, as does dividing by zero. A Double on either side
// switches the whole operation to floating point.

use std::fmt;

use crate::compare::{double_of, integer_of};
use crate::data::{Value, ValueType};
use crate::error::Result;
use crate::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
}

impl fmt::Display for ArithmeticOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ArithmeticOperator::Add => "+",
            ArithmeticOperator::Sub => "-",
            ArithmeticOperator::Mul => "*",
            ArithmeticOperator::Div => "/",
            ArithmeticOperator::Rem => "%",
            ArithmeticOperator::BitAnd => "&",
            ArithmeticOperator::BitOr => "|",
            ArithmeticOperator::BitXor => "^",
        };
        f.write_str(symbol)
    }
}

/// Apply `op` to two values.
pub fn calculate<'r>(op: ArithmeticOperator, a: &Value<'_>, b: &Value<'_>) -> Result<Value<'r>> {
    let (at, bt) = (a.value_type(), b.value_type());
    if !at.is_number() || !bt.is_number() {
        return Ok(Value::null());
    }

    let (ap, bp) = (a.decode()?, b.decode()?);

    if at == ValueType::Double || bt == ValueType::Double {
        return Ok(match (double_of(ap), double_of(bp)) {
            (Some(x), Some(y)) => calculate_doubles(op, x, y),
            _ => Value::null(),
        });
    }

    let result = match (integer_of(ap), integer_of(bp)) {
        (Some(x), Some(y)) => calculate_integers(op, x, y),
        _ => Value::null(),
    };

    // Adding or subtracting two durations yields a duration.
    let both_durations = at == ValueType::Duration && bt == ValueType::Duration;
    if both_durations && matches!(op, ArithmeticOperator::Add | ArithmeticOperator::Sub) {
        if let Some(ticks) = integer_of(result.decode()?) {
            return Ok(Value::duration(Duration::from_nanos(ticks)));
        }
    }
    Ok(result)
}

// Overflowing +, - and * fall back to a double result.
fn calculate_integers<'r>(op: ArithmeticOperator, a: i64, b: i64) -> Value<'r> {
    let checked = |r: Option<i64>, fallback: f64| match r {
        Some(n) => Value::integer(n),
        None => Value::double(fallback),
    };

    match op {
        ArithmeticOperator::Add => checked(a.checked_add(b), a as f64 + b as f64),
        ArithmeticOperator::Sub => checked(a.checked_sub(b), a as f64 - b as f64),
        ArithmeticOperator::Mul => checked(a.checked_mul(b), a as f64 * b as f64),
        ArithmeticOperator::Div if b == 0 => Value::null(),
        ArithmeticOperator::Div => checked(a.checked_div(b), a as f64 / b as f64),
        ArithmeticOperator::Rem if b == 0 => Value::null(),
        ArithmeticOperator::Rem => Value::integer(a.wrapping_rem(b)),
        ArithmeticOperator::BitAnd => Value::integer(a & b),
        ArithmeticOperator::BitOr => Value::integer(a | b),
        ArithmeticOperator::BitXor => Value::integer(a ^ b),
    }
}

fn calculate_doubles<'r>(op: ArithmeticOperator, a: f64, b: f64) -> Value<'r> {
    match op {
        ArithmeticOperator::Add => Value::double(a + b),
        ArithmeticOperator::Sub => Value::double(a - b),
        ArithmeticOperator::Mul => Value::double(a * b),
        ArithmeticOperator::Div if b == 0.0 => Value::null(),
        ArithmeticOperator::Div => Value::double(a / b),
        ArithmeticOperator::Rem => {
            let r = a % b;
            if r.is_nan() {
                Value::null()
            } else {
                Value::double(r)
            }
        }
        // Bitwise operators work on the truncated integers.
        ArithmeticOperator::BitAnd => Value::integer((a as i64) & (b as i64)),
        ArithmeticOperator::BitOr => Value::integer((a as i64) | (b as i64)),
        ArithmeticOperator::BitXor => Value::integer((a as i64) ^ (b as i64)),
    }
}

#[allow(clippy::should_implement_trait)]
impl Value<'_> {
    pub fn add<'r>(&self, other: &Value<'_>) -> Result<Value<'r>> {
        calculate(ArithmeticOperator::Add, self, other)
    }

    pub fn sub<'r>(&self, other: &Value<'_>) -> Result<Value<'r>> {
        calculate(ArithmeticOperator::Sub, self, other)
    }

    pub fn mul<'r>(&self, other: &Value<'_>) -> Result<Value<'r>> {
        calculate(ArithmeticOperator::Mul, self, other)
    }

    pub fn div<'r>(&self, other: &Value<'_>) -> Result<Value<'r>> {
        calculate(ArithmeticOperator::Div, self, other)
    }

    pub fn rem<'r>(&self, other: &Value<'_>) -> Result<Value<'r>> {
        calculate(ArithmeticOperator::Rem, self, other)
    }

    pub fn bit_and<'r>(&self, other: &Value<'_>) -> Result<Value<'r>> {
        calculate(ArithmeticOperator::BitAnd, self, other)
    }

    pub fn bit_or<'r>(&self, other: &Value<'_>) -> Result<Value<'r>> {
        calculate(ArithmeticOperator::BitOr, self, other)
    }

    pub fn bit_xor<'r>(&self, other: &Value<'_>) -> Result<Value<'r>> {
        calculate(ArithmeticOperator::BitXor, self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value<'static> {
        Value::integer(n)
    }

    fn assert_same(actual: Value<'_>, expected: Value<'_>) {
        assert_eq!(actual.value_type(), expected.value_type());
        if !expected.is_null() {
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn test_integer_ops() {
        assert_same(int(2).add(&int(3)).unwrap(), int(5));
        assert_same(int(2).sub(&int(3)).unwrap(), int(-1));
        assert_same(int(4).mul(&int(-3)).unwrap(), int(-12));
        assert_same(int(7).div(&int(2)).unwrap(), int(3));
        assert_same(int(-7).rem(&int(2)).unwrap(), int(-1));
        assert_same(int(6).bit_and(&int(3)).unwrap(), int(2));
        assert_same(int(6).bit_or(&int(3)).unwrap(), int(7));
        assert_same(int(6).bit_xor(&int(3)).unwrap(), int(5));
    }

    #[test]
    fn test_overflow_falls_back_to_double() {
        assert_same(
            int(i64::MAX).add(&int(1)).unwrap(),
            Value::double(i64::MAX as f64 + 1.0),
        );
        assert_same(
            int(i64::MIN).sub(&int(1)).unwrap(),
            Value::double(i64::MIN as f64 - 1.0),
        );
        assert_same(
            int(i64::MAX).mul(&int(2)).unwrap(),
            Value::double(i64::MAX as f64 * 2.0),
        );
        assert_same(
            int(i64::MIN).div(&int(-1)).unwrap(),
            Value::double(-(i64::MIN as f64)),
        );
        assert_same(int(i64::MIN).rem(&int(-1)).unwrap(), int(0));
    }

    #[test]
    fn test_doubles_win() {
        assert_same(int(1).add(&Value::double(0.5)).unwrap(), Value::double(1.5));
        assert_same(
            Value::double(7.5).rem(&Value::double(2.0)).unwrap(),
            Value::double(1.5),
        );
        assert_same(Value::double(6.9).bit_and(&int(3)).unwrap(), int(2));
    }

    #[test]
    fn test_null_results() {
        assert_same(int(1).div(&int(0)).unwrap(), Value::null());
        assert_same(int(1).rem(&int(0)).unwrap(), Value::null());
        assert_same(Value::double(1.0).div(&Value::double(0.0)).unwrap(), Value::null());
        assert_same(Value::double(1.0).rem(&Value::double(0.0)).unwrap(), Value::null());
        assert_same(Value::null().add(&int(1)).unwrap(), Value::null());
        assert_same(Value::bool(true).add(&int(1)).unwrap(), Value::null());
        assert_same(Value::text("1").add(&int(1)).unwrap(), Value::null());
    }

    #[test]
    fn test_durations() {
        let a = Value::duration(Duration::from_secs(1));
        let b = Value::duration(Duration::from_millis(500));
        assert_same(
            a.add(&b).unwrap(),
            Value::duration(Duration::from_millis(1500)),
        );
        assert_same(a.mul(&int(2)).unwrap(), int(2_000_000_000));
    }
}
