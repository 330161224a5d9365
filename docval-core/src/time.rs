// Duration values: signed nanosecond tick counts and their text form

use std::fmt;
use std::str::FromStr;

const NANOSECOND: u64 = 1;
const MICROSECOND: u64 = 1_000 * NANOSECOND;
const MILLISECOND: u64 = 1_000 * MICROSECOND;
const SECOND: u64 = 1_000 * MILLISECOND;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;

/// A signed span of time counted in nanosecond ticks.
#[derive(Ord, PartialOrd, Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub struct Duration(i64);

impl Duration {
    pub const ZERO: Duration = Duration(0);

    pub fn from_nanos(ticks: i64) -> Self {
        Duration(ticks)
    }

    pub fn from_millis(ms: i64) -> Self {
        Duration(ms.saturating_mul(MILLISECOND as i64))
    }

    pub fn from_secs(secs: i64) -> Self {
        Duration(secs.saturating_mul(SECOND as i64))
    }

    pub fn as_nanos(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<i64> for Duration {
    fn from(ticks: i64) -> Self {
        Duration(ticks)
    }
}

impl From<Duration> for i64 {
    fn from(d: Duration) -> Self {
        d.0
    }
}

#[derive(Ord, PartialOrd, Eq, PartialEq, Debug, Clone)]
pub enum ParseDurationError {
    Empty,
    MissingNumber(String),
    MissingUnit(String),
    UnknownUnit(String),
    Overflow(String),
}

impl fmt::Display for ParseDurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseDurationError::Empty => write!(f, "empty duration"),
            ParseDurationError::MissingNumber(s) => {
                write!(f, "expected a number in duration <{}>", s)
            }
            ParseDurationError::MissingUnit(s) => write!(f, "missing unit in duration <{}>", s),
            ParseDurationError::UnknownUnit(u) => write!(f, "unknown unit <{}> in duration", u),
            ParseDurationError::Overflow(s) => write!(f, "duration <{}> overflows", s),
        }
    }
}

impl std::error::Error for ParseDurationError {}

/// Renders as a sequence of unit groups: `0s`, `1.5µs`, `150ms`, `1h2m3.5s`.
impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let neg = self.0 < 0;
        let mut u = self.0.unsigned_abs();

        if u == 0 {
            return f.write_str("0s");
        }

        let mut out = String::new();

        if u < SECOND {
            // Sub-second values use a smaller unit to avoid leading zeros.
            let (prec, unit) = if u < MICROSECOND {
                (0, "ns")
            } else if u < MILLISECOND {
                (3, "µs")
            } else {
                (6, "ms")
            };
            out.push_str(&fmt_frac(u, prec));
            out.push_str(unit);
        } else {
            let frac = fmt_frac(u % SECOND, 9);
            u /= SECOND;

            let secs = u % 60;
            u /= 60;
            let mut tail = format!("{}{}s", secs, frac);

            if u > 0 {
                let mins = u % 60;
                u /= 60;
                tail = format!("{}m{}", mins, tail);
                if u > 0 {
                    tail = format!("{}h{}", u, tail);
                }
            }
            out.push_str(&tail);
        }

        if neg {
            f.write_str("-")?;
        }
        f.write_str(&out)
    }
}

// Formats `v / 10^prec` with trailing zeros of the fraction trimmed. With
// prec 9 and v < 1e9 only the fractional part (".5") is produced.
fn fmt_frac(v: u64, prec: u32) -> String {
    let scale = 10u64.pow(prec);
    let int_part = v / scale;
    let frac_part = v % scale;

    let mut digits = if prec == 9 {
        String::new()
    } else {
        int_part.to_string()
    };

    if frac_part != 0 {
        let frac = format!("{:0width$}", frac_part, width = prec as usize);
        digits.push('.');
        digits.push_str(frac.trim_end_matches('0'));
    }

    digits
}

fn unit_ticks(unit: &str) -> Option<u64> {
    match unit {
        "ns" => Some(NANOSECOND),
        "us" | "µs" | "μs" => Some(MICROSECOND),
        "ms" => Some(MILLISECOND),
        "s" => Some(SECOND),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        _ => None,
    }
}

/// Parses `[-+]?(<decimal><unit>)+`, e.g. `1h30m`, `-1.5s`, `300ms`.
impl FromStr for Duration {
    type Err = ParseDurationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let overflow = || ParseDurationError::Overflow(input.to_string());

        let (neg, mut rest) = match input.as_bytes().first() {
            Some(b'-') => (true, &input[1..]),
            Some(b'+') => (false, &input[1..]),
            Some(_) => (false, input),
            None => return Err(ParseDurationError::Empty),
        };

        if rest == "0" {
            return Ok(Duration::ZERO);
        }
        if rest.is_empty() {
            return Err(ParseDurationError::MissingNumber(input.to_string()));
        }

        let mut total: u64 = 0;
        while !rest.is_empty() {
            let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
            let int_digits = &rest[..int_len];
            rest = &rest[int_len..];

            let mut frac_digits = "";
            if let Some(after_dot) = rest.strip_prefix('.') {
                let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
                frac_digits = &after_dot[..frac_len];
                rest = &after_dot[frac_len..];
            }

            if int_digits.is_empty() && frac_digits.is_empty() {
                return Err(ParseDurationError::MissingNumber(input.to_string()));
            }

            let unit_len = rest
                .char_indices()
                .find(|(_, c)| *c == '.' || c.is_ascii_digit())
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            let unit = &rest[..unit_len];
            rest = &rest[unit_len..];

            if unit.is_empty() {
                return Err(ParseDurationError::MissingUnit(input.to_string()));
            }
            let scale =
                unit_ticks(unit).ok_or_else(|| ParseDurationError::UnknownUnit(unit.to_string()))?;

            let whole: u64 = if int_digits.is_empty() {
                0
            } else {
                int_digits.parse().map_err(|_| overflow())?
            };
            let mut ticks = whole.checked_mul(scale).ok_or_else(overflow)?;

            if !frac_digits.is_empty() {
                // Digits past 18 cannot change the result at nanosecond scale.
                let kept = &frac_digits[..frac_digits.len().min(18)];
                let frac: u64 = kept.parse().map_err(|_| overflow())?;
                let divisor = 10f64.powi(kept.len() as i32);
                ticks = ticks
                    .checked_add((frac as f64 * (scale as f64 / divisor)) as u64)
                    .ok_or_else(overflow)?;
            }

            total = total.checked_add(ticks).ok_or_else(overflow)?;
        }

        if neg {
            if total > i64::MAX as u64 + 1 {
                return Err(overflow());
            }
            Ok(Duration((total as i64).wrapping_neg()))
        } else {
            if total > i64::MAX as u64 {
                return Err(overflow());
            }
            Ok(Duration(total as i64))
        }
    }
}
