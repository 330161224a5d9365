// Error types for docval

use std::error::Error as StdError;
use std::fmt;

use crate::data::ValueType;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by every layer of the value model and its codecs
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Lookup(LookupError),
    Cast(CastError),
    Decode(DecodeError),
    Encode(EncodeError),
}

/// Misses when probing a document or an array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    FieldNotFound(String),
    IndexOutOfBounds(usize),
}

/// Conversion failures between value types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastError {
    /// No conversion rule exists between the two types.
    Unsupported { from: ValueType, to: ValueType },
    /// The source value does not parse as the target type.
    Malformed {
        value: String,
        from: ValueType,
        to: ValueType,
        reason: String,
    },
    /// The source value parses but does not fit the target type.
    OutOfRange { value: String, to: ValueType },
}

/// Corrupted or truncated encoded buffers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    TruncatedVarint,
    VarintOverflow,
    HeaderOutOfBounds { size: u64, available: usize },
    TruncatedHeader(&'static str),
    FieldCountMismatch { declared: u64, found: usize },
    FieldOutOfBounds { offset: u64, size: u64, body: usize },
    InvalidTypeTag(u64),
    InvalidLength {
        kind: ValueType,
        expected: usize,
        actual: usize,
    },
    InvalidUtf8(String),
    InvalidIndex { expected: usize, found: String },
}

/// Values that have no representation in a target format
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeError {
    NonFiniteDouble(f64),
    Json(String),
}

impl Error {
    /// True for field and index misses, which callers routinely treat as "absent".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Lookup(_))
    }

    pub(crate) fn field_not_found(field: &str) -> Self {
        Error::Lookup(LookupError::FieldNotFound(field.to_string()))
    }

    pub(crate) fn index_out_of_bounds(index: usize) -> Self {
        Error::Lookup(LookupError::IndexOutOfBounds(index))
    }
}

// Error trait implementations

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Lookup(e) => Some(e),
            Error::Cast(e) => Some(e),
            Error::Decode(e) => Some(e),
            Error::Encode(e) => Some(e),
        }
    }
}

impl StdError for LookupError {}
impl StdError for CastError {}
impl StdError for DecodeError {}
impl StdError for EncodeError {}

// Display implementations

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Lookup(e) => write!(f, "{}", e),
            Error::Cast(e) => write!(f, "Cast error: {}", e),
            Error::Decode(e) => write!(f, "Decode error: {}", e),
            Error::Encode(e) => write!(f, "Encode error: {}", e),
        }
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::FieldNotFound(field) => write!(f, "field not found: {}", field),
            LookupError::IndexOutOfBounds(index) => write!(f, "index out of bounds: {}", index),
        }
    }
}

impl fmt::Display for CastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CastError::Unsupported { from, to } => {
                write!(f, "cannot cast {} as {}", from, to)
            }
            CastError::Malformed {
                value,
                from,
                to,
                reason,
            } => {
                write!(
                    f,
                    "cannot cast {} {:?} as {}: {}",
                    from, value, to, reason
                )
            }
            CastError::OutOfRange { value, to } => {
                write!(f, "cannot cast {} as {} without overflowing", value, to)
            }
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::TruncatedVarint => write!(f, "truncated varint"),
            DecodeError::VarintOverflow => write!(f, "varint overflows 64 bits"),
            DecodeError::HeaderOutOfBounds { size, available } => {
                write!(
                    f,
                    "header size {} exceeds the {} bytes available",
                    size, available
                )
            }
            DecodeError::TruncatedHeader(what) => {
                write!(f, "header truncated while reading {}", what)
            }
            DecodeError::FieldCountMismatch { declared, found } => {
                write!(
                    f,
                    "header declares {} fields but contains {}",
                    declared, found
                )
            }
            DecodeError::FieldOutOfBounds { offset, size, body } => {
                write!(
                    f,
                    "field at offset {} with size {} overruns body of {} bytes",
                    offset, size, body
                )
            }
            DecodeError::InvalidTypeTag(tag) => write!(f, "invalid type tag: {:#x}", tag),
            DecodeError::InvalidLength {
                kind,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "{} value must be {} bytes, got {}",
                    kind, expected, actual
                )
            }
            DecodeError::InvalidUtf8(msg) => write!(f, "invalid utf-8: {}", msg),
            DecodeError::InvalidIndex { expected, found } => {
                write!(f, "expected array index {}, found {:?}", expected, found)
            }
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::NonFiniteDouble(x) => {
                write!(f, "double {} has no JSON representation", x)
            }
            EncodeError::Json(msg) => write!(f, "JSON serialization failed: {}", msg),
        }
    }
}

// Convenience From implementations for error composition

impl From<LookupError> for Error {
    fn from(error: LookupError) -> Self {
        Error::Lookup(error)
    }
}

impl From<CastError> for Error {
    fn from(error: CastError) -> Self {
        Error::Cast(error)
    }
}

impl From<DecodeError> for Error {
    fn from(error: DecodeError) -> Self {
        Error::Decode(error)
    }
}

impl From<EncodeError> for Error {
    fn from(error: EncodeError) -> Self {
        Error::Encode(error)
    }
}

impl From<serde_json::Error> for EncodeError {
    fn from(error: serde_json::Error) -> Self {
        EncodeError::Json(error.to_string())
    }
}

impl From<std::str::Utf8Error> for DecodeError {
    fn from(error: std::str::Utf8Error) -> Self {
        DecodeError::InvalidUtf8(error.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(error: std::str::Utf8Error) -> Self {
        Error::Decode(error.into())
    }
}
