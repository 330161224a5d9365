//! Values and documents for an embedded document database.
//!
//! A [`Value`] is a typed scalar, array or document. Documents and arrays
//! either live in memory ([`FieldBuffer`], [`ValueBuffer`]) or are read
//! lazily from their binary encoding ([`EncodedDocument`], [`EncodedArray`]),
//! in which case only the fields that are looked at get decoded.
//!
//! On top of the model sit casting ([`cast`]), cross-type comparison
//! ([`compare`]), arithmetic ([`arith`]), JSON text ([`json`]), path lookup
//! ([`path`]), document differences ([`diff`](mod@diff)) and an
//! order-preserving key encoding for indexes ([`key`]).

pub mod arith;
pub mod binary;
pub mod cast;
pub mod compare;
pub mod data;
pub mod diff;
pub mod document;
pub mod error;
pub mod json;
pub mod key;
pub mod path;
pub mod time;
pub mod varint;

pub use arith::ArithmeticOperator;
pub use binary::{decode_value, encode_array, encode_document, EncodedArray, EncodedDocument};
pub use compare::Operator;
pub use data::{ArrayValue, DocumentValue, Payload, Value, ValueType};
pub use diff::{diff, Op, OpKind};
pub use document::{Array, Document, FieldBuffer, ValueBuffer};
pub use error::{Error, Result};
pub use key::{encode_key, KeyConfig, KeyEncoder};
pub use path::{Path, PathFragment};
pub use time::Duration;
