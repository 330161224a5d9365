// Paths to values nested inside documents and arrays

use std::fmt;
use std::str::FromStr;

use crate::data::{Payload, Value};
use crate::document::{Array, Document};
use crate::error::{Error, Result};

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathFragment {
    Field(String),
    Index(usize),
}

/// Location of a value, e.g. `a.b[0].c`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path(Vec<PathFragment>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsePathError {
    Empty,
    EmptyField(String),
    UnterminatedIndex(String),
    InvalidIndex(String),
    UnexpectedCharacter(String),
}

impl fmt::Display for ParsePathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsePathError::Empty => write!(f, "empty path"),
            ParsePathError::EmptyField(p) => write!(f, "empty field name in path <{}>", p),
            ParsePathError::UnterminatedIndex(p) => write!(f, "unterminated index in path <{}>", p),
            ParsePathError::InvalidIndex(i) => write!(f, "invalid array index <{}>", i),
            ParsePathError::UnexpectedCharacter(p) => {
                write!(f, "unexpected character in path <{}>", p)
            }
        }
    }
}

impl std::error::Error for ParsePathError {}

impl Path {
    pub fn new(fragments: Vec<PathFragment>) -> Self {
        Path(fragments)
    }

    /// Build a path from raw parts; parts that parse as a number become indexes.
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fragments = parts
            .into_iter()
            .map(|part| {
                let part = part.as_ref();
                match part.parse::<usize>() {
                    Ok(index) => PathFragment::Index(index),
                    Err(_) => PathFragment::Field(part.to_string()),
                }
            })
            .collect();
        Path(fragments)
    }

    pub fn fragments(&self) -> &[PathFragment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of this path with one more fragment.
    pub fn extend(&self, fragment: PathFragment) -> Path {
        let mut fragments = self.0.clone();
        fragments.push(fragment);
        Path(fragments)
    }

    pub fn extend_field(&self, name: impl Into<String>) -> Path {
        self.extend(PathFragment::Field(name.into()))
    }

    pub fn extend_index(&self, index: usize) -> Path {
        self.extend(PathFragment::Index(index))
    }

    /// Resolve the path starting at a document; the first step must be a field.
    pub fn get_value_from_document<'a, D: Document<'a> + ?Sized>(
        &self,
        doc: &D,
    ) -> Result<Value<'a>> {
        match self.0.split_first() {
            Some((PathFragment::Field(name), rest)) => self.walk(doc.get_by_field(name), rest),
            _ => Err(self.not_found()),
        }
    }

    /// Resolve the path starting at an array; the first step must be an index.
    pub fn get_value_from_array<'a, A: Array<'a> + ?Sized>(&self, array: &A) -> Result<Value<'a>> {
        match self.0.split_first() {
            Some((PathFragment::Index(index), rest)) => {
                self.walk(array.get_by_index(*index), rest)
            }
            _ => Err(self.not_found()),
        }
    }

    /// Resolve the path starting at a document or array value.
    pub fn get_value<'a>(&self, value: &Value<'a>) -> Result<Value<'a>> {
        if self.0.is_empty() {
            return Err(self.not_found());
        }
        self.walk(Ok(value.clone()), &self.0)
    }

    fn walk<'a>(&self, first: Result<Value<'a>>, rest: &[PathFragment]) -> Result<Value<'a>> {
        let mut current = first.map_err(|e| self.miss(e))?;
        for fragment in rest {
            let next = match (current.decode()?, fragment) {
                (Payload::Document(doc), PathFragment::Field(name)) => doc.get_by_field(name),
                (Payload::Array(array), PathFragment::Index(index)) => {
                    array.get_by_index(*index)
                }
                _ => return Err(self.not_found()),
            };
            current = next.map_err(|e| self.miss(e))?;
        }
        Ok(current)
    }

    fn not_found(&self) -> Error {
        Error::field_not_found(&self.to_string())
    }

    // Lookup misses at any depth are reported against the whole path.
    fn miss(&self, e: Error) -> Error {
        if e.is_not_found() {
            self.not_found()
        } else {
            e
        }
    }
}

impl From<Vec<PathFragment>> for Path {
    fn from(fragments: Vec<PathFragment>) -> Self {
        Path(fragments)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, fragment) in self.0.iter().enumerate() {
            match fragment {
                PathFragment::Field(name) => {
                    if i != 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                PathFragment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = ParsePathError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParsePathError::Empty);
        }

        let mut fragments = Vec::new();
        let mut rest = s;
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let end = after
                    .find(']')
                    .ok_or_else(|| ParsePathError::UnterminatedIndex(s.to_string()))?;
                let digits = &after[..end];
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| ParsePathError::InvalidIndex(digits.to_string()))?;
                fragments.push(PathFragment::Index(index));
                rest = &after[end + 1..];
                continue;
            }

            if !fragments.is_empty() {
                rest = rest
                    .strip_prefix('.')
                    .ok_or_else(|| ParsePathError::UnexpectedCharacter(s.to_string()))?;
            }
            let end = rest
                .find(|c: char| c == '.' || c == '[' || c == ']')
                .unwrap_or(rest.len());
            if end == 0 {
                return Err(ParsePathError::EmptyField(s.to_string()));
            }
            fragments.push(PathFragment::Field(rest[..end].to_string()));
            rest = &rest[end..];
        }

        Ok(Path(fragments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::{encode_document, EncodedDocument};
    use crate::document::{FieldBuffer, ValueBuffer};
    use crate::error::LookupError;

    fn sample() -> FieldBuffer<'static> {
        FieldBuffer::new().with(
            "a",
            Value::document(
                FieldBuffer::new().with(
                    "b",
                    Value::array(
                        ValueBuffer::new()
                            .with(Value::document(
                                FieldBuffer::new().with("c", Value::integer(7)),
                            ))
                            .with(Value::text("second")),
                    ),
                ),
            ),
        )
    }

    #[test]
    fn test_parse_and_render() {
        let path: Path = "a.b[0].c".parse().unwrap();
        assert_eq!(
            path.fragments(),
            &[
                PathFragment::Field("a".to_string()),
                PathFragment::Field("b".to_string()),
                PathFragment::Index(0),
                PathFragment::Field("c".to_string()),
            ]
        );
        assert_eq!(path.to_string(), "a.b[0].c");
        assert_eq!("[3][1]".parse::<Path>().unwrap().to_string(), "[3][1]");
        assert_eq!(
            Path::from_parts(["a", "1", "b"]).to_string(),
            "a[1].b"
        );
        assert_eq!(Path::default().extend_field("x").extend_index(2).to_string(), "x[2]");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Path>(), Err(ParsePathError::Empty));
        assert!(matches!("a..b".parse::<Path>(), Err(ParsePathError::EmptyField(_))));
        assert!(matches!(".a".parse::<Path>(), Err(ParsePathError::EmptyField(_))));
        assert!(matches!(
            "a[1".parse::<Path>(),
            Err(ParsePathError::UnterminatedIndex(_))
        ));
        assert!(matches!(
            "a[x]".parse::<Path>(),
            Err(ParsePathError::InvalidIndex(_))
        ));
        assert!(matches!(
            "a]".parse::<Path>(),
            Err(ParsePathError::UnexpectedCharacter(_))
        ));
    }

    #[test]
    fn test_resolve_in_buffers_and_encoded() {
        let doc = sample();
        let path: Path = "a.b[0].c".parse().unwrap();
        assert_eq!(path.get_value_from_document(&doc).unwrap(), Value::integer(7));

        let encoded = encode_document(&doc).unwrap();
        let enc = EncodedDocument::new(&encoded);
        assert_eq!(path.get_value_from_document(&enc).unwrap(), Value::integer(7));

        let second: Path = "a.b[1]".parse().unwrap();
        assert_eq!(
            second.get_value_from_document(&enc).unwrap(),
            Value::text("second")
        );
    }

    #[test]
    fn test_misses() {
        let doc = sample();
        for p in ["a.x", "a.b[5]", "a.b.c", "a[0]", "a.b[1].c", "[0]"] {
            let path: Path = p.parse().unwrap();
            let err = path.get_value_from_document(&doc).unwrap_err();
            assert_eq!(
                err,
                Error::Lookup(LookupError::FieldNotFound(p.to_string())),
                "path {}",
                p
            );
        }
    }

    #[test]
    fn test_resolve_from_array() {
        let arr = ValueBuffer::new().with(Value::array(ValueBuffer::new().with(Value::integer(4))));
        let path: Path = "[0][0]".parse().unwrap();
        assert_eq!(path.get_value_from_array(&arr).unwrap(), Value::integer(4));
        // Walking a value applies every fragment to it, the first one included.
        let value = Value::array(arr);
        let nested: Path = "[0][0]".parse().unwrap();
        assert_eq!(nested.get_value(&value).unwrap(), Value::integer(4));
        let too_deep: Path = "[0][0][0]".parse().unwrap();
        assert!(too_deep.get_value(&value).unwrap_err().is_not_found());
    }
}
