// Document and array contracts, plus their in-memory builders

use crate::data::{ArrayValue, DocumentValue, Payload, Value};
use crate::error::{Error, Result};

/// A collection of named values
///
/// Implementations only need to provide `fields`; lookups and callbacks are
/// derived from it. Encoded documents override the lookups to avoid walking
/// every field.
pub trait Document<'a> {
    /// Iterate over the fields in their stored order.
    fn fields(&self) -> Box<dyn Iterator<Item = Result<(&str, Value<'a>)>> + '_>;

    /// Call `f` for every field, stopping at the first error.
    fn iterate(&self, f: &mut dyn FnMut(&str, Value<'a>) -> Result<()>) -> Result<()> {
        for field in self.fields() {
            let (name, value) = field?;
            f(name, value)?;
        }
        Ok(())
    }

    /// Value of the first field named `name`.
    fn get_by_field(&self, name: &str) -> Result<Value<'a>> {
        for field in self.fields() {
            let (field_name, value) = field?;
            if field_name == name {
                return Ok(value);
            }
        }
        Err(Error::field_not_found(name))
    }

    fn len(&self) -> Result<usize> {
        self.fields().try_fold(0, |n, field| field.map(|_| n + 1))
    }

    /// Looks for a first field rather than counting all of them.
    fn is_empty(&self) -> Result<bool> {
        match self.fields().next() {
            None => Ok(true),
            Some(Ok(_)) => Ok(false),
            Some(Err(e)) => Err(e),
        }
    }
}

/// A sequence of values addressed by position
pub trait Array<'a> {
    /// Iterate over the values in positional order.
    fn values(&self) -> Box<dyn Iterator<Item = Result<Value<'a>>> + '_>;

    /// Call `f` with every index and value, stopping at the first error.
    fn iterate(&self, f: &mut dyn FnMut(usize, Value<'a>) -> Result<()>) -> Result<()> {
        for (index, value) in self.values().enumerate() {
            f(index, value?)?;
        }
        Ok(())
    }

    fn get_by_index(&self, index: usize) -> Result<Value<'a>> {
        for (i, value) in self.values().enumerate() {
            let value = value?;
            if i == index {
                return Ok(value);
            }
        }
        Err(Error::index_out_of_bounds(index))
    }

    fn len(&self) -> Result<usize> {
        self.values().try_fold(0, |n, value| value.map(|_| n + 1))
    }
}

/// In-memory document
///
/// Keeps fields in insertion order. Duplicate names are allowed; lookups
/// return the first match.
#[derive(Debug, Clone, Default)]
pub struct FieldBuffer<'a> {
    fields: Vec<(String, Value<'a>)>,
}

impl<'a> FieldBuffer<'a> {
    pub fn new() -> Self {
        FieldBuffer { fields: Vec::new() }
    }

    /// Append a field.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value<'a>>) -> &mut Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Append a field, consuming and returning the buffer.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value<'a>>) -> Self {
        self.add(name, value);
        self
    }

    /// Replace the first field named `name`, or append it if absent.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value<'a>>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Replace the first field named `name`.
    pub fn replace(&mut self, name: &str, value: impl Into<Value<'a>>) -> Result<()> {
        let slot = self
            .fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| Error::field_not_found(name))?;
        slot.1 = value.into();
        Ok(())
    }

    /// Remove the first field named `name`.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        let pos = self
            .fields
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| Error::field_not_found(name))?;
        self.fields.remove(pos);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.fields.clear();
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value<'a>)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Append every field of `doc`. Nested values are shared, not copied.
    pub fn scan_document<D: Document<'a> + ?Sized>(&mut self, doc: &D) -> Result<()> {
        for field in doc.fields() {
            let (name, value) = field?;
            self.add(name, value);
        }
        Ok(())
    }

    /// Append every field of `doc`, turning nested documents and arrays into buffers.
    pub fn copy_document<D: Document<'a> + ?Sized>(&mut self, doc: &D) -> Result<()> {
        for field in doc.fields() {
            let (name, value) = field?;
            self.add(name, deep_copy(value)?);
        }
        Ok(())
    }

    /// Stable sort of the fields by the bytes of their names.
    pub fn sort_by_field(&mut self) {
        self.fields
            .sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));
    }
}

impl<'a> Document<'a> for FieldBuffer<'a> {
    fn fields(&self) -> Box<dyn Iterator<Item = Result<(&str, Value<'a>)>> + '_> {
        Box::new(self.fields.iter().map(|(n, v)| Ok((n.as_str(), v.clone()))))
    }

    fn get_by_field(&self, name: &str) -> Result<Value<'a>> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| Error::field_not_found(name))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.fields.len())
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.fields.is_empty())
    }
}

impl<'a> FromIterator<(String, Value<'a>)> for FieldBuffer<'a> {
    fn from_iter<I: IntoIterator<Item = (String, Value<'a>)>>(iter: I) -> Self {
        FieldBuffer {
            fields: iter.into_iter().collect(),
        }
    }
}

/// In-memory array
#[derive(Debug, Clone, Default)]
pub struct ValueBuffer<'a> {
    values: Vec<Value<'a>>,
}

impl<'a> ValueBuffer<'a> {
    pub fn new() -> Self {
        ValueBuffer { values: Vec::new() }
    }

    pub fn push(&mut self, value: impl Into<Value<'a>>) -> &mut Self {
        self.values.push(value.into());
        self
    }

    pub fn with(mut self, value: impl Into<Value<'a>>) -> Self {
        self.push(value);
        self
    }

    /// Replace the value at `index`.
    pub fn replace(&mut self, index: usize, value: impl Into<Value<'a>>) -> Result<()> {
        let slot = self
            .values
            .get_mut(index)
            .ok_or_else(|| Error::index_out_of_bounds(index))?;
        *slot = value.into();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value<'a>> {
        self.values.iter()
    }

    /// Append every value of `array`. Nested values are shared, not copied.
    pub fn scan_array<A: Array<'a> + ?Sized>(&mut self, array: &A) -> Result<()> {
        for value in array.values() {
            self.values.push(value?);
        }
        Ok(())
    }

    /// Append every value of `array`, turning nested documents and arrays into buffers.
    pub fn copy_array<A: Array<'a> + ?Sized>(&mut self, array: &A) -> Result<()> {
        for value in array.values() {
            self.values.push(deep_copy(value?)?);
        }
        Ok(())
    }
}

impl<'a> Array<'a> for ValueBuffer<'a> {
    fn values(&self) -> Box<dyn Iterator<Item = Result<Value<'a>>> + '_> {
        Box::new(self.values.iter().cloned().map(Ok))
    }

    fn get_by_index(&self, index: usize) -> Result<Value<'a>> {
        self.values
            .get(index)
            .cloned()
            .ok_or_else(|| Error::index_out_of_bounds(index))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.values.len())
    }
}

impl<'a> FromIterator<Value<'a>> for ValueBuffer<'a> {
    fn from_iter<I: IntoIterator<Item = Value<'a>>>(iter: I) -> Self {
        ValueBuffer {
            values: iter.into_iter().collect(),
        }
    }
}

// Scalars are returned as-is; containers are rebuilt as buffers.
fn deep_copy(value: Value<'_>) -> Result<Value<'_>> {
    let copied = match value.decode()? {
        Payload::Array(array) => Some(Value::array(array.to_buffer()?)),
        Payload::Document(doc) => Some(Value::document(doc.to_buffer()?)),
        _ => None,
    };
    Ok(copied.unwrap_or(value))
}

impl<'a> ArrayValue<'a> {
    /// Deep copy into a fresh buffer.
    pub fn to_buffer(&self) -> Result<ValueBuffer<'a>> {
        let mut buf = ValueBuffer::new();
        buf.copy_array(self)?;
        Ok(buf)
    }
}

impl<'a> DocumentValue<'a> {
    /// Deep copy into a fresh buffer.
    pub fn to_buffer(&self) -> Result<FieldBuffer<'a>> {
        let mut buf = FieldBuffer::new();
        buf.copy_document(self)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary;
    use crate::binary::EncodedDocument;

    fn sample() -> FieldBuffer<'static> {
        FieldBuffer::new()
            .with("b", Value::integer(1))
            .with("a", Value::text("x"))
            .with("b", Value::integer(2))
    }

    #[test]
    fn test_field_buffer_preserves_insertion_order() {
        let buf = sample();
        let names: Vec<&str> = buf.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_first_match_wins() {
        let buf = sample();
        assert_eq!(buf.get_by_field("b").unwrap(), Value::integer(1));
        assert!(buf.get_by_field("z").unwrap_err().is_not_found());
    }

    #[test]
    fn test_set_replace_delete() {
        let mut buf = sample();

        buf.set("a", Value::bool(true));
        buf.set("c", Value::null());
        assert_eq!(buf.get_by_field("a").unwrap(), Value::bool(true));
        assert_eq!(buf.len(), 4);

        buf.replace("c", Value::integer(9)).unwrap();
        assert_eq!(buf.get_by_field("c").unwrap(), Value::integer(9));
        assert!(buf.replace("nope", Value::null()).is_err());

        buf.delete("b").unwrap();
        assert_eq!(buf.get_by_field("b").unwrap(), Value::integer(2));
        assert!(buf.delete("nope").unwrap_err().is_not_found());

        buf.reset();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_sort_by_field_is_stable() {
        let mut buf = sample();
        buf.sort_by_field();
        let fields: Vec<(&str, String)> = buf.iter().map(|(n, v)| (n, v.to_string())).collect();
        assert_eq!(
            fields,
            vec![
                ("a", r#""x""#.to_string()),
                ("b", "1".to_string()),
                ("b", "2".to_string())
            ]
        );
    }

    #[test]
    fn test_iterate_stops_on_error() {
        let buf = sample();
        let mut seen = 0;
        let result = buf.iterate(&mut |_, _| {
            seen += 1;
            Err(Error::field_not_found("stop"))
        });
        assert!(result.is_err());
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_value_buffer_lookup_and_replace() {
        let mut arr: ValueBuffer = vec![Value::integer(1), Value::integer(2)]
            .into_iter()
            .collect();
        assert_eq!(arr.get_by_index(1).unwrap(), Value::integer(2));
        assert!(arr.get_by_index(2).unwrap_err().is_not_found());

        arr.replace(0, Value::text("zero")).unwrap();
        assert_eq!(arr.get_by_index(0).unwrap(), Value::text("zero"));
        assert!(arr.replace(5, Value::null()).is_err());
    }

    #[test]
    fn test_copy_document_materializes_nested_values() {
        let inner = FieldBuffer::new().with("n", Value::integer(1));
        let doc = FieldBuffer::new().with("inner", Value::document(inner));
        let encoded = binary::encode_document(&doc).unwrap();
        let enc = EncodedDocument::new(&encoded);

        let mut shallow = FieldBuffer::new();
        shallow.scan_document(&enc).unwrap();
        let nested = shallow.get_by_field("inner").unwrap();
        assert!(nested.raw_bytes().is_some());

        let mut deep = FieldBuffer::new();
        deep.copy_document(&enc).unwrap();
        let nested = deep.get_by_field("inner").unwrap();
        assert!(matches!(
            nested.decode().unwrap(),
            Payload::Document(DocumentValue::Buffer(_))
        ));
        assert_eq!(nested.to_string(), r#"{"n": 1}"#);
    }
}
