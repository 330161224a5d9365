// Structural differences between two documents
//
// The result is a list of set/delete operations that turn the first document
// into the second. Fields are visited in name order; array elements by
// index. A value whose type changes is replaced wholesale, nested documents
// and arrays of the same type are compared member by member.

use std::fmt;

use crate::compare::is_equal;
use crate::data::{Payload, Value};
use crate::document::{Array, Document};
use crate::error::Result;
use crate::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Set,
    Delete,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::Set => write!(f, "set"),
            OpKind::Delete => write!(f, "delete"),
        }
    }
}

/// One change: `Set` carries the new value, `Delete` the value removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Op<'a> {
    pub kind: OpKind,
    pub path: Path,
    pub value: Value<'a>,
}

impl<'a> Op<'a> {
    fn set(path: Path, value: Value<'a>) -> Self {
        Op { kind: OpKind::Set, path, value }
    }

    fn delete(path: Path, value: Value<'a>) -> Self {
        Op { kind: OpKind::Delete, path, value }
    }
}

impl fmt::Display for Op<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.kind, self.path, self.value)
    }
}

/// Operations that turn `from` into `to`.
pub fn diff<'a>(from: &dyn Document<'a>, to: &dyn Document<'a>) -> Result<Vec<Op<'a>>> {
    let mut ops = Vec::new();
    diff_documents(&Path::default(), from, to, &mut ops)?;
    Ok(ops)
}

fn sorted_fields<'a>(doc: &dyn Document<'a>) -> Result<Vec<(String, Value<'a>)>> {
    let mut fields = doc
        .fields()
        .map(|field| field.map(|(name, value)| (name.to_string(), value)))
        .collect::<Result<Vec<_>>>()?;
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(fields)
}

fn diff_documents<'a>(
    path: &Path,
    from: &dyn Document<'a>,
    to: &dyn Document<'a>,
    ops: &mut Vec<Op<'a>>,
) -> Result<()> {
    let from = sorted_fields(from)?;
    let to = sorted_fields(to)?;

    let (mut i, mut j) = (0, 0);
    while i < from.len() || j < to.len() {
        match (from.get(i), to.get(j)) {
            (Some((old_name, old)), Some((new_name, new))) if old_name == new_name => {
                diff_values(path.extend_field(old_name.as_str()), old, new, ops)?;
                i += 1;
                j += 1;
            }
            (Some((old_name, old)), Some((new_name, _))) if old_name < new_name => {
                ops.push(Op::delete(path.extend_field(old_name.as_str()), old.clone()));
                i += 1;
            }
            (Some((old_name, old)), None) => {
                ops.push(Op::delete(path.extend_field(old_name.as_str()), old.clone()));
                i += 1;
            }
            (_, Some((new_name, new))) => {
                ops.push(Op::set(path.extend_field(new_name.as_str()), new.clone()));
                j += 1;
            }
            (None, None) => break,
        }
    }
    Ok(())
}

fn diff_arrays<'a>(
    path: &Path,
    from: &dyn Array<'a>,
    to: &dyn Array<'a>,
    ops: &mut Vec<Op<'a>>,
) -> Result<()> {
    let mut old_values = from.values();
    let mut new_values = to.values();
    let mut index = 0;
    loop {
        match (old_values.next().transpose()?, new_values.next().transpose()?) {
            (Some(old), Some(new)) => diff_values(path.extend_index(index), &old, &new, ops)?,
            (Some(old), None) => ops.push(Op::delete(path.extend_index(index), old)),
            (None, Some(new)) => ops.push(Op::set(path.extend_index(index), new)),
            (None, None) => return Ok(()),
        }
        index += 1;
    }
}

fn diff_values<'a>(
    path: Path,
    old: &Value<'a>,
    new: &Value<'a>,
    ops: &mut Vec<Op<'a>>,
) -> Result<()> {
    if old.value_type() != new.value_type() {
        ops.push(Op::set(path, new.clone()));
        return Ok(());
    }
    match (old.decode()?, new.decode()?) {
        (Payload::Document(a), Payload::Document(b)) => diff_documents(&path, a, b, ops),
        (Payload::Array(a), Payload::Array(b)) => diff_arrays(&path, a, b, ops),
        _ => {
            if !is_equal(old, new)? {
                ops.push(Op::set(path, new.clone()));
            }
            Ok(())
        }
    }
}
