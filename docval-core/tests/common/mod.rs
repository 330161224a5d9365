// Test utilities and generators for docval property-based testing

#![allow(dead_code)]

use proptest::prelude::*;
use docval_core::document::{FieldBuffer, ValueBuffer};
use docval_core::{Duration, Value};

/// Integers a double can hold exactly, so numeric order survives a cast.
pub fn arb_safe_integer() -> impl Strategy<Value = i64> {
    -(1i64 << 53)..(1i64 << 53)
}

/// Finite doubles of moderate magnitude
pub fn arb_double() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1e6f64..1e6f64,
        (-1000i64..1000).prop_map(|n| n as f64),
        Just(0.0),
        Just(-0.0),
    ]
}

pub fn arb_field_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}".prop_map(|s| s.to_string())
}

pub fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof!["[a-z]{0,6}", any::<String>()]
}

pub fn arb_blob() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..12)
}

/// Every scalar type, booleans and nulls included
pub fn arb_scalar() -> impl Strategy<Value = Value<'static>> {
    prop_oneof![
        Just(Value::null()),
        any::<bool>().prop_map(Value::bool),
        arb_safe_integer().prop_map(Value::integer),
        arb_double().prop_map(Value::double),
        arb_safe_integer().prop_map(|n| Value::duration(Duration::from_nanos(n))),
        arb_text().prop_map(Value::text),
        arb_blob().prop_map(Value::blob),
    ]
}

/// Scalars whose comparison order is mirrored by index keys: no booleans
/// (they compare with numbers by truthiness but keep their own key tag).
pub fn arb_ordered_scalar() -> impl Strategy<Value = Value<'static>> {
    prop_oneof![
        Just(Value::null()),
        arb_safe_integer().prop_map(Value::integer),
        arb_double().prop_map(Value::double),
        arb_safe_integer().prop_map(|n| Value::duration(Duration::from_nanos(n))),
        arb_text().prop_map(Value::text),
        arb_blob().prop_map(Value::blob),
    ]
}

/// Fields with unique names, in arbitrary order
pub fn arb_fields(
    value: BoxedStrategy<Value<'static>>,
) -> impl Strategy<Value = Vec<(String, Value<'static>)>> {
    prop::collection::btree_map(arb_field_name(), value, 0..6)
        .prop_map(|fields| fields.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

fn nest(leaf: BoxedStrategy<Value<'static>>) -> BoxedStrategy<Value<'static>> {
    leaf.prop_recursive(3, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6)
                .prop_map(|values| Value::array(values.into_iter().collect::<ValueBuffer>())),
            arb_fields(inner).prop_map(|fields| {
                Value::document(fields.into_iter().collect::<FieldBuffer>())
            }),
        ]
    })
    .boxed()
}

/// Arbitrary values with nested arrays and documents
pub fn arb_value() -> BoxedStrategy<Value<'static>> {
    nest(arb_scalar().boxed())
}

/// Nested values built from [`arb_ordered_scalar`]
pub fn arb_ordered_value() -> BoxedStrategy<Value<'static>> {
    nest(arb_ordered_scalar().boxed())
}

/// A document with unique field names, in arbitrary order
pub fn arb_document() -> impl Strategy<Value = FieldBuffer<'static>> {
    arb_fields(arb_value()).prop_map(|fields| fields.into_iter().collect())
}

/// A document together with the name of one of its fields
pub fn arb_document_and_field() -> impl Strategy<Value = (FieldBuffer<'static>, String)> {
    prop::collection::btree_map(arb_field_name(), arb_value(), 1..6)
        .prop_flat_map(|fields| {
            let names = fields.keys().cloned().collect::<Vec<_>>();
            let fields = fields.into_iter().collect::<Vec<_>>();
            (Just(fields).prop_shuffle(), prop::sample::select(names))
        })
        .prop_map(|(fields, name)| (fields.into_iter().collect(), name))
}

/// Scalars that JSON text carries without changing their type. Doubles
/// are kept to short decimals so parsing them back is exact.
pub fn arb_json_scalar() -> impl Strategy<Value = Value<'static>> {
    prop_oneof![
        Just(Value::null()),
        any::<bool>().prop_map(Value::bool),
        arb_safe_integer().prop_map(Value::integer),
        (-4_000_000i64..4_000_000).prop_map(|n| Value::double(n as f64 / 4.0)),
        arb_text().prop_map(Value::text),
    ]
}

/// Nested values made only of [`arb_json_scalar`]
pub fn arb_json_value() -> BoxedStrategy<Value<'static>> {
    nest(arb_json_scalar().boxed())
}

/// Two numbers, or two byte strings: pairs that are always ordered
pub fn arb_ordered_pair() -> impl Strategy<Value = (Value<'static>, Value<'static>)> {
    let number = || {
        prop_oneof![
            arb_safe_integer().prop_map(Value::integer),
            arb_double().prop_map(Value::double),
            arb_safe_integer().prop_map(|n| Value::duration(Duration::from_nanos(n))),
        ]
    };
    let bytes = || {
        prop_oneof![
            arb_text().prop_map(Value::text),
            arb_blob().prop_map(Value::blob),
        ]
    };
    prop_oneof![(number(), number()), (bytes(), bytes())]
}
