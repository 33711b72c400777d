#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use recast::{EnumDef, EnumWire, FieldDef, RecordDef, Shape, TypeScope, TypedValue};

pub fn ival(n: i64) -> TypedValue {
    TypedValue::Int(n)
}

pub fn fval(n: f64) -> TypedValue {
    TypedValue::Float(n)
}

pub fn sval(s: &str) -> TypedValue {
    TypedValue::Str(s.to_owned())
}

pub fn seq(items: Vec<TypedValue>) -> TypedValue {
    TypedValue::Seq(items)
}

pub fn map(entries: Vec<(&str, TypedValue)>) -> TypedValue {
    TypedValue::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect::<BTreeMap<_, _>>(),
    )
}

/// `Point { x: int, y: int }` in a fresh scope.
pub fn point_def() -> Arc<RecordDef> {
    let scope = TypeScope::new();
    RecordDef::declare(
        &scope,
        "Point",
        [],
        [
            FieldDef::new("x", Shape::int()),
            FieldDef::new("y", Shape::int()),
        ],
    )
}

/// String-valued privacy enum, as an API would declare it.
pub fn privacy_enum() -> Arc<EnumDef> {
    EnumDef::new(
        "Privacy",
        [
            ("Public", EnumWire::Str("public".to_owned())),
            ("Unlisted", EnumWire::Str("unlisted".to_owned())),
            ("Private", EnumWire::Str("private".to_owned())),
            ("Direct", EnumWire::Str("direct".to_owned())),
        ],
    )
}

/// Integer-valued enum with two variants.
pub fn small_enum() -> Arc<EnumDef> {
    EnumDef::new("Small", [("A", EnumWire::Int(1)), ("B", EnumWire::Int(2))])
}
