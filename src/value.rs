//! Typed domain values produced by loading and consumed by storing.
//!
//! [`TypedValue`] is the closed set of runtime values this engine can
//! produce: scalars, collections, records, enum variants, datetimes,
//! custom opaque values, and the [`TypedValue::Deferred`] placeholder for
//! results that are not available yet. Store-direction dispatch works on
//! the value's [`TypedKind`] tag, never on a static shape.
//!
//! `TypedValue` is intentionally not `Clone`: a pending deferred future
//! has a single owner. Equality treats a deferred as equal to nothing,
//! itself included, and set equality is order-insensitive.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::deferred::Deferred;
use crate::error::ConvertError;
use crate::shape::{CustomDef, EnumDef, RecordDef, ScalarKind};

/// A typed domain value.
pub enum TypedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Ordered sequence.
    Seq(Vec<TypedValue>),
    /// Set with unique elements in first-seen order.
    Set(Vec<TypedValue>),
    /// Fixed-arity tuple.
    Tuple(Vec<TypedValue>),
    /// String-keyed mapping.
    Map(BTreeMap<String, TypedValue>),
    /// Record instance; `fields` follow `def.fields` declaration order.
    Record {
        def: Arc<RecordDef>,
        fields: Vec<TypedValue>,
    },
    /// Enum variant, by index into `def.variants`.
    Enum { def: Arc<EnumDef>, variant: usize },
    DateTime(DateTime<Utc>),
    /// Custom opaque value; `inner` is whatever the codec decoded to.
    Custom {
        def: Arc<CustomDef>,
        inner: Box<TypedValue>,
    },
    /// Placeholder for a result that is still being produced.
    Deferred(Deferred),
}

impl TypedValue {
    /// Wraps a future as a deferred placeholder.
    pub fn deferred<F>(future: F) -> TypedValue
    where
        F: Future<Output = Result<TypedValue, ConvertError>> + Send + 'static,
    {
        TypedValue::Deferred(Deferred::new(future))
    }

    /// Custom-value constructor.
    pub fn custom(def: Arc<CustomDef>, inner: TypedValue) -> TypedValue {
        TypedValue::Custom {
            def,
            inner: Box::new(inner),
        }
    }

    /// Record-instance constructor; panics are avoided by construction
    /// only through the record converter, which supplies fields in
    /// declared order.
    pub fn record(def: Arc<RecordDef>, fields: Vec<TypedValue>) -> TypedValue {
        TypedValue::Record { def, fields }
    }

    /// Looks up a record field by name.
    pub fn field(&self, name: &str) -> Option<&TypedValue> {
        match self {
            TypedValue::Record { def, fields } => {
                def.field_index(name).and_then(|i| fields.get(i))
            }
            _ => None,
        }
    }

    /// The runtime tag of this value.
    pub fn kind(&self) -> TypedKind {
        match self {
            TypedValue::Null => TypedKind::Null,
            TypedValue::Bool(_) => TypedKind::Bool,
            TypedValue::Int(_) => TypedKind::Int,
            TypedValue::Float(_) => TypedKind::Float,
            TypedValue::Str(_) => TypedKind::Str,
            TypedValue::Seq(_) => TypedKind::Seq,
            TypedValue::Set(_) => TypedKind::Set,
            TypedValue::Tuple(_) => TypedKind::Tuple,
            TypedValue::Map(_) => TypedKind::Map,
            TypedValue::Record { .. } => TypedKind::Record,
            TypedValue::Enum { .. } => TypedKind::Enum,
            TypedValue::DateTime(_) => TypedKind::DateTime,
            TypedValue::Custom { .. } => TypedKind::Custom,
            TypedValue::Deferred(_) => TypedKind::Deferred,
        }
    }

    /// Whether this value is a pending deferred placeholder.
    pub fn is_deferred(&self) -> bool {
        matches!(self, TypedValue::Deferred(_))
    }
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &TypedValue) -> bool {
        match (self, other) {
            (TypedValue::Null, TypedValue::Null) => true,
            (TypedValue::Bool(a), TypedValue::Bool(b)) => a == b,
            (TypedValue::Int(a), TypedValue::Int(b)) => a == b,
            (TypedValue::Float(a), TypedValue::Float(b)) => a == b,
            (TypedValue::Str(a), TypedValue::Str(b)) => a == b,
            (TypedValue::Seq(a), TypedValue::Seq(b)) => a == b,
            (TypedValue::Tuple(a), TypedValue::Tuple(b)) => a == b,
            // Set equality is order-insensitive; elements are unique.
            (TypedValue::Set(a), TypedValue::Set(b)) => {
                a.len() == b.len() && a.iter().all(|v| b.contains(v))
            }
            (TypedValue::Map(a), TypedValue::Map(b)) => a == b,
            (
                TypedValue::Record { def: da, fields: fa },
                TypedValue::Record { def: db, fields: fb },
            ) => Arc::ptr_eq(da, db) && fa == fb,
            (
                TypedValue::Enum { def: da, variant: va },
                TypedValue::Enum { def: db, variant: vb },
            ) => Arc::ptr_eq(da, db) && va == vb,
            (TypedValue::DateTime(a), TypedValue::DateTime(b)) => a == b,
            (
                TypedValue::Custom { def: da, inner: ia },
                TypedValue::Custom { def: db, inner: ib },
            ) => Arc::ptr_eq(da, db) && ia == ib,
            // A pending result equals nothing, itself included.
            (TypedValue::Deferred(_), _) | (_, TypedValue::Deferred(_)) => false,
            _ => false,
        }
    }
}

impl fmt::Debug for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Null => f.write_str("Null"),
            TypedValue::Bool(v) => write!(f, "Bool({v})"),
            TypedValue::Int(v) => write!(f, "Int({v})"),
            TypedValue::Float(v) => write!(f, "Float({v})"),
            TypedValue::Str(v) => write!(f, "Str({v:?})"),
            TypedValue::Seq(v) => f.debug_tuple("Seq").field(v).finish(),
            TypedValue::Set(v) => f.debug_tuple("Set").field(v).finish(),
            TypedValue::Tuple(v) => f.debug_tuple("Tuple").field(v).finish(),
            TypedValue::Map(v) => f.debug_tuple("Map").field(v).finish(),
            TypedValue::Record { def, fields } => f
                .debug_struct("Record")
                .field("name", &def.name)
                .field("fields", fields)
                .finish(),
            TypedValue::Enum { def, variant } => {
                let name = def
                    .variants
                    .get(*variant)
                    .map(|v| v.name.as_str())
                    .unwrap_or("?");
                write!(f, "Enum({}::{})", def.name, name)
            }
            TypedValue::DateTime(v) => write!(f, "DateTime({v})"),
            TypedValue::Custom { def, inner } => f
                .debug_struct("Custom")
                .field("name", &def.name)
                .field("inner", inner)
                .finish(),
            TypedValue::Deferred(_) => f.write_str("Deferred(<pending>)"),
        }
    }
}

/// Runtime tag of a [`TypedValue`], used for store-direction dispatch and
/// registry caching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypedKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Seq,
    Set,
    Tuple,
    Map,
    Record,
    Enum,
    DateTime,
    Custom,
    Deferred,
}

impl fmt::Display for TypedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypedKind::Null => "null",
            TypedKind::Bool => "bool",
            TypedKind::Int => "int",
            TypedKind::Float => "float",
            TypedKind::Str => "str",
            TypedKind::Seq => "seq",
            TypedKind::Set => "set",
            TypedKind::Tuple => "tuple",
            TypedKind::Map => "map",
            TypedKind::Record => "record",
            TypedKind::Enum => "enum",
            TypedKind::DateTime => "datetime",
            TypedKind::Custom => "custom",
            TypedKind::Deferred => "deferred",
        };
        f.write_str(name)
    }
}

/// Names the kind of a dynamic JSON value for diagnostics.
///
/// Numbers are split into `int` and `float` the same way scalar loading
/// splits them: an integral JSON number is an `int`, everything else a
/// `float`.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.as_i64().is_some() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Converts a dynamic value to a scalar typed value when its kind exactly
/// matches `kind`. No cross-casting between integers and floats.
pub(crate) fn scalar_from(value: &Value, kind: ScalarKind) -> Option<TypedValue> {
    match (kind, value) {
        (ScalarKind::Null, Value::Null) => Some(TypedValue::Null),
        (ScalarKind::Bool, Value::Bool(b)) => Some(TypedValue::Bool(*b)),
        (ScalarKind::Int, Value::Number(n)) => n.as_i64().map(TypedValue::Int),
        (ScalarKind::Float, Value::Number(n)) if n.as_i64().is_none() => {
            n.as_f64().map(TypedValue::Float)
        }
        (ScalarKind::Str, Value::String(s)) => Some(TypedValue::Str(s.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_kind_splits_numbers() {
        assert_eq!(json_kind(&serde_json::json!(2)), "int");
        assert_eq!(json_kind(&serde_json::json!(2.5)), "float");
        assert_eq!(json_kind(&serde_json::json!(2.0)), "float");
    }

    #[test]
    fn scalars_do_not_cross_cast() {
        assert!(scalar_from(&serde_json::json!(2), ScalarKind::Float).is_none());
        assert!(scalar_from(&serde_json::json!(2.0), ScalarKind::Int).is_none());
        assert_eq!(
            scalar_from(&serde_json::json!(2), ScalarKind::Int),
            Some(TypedValue::Int(2))
        );
    }

    #[test]
    fn set_equality_ignores_order() {
        let a = TypedValue::Set(vec![TypedValue::Int(1), TypedValue::Int(2)]);
        let b = TypedValue::Set(vec![TypedValue::Int(2), TypedValue::Int(1)]);
        assert_eq!(a, b);
    }

    #[test]
    fn deferred_equals_nothing() {
        let d = TypedValue::deferred(async { Ok(TypedValue::Null) });
        assert_ne!(d, TypedValue::Null);
    }
}
