//! The open dynamic-value shape.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::convert::{Load, LoadContext};
use crate::error::ConvertError;
use crate::shape::Shape;
use crate::value::TypedValue;

/// Loads [`Shape::Any`]: mirrors the JSON tree into a typed value
/// verbatim, with integral numbers as ints and everything else as floats.
///
/// Load-only; the store direction needs no counterpart because every
/// mirrored value is covered by the scalar/collection store converters.
pub struct AnyConverter;

/// Structural mirror of a dynamic value.
pub(crate) fn from_dynamic(value: &Value) -> TypedValue {
    match value {
        Value::Null => TypedValue::Null,
        Value::Bool(b) => TypedValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => TypedValue::Int(i),
            // Out-of-range u64 also lands here; f64 is the widest we keep.
            None => TypedValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => TypedValue::Str(s.clone()),
        Value::Array(items) => TypedValue::Seq(items.iter().map(from_dynamic).collect()),
        Value::Object(entries) => TypedValue::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), from_dynamic(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

impl Load for AnyConverter {
    fn can_load(&self, shape: &Shape) -> bool {
        matches!(shape, Shape::Any)
    }

    fn load(
        &self,
        _ctx: &mut LoadContext,
        value: &Value,
        _shape: &Shape,
    ) -> Result<TypedValue, ConvertError> {
        Ok(from_dynamic(value))
    }
}
