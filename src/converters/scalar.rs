//! Scalar conversion.

use serde_json::Value;

use crate::convert::{Load, LoadContext, Store, StoreContext};
use crate::error::ConvertError;
use crate::shape::Shape;
use crate::value::{TypedValue, scalar_from};

/// Converts the scalar shapes: null, bool, int, float, str.
///
/// The dynamic value's runtime kind must exactly equal the requested
/// scalar kind; integers and floats are never cross-cast.
pub struct ScalarConverter;

impl Load for ScalarConverter {
    fn can_load(&self, shape: &Shape) -> bool {
        matches!(shape, Shape::Scalar(_))
    }

    fn load(
        &self,
        _ctx: &mut LoadContext,
        value: &Value,
        shape: &Shape,
    ) -> Result<TypedValue, ConvertError> {
        match shape {
            Shape::Scalar(kind) => {
                scalar_from(value, *kind).ok_or_else(|| ConvertError::mismatch(shape, value))
            }
            _ => Err(ConvertError::NoLoader {
                shape: shape.to_string(),
            }),
        }
    }
}

impl Store for ScalarConverter {
    fn can_store(&self, value: &TypedValue) -> bool {
        matches!(
            value,
            TypedValue::Null
                | TypedValue::Bool(_)
                | TypedValue::Int(_)
                | TypedValue::Float(_)
                | TypedValue::Str(_)
        )
    }

    fn store(&self, _ctx: &mut StoreContext, value: &TypedValue) -> Result<Value, ConvertError> {
        match value {
            TypedValue::Null => Ok(Value::Null),
            TypedValue::Bool(b) => Ok(Value::Bool(*b)),
            TypedValue::Int(n) => Ok(Value::from(*n)),
            TypedValue::Float(n) => Ok(Value::from(*n)),
            TypedValue::Str(s) => Ok(Value::String(s.clone())),
            other => Err(ConvertError::NoStore {
                kind: other.kind().to_string(),
            }),
        }
    }
}
