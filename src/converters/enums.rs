//! Enum conversion.

use serde_json::Value;

use crate::convert::{Load, LoadContext, Store, StoreContext};
use crate::error::ConvertError;
use crate::shape::{EnumWire, Shape};
use crate::value::TypedValue;

/// Converts enum types with string or integer wire values.
///
/// Loading matches the dynamic value against each variant's wire value;
/// anything but a matching string or integer is a shape mismatch. Storing
/// emits the variant's wire value.
pub struct EnumConverter;

impl Load for EnumConverter {
    fn can_load(&self, shape: &Shape) -> bool {
        matches!(shape, Shape::Enum(_))
    }

    fn load(
        &self,
        _ctx: &mut LoadContext,
        value: &Value,
        shape: &Shape,
    ) -> Result<TypedValue, ConvertError> {
        let Shape::Enum(def) = shape else {
            return Err(ConvertError::NoLoader {
                shape: shape.to_string(),
            });
        };
        let variant = def.variants.iter().position(|v| match (&v.wire, value) {
            (EnumWire::Str(wire), Value::String(s)) => wire == s,
            (EnumWire::Int(wire), Value::Number(n)) => n.as_i64() == Some(*wire),
            _ => false,
        });
        match variant {
            Some(variant) => Ok(TypedValue::Enum {
                def: def.clone(),
                variant,
            }),
            None => Err(ConvertError::mismatch(shape, value)),
        }
    }
}

impl Store for EnumConverter {
    fn can_store(&self, value: &TypedValue) -> bool {
        matches!(value, TypedValue::Enum { .. })
    }

    fn store(&self, _ctx: &mut StoreContext, value: &TypedValue) -> Result<Value, ConvertError> {
        match value {
            TypedValue::Enum { def, variant } => {
                let wire = def
                    .variants
                    .get(*variant)
                    .map(|v| &v.wire)
                    .ok_or_else(|| {
                        ConvertError::codec(def.name.clone(), format!("variant {variant} out of range"))
                    })?;
                Ok(match wire {
                    EnumWire::Int(n) => Value::from(*n),
                    EnumWire::Str(s) => Value::String(s.clone()),
                })
            }
            other => Err(ConvertError::NoStore {
                kind: other.kind().to_string(),
            }),
        }
    }
}
