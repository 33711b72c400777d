//! Sequence, set, tuple, and string-keyed map conversion.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::convert::{Load, LoadContext, Store, StoreContext};
use crate::error::ConvertError;
use crate::shape::Shape;
use crate::value::TypedValue;

/// Converts ordered sequences and sets.
///
/// Both decode from a JSON array (there is no dynamic set
/// representation) and both store back to an array. Set loading
/// deduplicates, keeping first-seen order.
pub struct SeqConverter;

impl Load for SeqConverter {
    fn can_load(&self, shape: &Shape) -> bool {
        matches!(shape, Shape::Seq(_) | Shape::Set(_))
    }

    fn load(
        &self,
        ctx: &mut LoadContext,
        value: &Value,
        shape: &Shape,
    ) -> Result<TypedValue, ConvertError> {
        let items = value
            .as_array()
            .ok_or_else(|| ConvertError::mismatch(shape, value))?;
        match shape {
            Shape::Seq(element) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(ctx.des(item, element)?);
                }
                Ok(TypedValue::Seq(out))
            }
            Shape::Set(element) => {
                let mut out: Vec<TypedValue> = Vec::with_capacity(items.len());
                for item in items {
                    let converted = ctx.des(item, element)?;
                    if !out.contains(&converted) {
                        out.push(converted);
                    }
                }
                Ok(TypedValue::Set(out))
            }
            _ => Err(ConvertError::NoLoader {
                shape: shape.to_string(),
            }),
        }
    }
}

impl Store for SeqConverter {
    fn can_store(&self, value: &TypedValue) -> bool {
        matches!(value, TypedValue::Seq(_) | TypedValue::Set(_))
    }

    fn store(&self, ctx: &mut StoreContext, value: &TypedValue) -> Result<Value, ConvertError> {
        match value {
            TypedValue::Seq(items) | TypedValue::Set(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(ctx.ser(item)?);
                }
                Ok(Value::Array(out))
            }
            other => Err(ConvertError::NoStore {
                kind: other.kind().to_string(),
            }),
        }
    }
}

/// Converts fixed-arity tuples.
///
/// Fewer input items than declared members is an arity error; excess
/// input items beyond the declared arity are silently dropped (pinned
/// behavior, exercised by a regression test).
pub struct TupleConverter;

impl Load for TupleConverter {
    fn can_load(&self, shape: &Shape) -> bool {
        matches!(shape, Shape::Tuple(_))
    }

    fn load(
        &self,
        ctx: &mut LoadContext,
        value: &Value,
        shape: &Shape,
    ) -> Result<TypedValue, ConvertError> {
        let items = value
            .as_array()
            .ok_or_else(|| ConvertError::mismatch(shape, value))?;
        match shape {
            Shape::Tuple(members) => {
                if items.len() < members.len() {
                    return Err(ConvertError::TupleArity {
                        expected: members.len(),
                        found: items.len(),
                    });
                }
                let mut out = Vec::with_capacity(members.len());
                for (item, member) in items.iter().zip(members) {
                    out.push(ctx.des(item, member)?);
                }
                Ok(TypedValue::Tuple(out))
            }
            _ => Err(ConvertError::NoLoader {
                shape: shape.to_string(),
            }),
        }
    }
}

impl Store for TupleConverter {
    fn can_store(&self, value: &TypedValue) -> bool {
        matches!(value, TypedValue::Tuple(_))
    }

    fn store(&self, ctx: &mut StoreContext, value: &TypedValue) -> Result<Value, ConvertError> {
        match value {
            TypedValue::Tuple(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(ctx.ser(item)?);
                }
                Ok(Value::Array(out))
            }
            other => Err(ConvertError::NoStore {
                kind: other.kind().to_string(),
            }),
        }
    }
}

/// Converts string-keyed mappings.
pub struct MapConverter;

impl Load for MapConverter {
    fn can_load(&self, shape: &Shape) -> bool {
        matches!(shape, Shape::Map(_))
    }

    fn load(
        &self,
        ctx: &mut LoadContext,
        value: &Value,
        shape: &Shape,
    ) -> Result<TypedValue, ConvertError> {
        let entries = value
            .as_object()
            .ok_or_else(|| ConvertError::mismatch(shape, value))?;
        match shape {
            Shape::Map(value_shape) => {
                let mut out = BTreeMap::new();
                for (key, item) in entries {
                    out.insert(key.clone(), ctx.des(item, value_shape)?);
                }
                Ok(TypedValue::Map(out))
            }
            _ => Err(ConvertError::NoLoader {
                shape: shape.to_string(),
            }),
        }
    }
}

impl Store for MapConverter {
    fn can_store(&self, value: &TypedValue) -> bool {
        matches!(value, TypedValue::Map(_))
    }

    fn store(&self, ctx: &mut StoreContext, value: &TypedValue) -> Result<Value, ConvertError> {
        match value {
            TypedValue::Map(entries) => {
                let mut out = serde_json::Map::with_capacity(entries.len());
                for (key, item) in entries {
                    out.insert(key.clone(), ctx.ser(item)?);
                }
                Ok(Value::Object(out))
            }
            other => Err(ConvertError::NoStore {
                kind: other.kind().to_string(),
            }),
        }
    }
}
