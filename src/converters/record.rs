//! Record conversion.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::convert::{Load, LoadContext, Store, StoreContext};
use crate::error::ConvertError;
use crate::shape::Shape;
use crate::value::TypedValue;

/// Converts record shapes to and from JSON objects.
///
/// Loading checks the symmetric difference between the declared field set
/// and the object's keys: missing fields are always an error, unexpected
/// keys are an error unless this instance is permissive, and both sides
/// are reported together. Fields convert in declared order inside a
/// branched context carrying the record as enclosing type and the generic
/// bindings implied by the instantiation, so construction is by field
/// name and the object's key order is irrelevant.
pub struct RecordConverter {
    allow_extra: bool,
}

impl RecordConverter {
    /// Strict instance: unknown keys are an error.
    pub fn strict() -> RecordConverter {
        RecordConverter { allow_extra: false }
    }

    /// Permissive instance: unknown keys are ignored.
    pub fn permissive() -> RecordConverter {
        RecordConverter { allow_extra: true }
    }
}

impl Load for RecordConverter {
    fn can_load(&self, shape: &Shape) -> bool {
        matches!(shape, Shape::Record(_))
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
        let Shape::Record(inst) = shape else {
            return Err(ConvertError::NoLoader {
                shape: shape.to_string(),
            });
        };
        let def = &inst.def;

        let declared: BTreeSet<&str> = def.fields.iter().map(|f| f.name.as_str()).collect();
        let given: BTreeSet<&str> = entries.keys().map(String::as_str).collect();
        let missing: Vec<String> = declared
            .difference(&given)
            .map(|name| (*name).to_owned())
            .collect();
        let unexpected: Vec<String> = if self.allow_extra {
            Vec::new()
        } else {
            given
                .difference(&declared)
                .map(|name| (*name).to_owned())
                .collect()
        };
        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(ConvertError::FieldMismatch {
                record: def.name.clone(),
                missing,
                unexpected,
            });
        }

        let mut inner = ctx.branch();
        for (param, arg) in def.params.iter().zip(&inst.args) {
            // An argument that is itself a bound parameter substitutes
            // through the current bindings before being rebound.
            let bound = match arg {
                Shape::Param(name) => ctx.param(name).cloned().unwrap_or_else(|| arg.clone()),
                _ => arg.clone(),
            };
            inner.bind_param(param.clone(), bound);
        }
        inner.set_enclosing(def.clone());

        let null = Value::Null;
        let mut fields = Vec::with_capacity(def.fields.len());
        for field in &def.fields {
            // Presence was established by the symmetric-difference check.
            let item = entries.get(&field.name).unwrap_or(&null);
            fields.push(inner.des(item, &field.shape)?);
        }
        Ok(TypedValue::record(def.clone(), fields))
    }
}

impl Store for RecordConverter {
    fn can_store(&self, value: &TypedValue) -> bool {
        matches!(value, TypedValue::Record { .. })
    }

    fn store(&self, ctx: &mut StoreContext, value: &TypedValue) -> Result<Value, ConvertError> {
        match value {
            TypedValue::Record { def, fields } => {
                let mut out = serde_json::Map::with_capacity(def.fields.len());
                for (field, item) in def.fields.iter().zip(fields) {
                    out.insert(field.name.clone(), ctx.ser(item)?);
                }
                Ok(Value::Object(out))
            }
            other => Err(ConvertError::NoStore {
                kind: other.kind().to_string(),
            }),
        }
    }
}
