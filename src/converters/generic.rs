//! Generic type parameters and textual forward references.

use serde_json::Value;

use crate::convert::{Load, LoadContext};
use crate::error::ConvertError;
use crate::shape::Shape;
use crate::value::TypedValue;

/// Loads generic type-parameter placeholders.
///
/// The placeholder's name is looked up among the parameters bound by the
/// enclosing record instantiation; loading then recurses into the bound
/// shape. An unbound placeholder is an error.
///
/// Load-only: stored values carry concrete tags, never placeholders.
pub struct ParamLoader;

impl Load for ParamLoader {
    fn can_load(&self, shape: &Shape) -> bool {
        matches!(shape, Shape::Param(_))
    }

    fn load(
        &self,
        ctx: &mut LoadContext,
        value: &Value,
        shape: &Shape,
    ) -> Result<TypedValue, ConvertError> {
        let Shape::Param(name) = shape else {
            return Err(ConvertError::NoLoader {
                shape: shape.to_string(),
            });
        };
        let bound = ctx
            .param(name)
            .cloned()
            .ok_or_else(|| ConvertError::UnboundParam { name: name.clone() })?;
        ctx.des(value, &bound)
    }
}

/// Loads textual forward references.
///
/// The name is resolved against the enclosing record's declaring scope,
/// which includes the record's own name, so self-referential and mutually
/// recursive records work. A reference with no enclosing record, or a
/// name the scope does not know, is an error.
///
/// Load-only, like [`ParamLoader`].
pub struct RefLoader;

impl Load for RefLoader {
    fn can_load(&self, shape: &Shape) -> bool {
        matches!(shape, Shape::Ref(_))
    }

    fn load(
        &self,
        ctx: &mut LoadContext,
        value: &Value,
        shape: &Shape,
    ) -> Result<TypedValue, ConvertError> {
        let Shape::Ref(name) = shape else {
            return Err(ConvertError::NoLoader {
                shape: shape.to_string(),
            });
        };
        let Some(enclosing) = ctx.enclosing().cloned() else {
            return Err(ConvertError::UnresolvedRef {
                name: name.clone(),
                scope: "no enclosing record".to_owned(),
            });
        };
        let resolved =
            enclosing
                .scope()
                .lookup(name)
                .ok_or_else(|| ConvertError::UnresolvedRef {
                    name: name.clone(),
                    scope: enclosing.name.clone(),
                })?;
        ctx.des(value, &resolved)
    }
}
