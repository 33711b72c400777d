//! Union matching.

use serde_json::Value;
use tracing::trace;

use crate::convert::{Load, LoadContext};
use crate::error::ConvertError;
use crate::shape::Shape;
use crate::value::{TypedValue, json_kind, scalar_from};

/// Loads tagged unions by trying member shapes in declared order.
///
/// A value whose runtime kind exactly equals a scalar member's kind is
/// accepted directly, with no recursive conversion. Otherwise each member
/// is attempted in order and the first success wins; if every member
/// fails, the individual failures are aggregated into one error. No
/// ambiguity detection: two members that would both accept the same value
/// resolve to the earlier one, by policy.
///
/// Load-only: a typed value carries its own tag, so the store direction
/// never sees a union.
pub struct UnionLoader;

impl Load for UnionLoader {
    fn can_load(&self, shape: &Shape) -> bool {
        matches!(shape, Shape::Union(_))
    }

    fn load(
        &self,
        ctx: &mut LoadContext,
        value: &Value,
        shape: &Shape,
    ) -> Result<TypedValue, ConvertError> {
        let Shape::Union(members) = shape else {
            return Err(ConvertError::NoLoader {
                shape: shape.to_string(),
            });
        };

        // Fast accept: the value already is one of the scalar members.
        for member in members {
            if let Shape::Scalar(kind) = member {
                if let Some(scalar) = scalar_from(value, *kind) {
                    return Ok(scalar);
                }
            }
        }

        let mut attempts = Vec::with_capacity(members.len());
        for member in members {
            match ctx.des(value, member) {
                Ok(converted) => return Ok(converted),
                Err(err) => {
                    trace!(member = %member, %err, "union member rejected");
                    attempts.push(err);
                }
            }
        }
        Err(ConvertError::UnionExhausted {
            actual: json_kind(value).to_string(),
            attempts,
        })
    }
}
