//! Datetime conversion.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::convert::{Load, LoadContext, Store, StoreContext};
use crate::error::ConvertError;
use crate::shape::Shape;
use crate::value::TypedValue;

/// Converts UTC datetimes.
///
/// Loads from an RFC 3339 string (trailing `Z` included) or a numeric
/// Unix timestamp, either integer seconds or fractional seconds. Stores
/// as RFC 3339 with millisecond precision and a `Z` suffix.
pub struct DateTimeConverter;

fn from_fractional_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let secs = seconds.div_euclid(1.0) as i64;
    let nanos = (seconds.rem_euclid(1.0) * 1_000_000_000.0) as u32;
    DateTime::from_timestamp(secs, nanos)
}

impl Load for DateTimeConverter {
    fn can_load(&self, shape: &Shape) -> bool {
        matches!(shape, Shape::DateTime)
    }

    fn load(
        &self,
        _ctx: &mut LoadContext,
        value: &Value,
        shape: &Shape,
    ) -> Result<TypedValue, ConvertError> {
        let parsed = match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Value::Number(n) => match n.as_i64() {
                Some(secs) => DateTime::from_timestamp(secs, 0),
                None => n.as_f64().and_then(from_fractional_seconds),
            },
            _ => None,
        };
        parsed
            .map(TypedValue::DateTime)
            .ok_or_else(|| ConvertError::mismatch(shape, value))
    }
}

impl Store for DateTimeConverter {
    fn can_store(&self, value: &TypedValue) -> bool {
        matches!(value, TypedValue::DateTime(_))
    }

    fn store(&self, _ctx: &mut StoreContext, value: &TypedValue) -> Result<Value, ConvertError> {
        match value {
            TypedValue::DateTime(dt) => Ok(Value::String(
                dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            )),
            other => Err(ConvertError::NoStore {
                kind: other.kind().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_timestamps_keep_subsecond_precision() {
        let dt = from_fractional_seconds(1.5).unwrap();
        assert_eq!(dt.timestamp(), 1);
        assert_eq!(dt.timestamp_subsec_millis(), 500);
    }
}
