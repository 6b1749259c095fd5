use crate::schema::ValueType;
use featurestream_core::json::JsonScalar;
use log::error;

const TRUTHY: [&str; 5] = ["true", "t", "1", "yes", "y"];

/// Converts a raw backend value into the JSON scalar of its schema type.
///
/// Values that fail to parse as their numeric type are logged and emitted as strings; the
/// returned flag tells whether that happened.
pub fn coerce_value(value: &str, value_type: Option<ValueType>, path: &str) -> (JsonScalar, bool) {
	match value_type {
		Some(ValueType::Boolean) => (
			JsonScalar::Bool(TRUTHY.iter().any(|t| t.eq_ignore_ascii_case(value.trim()))),
			false,
		),
		Some(ValueType::Integer) => match value.trim().parse::<i64>() {
			Ok(v) => (JsonScalar::Integer(v), false),
			Err(e) => {
				error!("value '{value}' of '{path}' is not an integer ({e}), writing it as string");
				(JsonScalar::String(value.to_string()), true)
			}
		},
		Some(ValueType::Float) => match value.trim().parse::<f64>() {
			Ok(v) if v.is_finite() => (JsonScalar::Number(v), false),
			_ => {
				error!("value '{value}' of '{path}' is not a number, writing it as string");
				(JsonScalar::String(value.to_string()), true)
			}
		},
		_ => (JsonScalar::String(value.to_string()), false),
	}
}
