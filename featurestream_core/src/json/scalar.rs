use super::{escape_json_string, format_json_number};
use std::fmt::Display;

/// A single JSON leaf value.
#[derive(Clone, Debug, PartialEq)]
pub enum JsonScalar {
	Bool(bool),
	Integer(i64),
	Null,
	Number(f64),
	String(String),
}

impl JsonScalar {
	/// Serializes the scalar to its compact JSON text.
	#[must_use]
	pub fn stringify(&self) -> String {
		match self {
			JsonScalar::Bool(b) => b.to_string(),
			JsonScalar::Integer(i) => i.to_string(),
			JsonScalar::Null => String::from("null"),
			JsonScalar::Number(n) => format_json_number(*n),
			JsonScalar::String(s) => format!("\"{}\"", escape_json_string(s)),
		}
	}
}

impl Display for JsonScalar {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.stringify())
	}
}

impl From<&str> for JsonScalar {
	fn from(value: &str) -> Self {
		JsonScalar::String(value.to_string())
	}
}

impl From<String> for JsonScalar {
	fn from(value: String) -> Self {
		JsonScalar::String(value)
	}
}

impl From<bool> for JsonScalar {
	fn from(value: bool) -> Self {
		JsonScalar::Bool(value)
	}
}

impl From<i64> for JsonScalar {
	fn from(value: i64) -> Self {
		JsonScalar::Integer(value)
	}
}

impl From<u64> for JsonScalar {
	fn from(value: u64) -> Self {
		i64::try_from(value).map_or(JsonScalar::Number(value as f64), JsonScalar::Integer)
	}
}

impl From<usize> for JsonScalar {
	fn from(value: usize) -> Self {
		JsonScalar::from(value as u64)
	}
}

impl From<f64> for JsonScalar {
	fn from(value: f64) -> Self {
		JsonScalar::Number(value)
	}
}
