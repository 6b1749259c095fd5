use serde::Deserialize;
use std::fmt::{Debug, Display};

/// Dotted path of a property, e.g. `address.street`.
#[derive(Clone, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(from = "String")]
pub struct PropertyPath(Vec<String>);

impl PropertyPath {
	#[must_use]
	pub fn new(segments: Vec<String>) -> Self {
		Self(segments)
	}

	#[must_use]
	pub fn segments(&self) -> &[String] {
		&self.0
	}

	#[must_use]
	pub fn first(&self) -> Option<&str> {
		self.0.first().map(String::as_str)
	}

	#[must_use]
	pub fn last(&self) -> Option<&str> {
		self.0.last().map(String::as_str)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[must_use]
	pub fn child(&self, name: &str) -> Self {
		let mut segments = self.0.clone();
		segments.push(name.to_string());
		Self(segments)
	}

	#[must_use]
	pub fn parent(&self) -> Option<Self> {
		let (_, parent) = self.0.split_last()?;
		Some(Self(parent.to_vec()))
	}

	/// Same path with the last segment replaced.
	#[must_use]
	pub fn with_last(&self, name: &str) -> Self {
		let mut segments = self.0.clone();
		if let Some(last) = segments.last_mut() {
			*last = name.to_string();
		}
		Self(segments)
	}

	#[must_use]
	pub fn starts_with(&self, prefix: &PropertyPath) -> bool {
		self.0.starts_with(&prefix.0)
	}
}

impl From<&str> for PropertyPath {
	fn from(value: &str) -> Self {
		if value.is_empty() {
			return Self::default();
		}
		Self(value.split('.').map(String::from).collect())
	}
}

impl From<String> for PropertyPath {
	fn from(value: String) -> Self {
		Self::from(value.as_str())
	}
}

impl From<&[&str]> for PropertyPath {
	fn from(value: &[&str]) -> Self {
		Self(value.iter().map(|s| (*s).to_string()).collect())
	}
}

impl Display for PropertyPath {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0.join("."))
	}
}

impl Debug for PropertyPath {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "PropertyPath({self})")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_and_display() {
		let path = PropertyPath::from("address.street");
		assert_eq!(path.segments(), ["address", "street"]);
		assert_eq!(path.to_string(), "address.street");
		assert_eq!(path.first(), Some("address"));
		assert_eq!(path.last(), Some("street"));
		assert!(PropertyPath::from("").is_empty());
	}

	#[test]
	fn navigation() {
		let path = PropertyPath::from("a.b");
		assert_eq!(path.child("c"), PropertyPath::from("a.b.c"));
		assert_eq!(path.parent(), Some(PropertyPath::from("a")));
		assert_eq!(path.with_last("x"), PropertyPath::from("a.x"));
		assert!(path.child("c").starts_with(&path));
		assert!(!path.starts_with(&PropertyPath::from("b")));
		assert_eq!(PropertyPath::default().parent(), None);
	}
}
