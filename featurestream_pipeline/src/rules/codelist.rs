use serde::Deserialize;
use std::{collections::HashMap, fmt::Debug};

/// Source of codelist values, supplied by the host.
pub trait CodelistLookup: Debug + Send + Sync {
	/// The value for `code` in codelist `id`, `None` if either is unknown.
	fn lookup(&self, id: &str, code: &str) -> Option<String>;

	fn contains(&self, id: &str) -> bool;
}

/// Codelists held in memory, as read from the configuration.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Codelists(HashMap<String, HashMap<String, String>>);

impl Codelists {
	pub fn insert(&mut self, id: &str, code: &str, value: &str) {
		self
			.0
			.entry(id.to_string())
			.or_default()
			.insert(code.to_string(), value.to_string());
	}

	/// Adds all codelists of `other`, its codes win on conflicts.
	pub fn merge(&mut self, other: Codelists) {
		for (id, codes) in other.0 {
			self.0.entry(id).or_default().extend(codes);
		}
	}
}

impl CodelistLookup for Codelists {
	fn lookup(&self, id: &str, code: &str) -> Option<String> {
		self.0.get(id)?.get(code).cloned()
	}

	fn contains(&self, id: &str) -> bool {
		self.0.contains_key(id)
	}
}
