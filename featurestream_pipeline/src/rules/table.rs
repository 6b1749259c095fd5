use super::TransformationRule;
use serde::{
	Deserialize, Deserializer,
	de::{MapAccess, Visitor},
};
use std::fmt;
use wildmatch::WildMatch;

const WILDCARD: &str = "*";

#[derive(Clone, Debug)]
struct RuleEntry {
	key: String,
	matcher: Option<WildMatch>,
	rules: Vec<TransformationRule>,
}

/// Rule lists keyed by property path.
///
/// Lookup order: the exact path, then glob keys in configuration order, then `*`.
#[derive(Clone, Debug, Default)]
pub struct RuleTable {
	entries: Vec<RuleEntry>,
}

impl RuleTable {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends rules for `key`. Keys containing `*` or `?` are glob patterns.
	pub fn insert(&mut self, key: &str, rules: Vec<TransformationRule>) {
		if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
			entry.rules.extend(rules);
			return;
		}
		let matcher = key.contains(['*', '?']).then(|| WildMatch::new(key));
		self.entries.push(RuleEntry {
			key: key.to_string(),
			matcher,
			rules,
		});
	}

	#[must_use]
	pub fn with(mut self, key: &str, rules: Vec<TransformationRule>) -> Self {
		self.insert(key, rules);
		self
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().map(|e| e.key.as_str())
	}

	/// Rules that apply to the dotted property `path`.
	#[must_use]
	pub fn rules_for(&self, path: &str) -> &[TransformationRule] {
		let exact = self.entries.iter().find(|e| e.matcher.is_none() && e.key == path);
		let glob = || {
			self
				.entries
				.iter()
				.find(|e| e.key != WILDCARD && e.matcher.as_ref().is_some_and(|m| m.matches(path)))
		};
		let wildcard = || self.entries.iter().find(|e| e.key == WILDCARD);

		exact
			.or_else(glob)
			.or_else(wildcard)
			.map(|e| e.rules.as_slice())
			.unwrap_or_default()
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleList {
	One(TransformationRule),
	Many(Vec<TransformationRule>),
}

impl<'de> Deserialize<'de> for RuleTable {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		struct TableVisitor;

		impl<'de> Visitor<'de> for TableVisitor {
			type Value = RuleTable;

			fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
				formatter.write_str("a map of property paths to transformation rules")
			}

			fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RuleTable, A::Error> {
				let mut table = RuleTable::default();
				while let Some((key, rules)) = map.next_entry::<String, RuleList>()? {
					let rules = match rules {
						RuleList::One(rule) => vec![rule],
						RuleList::Many(rules) => rules,
					};
					table.insert(&key, rules);
				}
				Ok(table)
			}
		}

		deserializer.deserialize_map(TableVisitor)
	}
}
