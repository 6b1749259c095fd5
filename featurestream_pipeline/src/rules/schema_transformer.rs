use super::{RuleTable, TransformationRule};
use crate::{
	event::Representation,
	schema::{FeatureSchema, PropertyPath, PropertySchema},
};
use log::{debug, warn};
use std::{collections::HashMap, sync::Arc};

/// Where a source path ends up after the schema rules were applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MappedPath<'a> {
	Emitted(&'a PropertyPath),
	Removed,
	/// The path is not part of the schema.
	Unknown,
}

#[derive(Clone, Debug)]
pub struct TransformedSchema {
	pub schema: Arc<FeatureSchema>,
	mapping: HashMap<PropertyPath, Option<PropertyPath>>,
}

impl TransformedSchema {
	#[must_use]
	pub fn map(&self, source: &PropertyPath) -> MappedPath<'_> {
		match self.mapping.get(source) {
			Some(Some(path)) => MappedPath::Emitted(path),
			Some(None) => MappedPath::Removed,
			None => MappedPath::Unknown,
		}
	}
}

/// Applies rename and remove rules to a feature schema.
///
/// Rules are looked up by the path a property had in the untransformed schema, so applying
/// the same table to an already transformed schema changes nothing.
pub struct SchemaTransformer<'a> {
	rules: &'a RuleTable,
	representation: Representation,
}

impl<'a> SchemaTransformer<'a> {
	#[must_use]
	pub fn new(rules: &'a RuleTable, representation: Representation) -> Self {
		Self { rules, representation }
	}

	#[must_use]
	pub fn apply(&self, schema: &FeatureSchema) -> TransformedSchema {
		let mut mapping = HashMap::new();
		let root = PropertyPath::default();
		let properties = self.transform_level(&schema.properties, &root, &root, &mut mapping);
		TransformedSchema {
			schema: Arc::new(FeatureSchema {
				name: schema.name.clone(),
				properties,
			}),
			mapping,
		}
	}

	fn transform_level(
		&self,
		properties: &[Arc<PropertySchema>],
		source_parent: &PropertyPath,
		emitted_parent: &PropertyPath,
		mapping: &mut HashMap<PropertyPath, Option<PropertyPath>>,
	) -> Vec<Arc<PropertySchema>> {
		let sources: Vec<PropertyPath> = properties
			.iter()
			.map(|p| p.source.clone().unwrap_or_else(|| source_parent.child(&p.name)))
			.collect();

		let retained: Vec<bool> = sources.iter().map(|source| !self.is_removed(source)).collect();

		let mut taken: Vec<String> = Vec::new();
		let mut result = Vec::new();

		for (index, property) in properties.iter().enumerate() {
			let source = &sources[index];
			if !retained[index] {
				debug!("removing property '{source}'");
				mark_removed(source, property, mapping);
				continue;
			}

			let mut name = property.name.clone();
			for rule in self.rules.rules_for(&source.to_string()) {
				let TransformationRule::Rename(new_name) = rule else {
					continue;
				};
				if *new_name == name {
					continue;
				}
				let collides = taken.contains(new_name)
					|| (0..properties.len()).any(|other| {
						other != index
							&& retained[other]
							&& (properties[other].name == *new_name || sources[other].last() == Some(new_name.as_str()))
					});
				if collides {
					warn!("cannot rename '{source}' to '{new_name}', a sibling already uses that name");
				} else {
					name = new_name.clone();
				}
			}
			taken.push(name.clone());

			let emitted = emitted_parent.child(&name);
			mapping.insert(source.clone(), Some(emitted.clone()));

			let children = self.transform_level(&property.properties, source, &emitted, mapping);
			result.push(Arc::new(PropertySchema {
				name,
				properties: children,
				source: Some(source.clone()),
				..(**property).clone()
			}));
		}

		result
	}

	fn is_removed(&self, source: &PropertyPath) -> bool {
		self.rules.rules_for(&source.to_string()).iter().any(|rule| match rule {
			TransformationRule::Remove(scope) => scope.applies(self.representation),
			_ => false,
		})
	}
}

fn mark_removed(
	source: &PropertyPath,
	property: &PropertySchema,
	mapping: &mut HashMap<PropertyPath, Option<PropertyPath>>,
) {
	mapping.insert(source.clone(), None);
	for child in &property.properties {
		let child_source = child.source.clone().unwrap_or_else(|| source.child(&child.name));
		mark_removed(&child_source, child, mapping);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		rules::RemoveScope,
		schema::{PropertySchema, ValueType},
	};
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;

	fn schema() -> FeatureSchema {
		FeatureSchema::new(
			"buildings",
			vec![
				PropertySchema::value("name", ValueType::String),
				PropertySchema::value("height", ValueType::Float),
				PropertySchema::object(
					"address",
					vec![
						PropertySchema::value("street", ValueType::String),
						PropertySchema::value("city", ValueType::String),
					],
				),
				PropertySchema::value("comment", ValueType::String),
			],
		)
	}

	fn names(schema: &FeatureSchema) -> Vec<String> {
		schema.walk().into_iter().map(|(path, _)| path.to_string()).collect()
	}

	fn rename(name: &str) -> TransformationRule {
		TransformationRule::Rename(name.to_string())
	}

	fn remove(scope: RemoveScope) -> TransformationRule {
		TransformationRule::Remove(scope)
	}

	#[test]
	fn rename_and_remove() {
		let rules = RuleTable::new()
			.with("name", vec![rename("label")])
			.with("address", vec![rename("location")])
			.with("address.city", vec![remove(RemoveScope::Always)])
			.with("comment", vec![remove(RemoveScope::Overview)]);

		let full = SchemaTransformer::new(&rules, Representation::Full).apply(&schema());
		assert_eq!(
			names(&full.schema),
			["label", "height", "location", "location.street", "comment"]
		);
		assert_eq!(
			full.map(&PropertyPath::from("address.street")),
			MappedPath::Emitted(&PropertyPath::from("location.street"))
		);
		assert_eq!(full.map(&PropertyPath::from("address.city")), MappedPath::Removed);
		assert_eq!(full.map(&PropertyPath::from("unknown")), MappedPath::Unknown);

		let overview = SchemaTransformer::new(&rules, Representation::Overview).apply(&schema());
		assert_eq!(overview.map(&PropertyPath::from("comment")), MappedPath::Removed);
	}

	#[test]
	fn removing_a_parent_removes_children() {
		let rules = RuleTable::new().with("address", vec![remove(RemoveScope::Always)]);
		let transformed = SchemaTransformer::new(&rules, Representation::Full).apply(&schema());
		assert_eq!(names(&transformed.schema), ["name", "height", "comment"]);
		assert_eq!(
			transformed.map(&PropertyPath::from("address.street")),
			MappedPath::Removed
		);
	}

	#[test]
	fn rename_collision_is_skipped() {
		let rules = RuleTable::new().with("name", vec![rename("height")]);
		let transformed = SchemaTransformer::new(&rules, Representation::Full).apply(&schema());
		assert_eq!(
			names(&transformed.schema),
			["name", "height", "address", "address.street", "address.city", "comment"]
		);
	}

	#[test]
	fn rename_onto_removed_sibling() {
		let rules = RuleTable::new()
			.with("height", vec![remove(RemoveScope::Always)])
			.with("name", vec![rename("height")]);
		let transformed = SchemaTransformer::new(&rules, Representation::Full).apply(&schema());
		assert_eq!(
			names(&transformed.schema),
			["height", "address", "address.street", "address.city", "comment"]
		);
	}

	#[test]
	fn wildcard_applies_to_unmatched_paths() {
		let rules = RuleTable::new()
			.with("name", vec![rename("label")])
			.with("*", vec![remove(RemoveScope::Always)]);
		let transformed = SchemaTransformer::new(&rules, Representation::Full).apply(&schema());
		assert_eq!(names(&transformed.schema), ["label"]);

		let again = SchemaTransformer::new(&rules, Representation::Full).apply(&transformed.schema);
		assert_eq!(again.schema, transformed.schema);
	}

	fn arb_rule() -> impl Strategy<Value = TransformationRule> {
		let names = prop::sample::select(vec!["name", "height", "label", "street", "city", "x"]);
		let scopes = prop::sample::select(vec![RemoveScope::Always, RemoveScope::Overview, RemoveScope::Never]);
		prop_oneof![
			names.prop_map(|n| TransformationRule::Rename(n.to_string())),
			scopes.prop_map(TransformationRule::Remove),
		]
	}

	fn arb_table() -> impl Strategy<Value = RuleTable> {
		let keys = prop::sample::select(vec![
			"name",
			"height",
			"address",
			"address.street",
			"address.city",
			"comment",
			"address.*",
			"*",
		]);
		prop::collection::vec((keys, prop::collection::vec(arb_rule(), 1..3)), 0..6).prop_map(|entries| {
			let mut table = RuleTable::new();
			for (key, rules) in entries {
				table.insert(key, rules);
			}
			table
		})
	}

	proptest! {
		#[test]
		fn applying_twice_changes_nothing(table in arb_table(), overview in any::<bool>()) {
			let representation = if overview { Representation::Overview } else { Representation::Full };
			let transformer = SchemaTransformer::new(&table, representation);
			let once = transformer.apply(&schema());
			let twice = transformer.apply(&once.schema);
			prop_assert_eq!(&twice.schema, &once.schema);
		}
	}
}
