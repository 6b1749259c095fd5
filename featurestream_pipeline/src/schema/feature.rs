use super::{PropertyPath, PropertySchema, Role};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FeatureSchema {
	pub name: String,
	#[serde(default)]
	pub properties: Vec<Arc<PropertySchema>>,
}

impl FeatureSchema {
	#[must_use]
	pub fn new(name: &str, properties: Vec<PropertySchema>) -> Self {
		Self {
			name: name.to_string(),
			properties: properties.into_iter().map(Arc::new).collect(),
		}
	}

	/// Looks up the property a path points to.
	#[must_use]
	pub fn resolve(&self, path: &[String]) -> Option<Arc<PropertySchema>> {
		let (first, rest) = path.split_first()?;
		let mut current = self.properties.iter().find(|p| &p.name == first)?;
		for segment in rest {
			current = current.find(segment)?;
		}
		Some(current.clone())
	}

	#[must_use]
	pub fn resolve_path(&self, path: &PropertyPath) -> Option<Arc<PropertySchema>> {
		self.resolve(path.segments())
	}

	/// Tells for every segment of `path` whether it is an array and consumes a multiplicity index.
	///
	/// Segments unknown to the schema count as single values.
	#[must_use]
	pub fn array_flags(&self, path: &[String]) -> Vec<bool> {
		let mut flags = Vec::with_capacity(path.len());
		let mut siblings = &self.properties;
		for segment in path {
			match siblings.iter().find(|p| &p.name == segment) {
				Some(property) => {
					flags.push(property.is_array());
					siblings = &property.properties;
				}
				None => {
					flags.resize(path.len(), false);
					break;
				}
			}
		}
		flags
	}

	/// Path of the top-level property with role `ID`.
	#[must_use]
	pub fn id_path(&self) -> Option<PropertyPath> {
		self
			.properties
			.iter()
			.find(|p| p.role == Some(Role::Id))
			.map(|p| PropertyPath::new(vec![p.name.clone()]))
	}

	/// The primary geometry, or the first top-level geometry if none is marked.
	#[must_use]
	pub fn primary_geometry(&self) -> Option<&Arc<PropertySchema>> {
		self
			.properties
			.iter()
			.find(|p| p.is_geometry() && p.role == Some(Role::PrimaryGeometry))
			.or_else(|| self.properties.iter().find(|p| p.is_geometry()))
	}

	/// All properties depth first, together with their paths.
	#[must_use]
	pub fn walk(&self) -> Vec<(PropertyPath, Arc<PropertySchema>)> {
		fn visit(
			prefix: &PropertyPath,
			properties: &[Arc<PropertySchema>],
			result: &mut Vec<(PropertyPath, Arc<PropertySchema>)>,
		) {
			for property in properties {
				let path = prefix.child(&property.name);
				result.push((path.clone(), property.clone()));
				visit(&path, &property.properties, result);
			}
		}

		let mut result = Vec::new();
		visit(&PropertyPath::default(), &self.properties, &mut result);
		result
	}
}
