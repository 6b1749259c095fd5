use super::PropertyPath;
use featurestream_geometry::GeometryType;
use serde::Deserialize;
use std::sync::Arc;

/// Scalar type of a property value.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
	String,
	Integer,
	Float,
	Boolean,
	Date,
	Datetime,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
	String,
	Integer,
	Float,
	Boolean,
	Date,
	Datetime,
	ValueArray,
	Object,
	ObjectArray,
	Geometry,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
	Id,
	PrimaryGeometry,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PropertySchema {
	pub name: String,
	#[serde(rename = "type")]
	pub property_type: PropertyType,
	/// Element type of a `VALUE_ARRAY`.
	#[serde(default)]
	pub value_type: Option<ValueType>,
	#[serde(default)]
	pub geometry_type: Option<GeometryType>,
	/// Number of ordinates per position of a geometry.
	#[serde(default)]
	pub dimension: Option<usize>,
	#[serde(default)]
	pub role: Option<Role>,
	#[serde(default)]
	pub properties: Vec<Arc<PropertySchema>>,
	/// Path of this property in the untransformed schema, set once rules were applied.
	#[serde(skip)]
	pub source: Option<PropertyPath>,
}

impl PropertySchema {
	fn new(name: &str, property_type: PropertyType) -> Self {
		Self {
			name: name.to_string(),
			property_type,
			value_type: None,
			geometry_type: None,
			dimension: None,
			role: None,
			properties: Vec::new(),
			source: None,
		}
	}

	#[must_use]
	pub fn value(name: &str, value_type: ValueType) -> Self {
		let property_type = match value_type {
			ValueType::String => PropertyType::String,
			ValueType::Integer => PropertyType::Integer,
			ValueType::Float => PropertyType::Float,
			ValueType::Boolean => PropertyType::Boolean,
			ValueType::Date => PropertyType::Date,
			ValueType::Datetime => PropertyType::Datetime,
		};
		Self::new(name, property_type)
	}

	#[must_use]
	pub fn value_array(name: &str, value_type: ValueType) -> Self {
		let mut property = Self::new(name, PropertyType::ValueArray);
		property.value_type = Some(value_type);
		property
	}

	#[must_use]
	pub fn object(name: &str, properties: Vec<PropertySchema>) -> Self {
		let mut property = Self::new(name, PropertyType::Object);
		property.properties = properties.into_iter().map(Arc::new).collect();
		property
	}

	#[must_use]
	pub fn object_array(name: &str, properties: Vec<PropertySchema>) -> Self {
		let mut property = Self::object(name, properties);
		property.property_type = PropertyType::ObjectArray;
		property
	}

	#[must_use]
	pub fn geometry(name: &str, geometry_type: GeometryType, dimension: usize) -> Self {
		let mut property = Self::new(name, PropertyType::Geometry);
		property.geometry_type = Some(geometry_type);
		property.dimension = Some(dimension);
		property
	}

	#[must_use]
	pub fn with_role(mut self, role: Role) -> Self {
		self.role = Some(role);
		self
	}

	/// Arrays consume one entry of an event's multiplicity vector.
	#[must_use]
	pub fn is_array(&self) -> bool {
		matches!(self.property_type, PropertyType::ValueArray | PropertyType::ObjectArray)
	}

	#[must_use]
	pub fn is_object(&self) -> bool {
		matches!(self.property_type, PropertyType::Object | PropertyType::ObjectArray)
	}

	#[must_use]
	pub fn is_geometry(&self) -> bool {
		self.property_type == PropertyType::Geometry
	}

	#[must_use]
	pub fn is_id(&self) -> bool {
		self.role == Some(Role::Id)
	}

	/// Scalar type of the values of this property, `None` for objects and geometries.
	#[must_use]
	pub fn value_type(&self) -> Option<ValueType> {
		match self.property_type {
			PropertyType::String => Some(ValueType::String),
			PropertyType::Integer => Some(ValueType::Integer),
			PropertyType::Float => Some(ValueType::Float),
			PropertyType::Boolean => Some(ValueType::Boolean),
			PropertyType::Date => Some(ValueType::Date),
			PropertyType::Datetime => Some(ValueType::Datetime),
			PropertyType::ValueArray => Some(self.value_type.unwrap_or(ValueType::String)),
			PropertyType::Object | PropertyType::ObjectArray | PropertyType::Geometry => None,
		}
	}

	#[must_use]
	pub fn find(&self, name: &str) -> Option<&Arc<PropertySchema>> {
		self.properties.iter().find(|p| p.name == name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn from_yaml() {
		let yaml = "
name: address
type: OBJECT_ARRAY
properties:
  - name: street
    type: STRING
  - name: numbers
    type: VALUE_ARRAY
    valueType: INTEGER
";
		let property: PropertySchema = serde_yaml_ng::from_str(yaml).unwrap();
		assert_eq!(property.name, "address");
		assert!(property.is_array());
		assert!(property.is_object());
		assert_eq!(property.value_type(), None);
		let numbers = property.find("numbers").unwrap();
		assert_eq!(numbers.value_type(), Some(ValueType::Integer));
		assert!(numbers.is_array());
		assert_eq!(property.find("street").unwrap().value_type(), Some(ValueType::String));
	}

	#[test]
	fn unknown_fields_are_rejected() {
		let result = serde_yaml_ng::from_str::<PropertySchema>("name: a\ntype: STRING\nfoo: 1\n");
		assert!(result.is_err());
	}

	#[test]
	fn geometry_constructor() {
		let property = PropertySchema::geometry("geom", GeometryType::MultiPolygon, 3).with_role(Role::PrimaryGeometry);
		assert!(property.is_geometry());
		assert_eq!(property.dimension, Some(3));
		assert_eq!(property.role, Some(Role::PrimaryGeometry));
		assert!(!property.is_id());
	}
}
