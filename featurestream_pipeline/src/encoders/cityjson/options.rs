use anyhow::{Result, ensure};
use featurestream_geometry::Crs;
use serde::Deserialize;
use std::fmt::Display;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
pub enum CityJsonVersion {
	#[serde(rename = "1.0")]
	V1_0,
	#[default]
	#[serde(rename = "1.1")]
	V1_1,
}

impl CityJsonVersion {
	#[must_use]
	pub fn as_str(&self) -> &'static str {
		match self {
			CityJsonVersion::V1_0 => "1.0",
			CityJsonVersion::V1_1 => "1.1",
		}
	}

	/// CityJSON 1.0 identifies the reference system with an OGC URN, 1.1 with a URI.
	#[must_use]
	pub fn reference_system(&self, crs: &Crs) -> String {
		match (self, crs) {
			(CityJsonVersion::V1_0, Crs::Crs84) => String::from("urn:ogc:def:crs:OGC:1.3:CRS84"),
			(CityJsonVersion::V1_0, Crs::Epsg(code)) => format!("urn:ogc:def:crs:EPSG::{code}"),
			(CityJsonVersion::V1_1, crs) => crs.uri(),
		}
	}
}

impl Display for CityJsonVersion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Maps a geometry property to a CityJSON geometry.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct GeometryMapping {
	pub property: String,
	pub lod: String,
	/// Polygons form the outer shell of a `Solid` instead of a `MultiSurface`.
	pub solid: bool,
}

impl GeometryMapping {
	#[must_use]
	pub fn new(property: &str, lod: &str, solid: bool) -> Self {
		Self {
			property: property.to_string(),
			lod: lod.to_string(),
			solid,
		}
	}
}

/// Settings of the CityJSON encoders.
///
/// The property names describe how the emitted feature type models buildings, they default to
/// the names of the CityGML building model.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct CityJsonOptions {
	pub version: CityJsonVersion,
	/// Only geometries of this level of detail are written.
	pub lod: Option<String>,
	/// Level of detail of geometries without a mapping.
	pub default_lod: String,
	pub scale: [f64; 3],
	/// Fixed translation of the vertex table, otherwise derived from the first vertex.
	pub translate: Option<[f64; 3]>,
	pub deduplicate_vertices: bool,
	pub object_type: String,
	pub part_type: String,
	/// Object array holding the parts of a building.
	pub parts: String,
	/// Object array holding the addresses of a building or part.
	pub address: String,
	/// Object array holding the thematic surfaces of a building or part.
	pub surfaces: String,
	pub surface_type: String,
	pub surface_geometry: String,
	/// Level of detail of the solid that the thematic surfaces replace.
	pub surfaces_lod: String,
	pub geometries: Vec<GeometryMapping>,
}

impl Default for CityJsonOptions {
	fn default() -> Self {
		Self {
			version: CityJsonVersion::default(),
			lod: None,
			default_lod: String::from("1"),
			scale: [0.001; 3],
			translate: None,
			deduplicate_vertices: true,
			object_type: String::from("Building"),
			part_type: String::from("BuildingPart"),
			parts: String::from("consistsOfBuildingPart"),
			address: String::from("address"),
			surfaces: String::from("surfaces"),
			surface_type: String::from("surfaceType"),
			surface_geometry: String::from("lod2MultiSurface"),
			surfaces_lod: String::from("2"),
			geometries: vec![
				GeometryMapping::new("lod1Solid", "1", true),
				GeometryMapping::new("lod2Solid", "2", true),
			],
		}
	}
}

impl CityJsonOptions {
	pub fn check(&self) -> Result<()> {
		ensure!(
			self.scale.iter().all(|s| s.is_finite() && *s > 0.0),
			"cityjson scale must be positive, got {:?}",
			self.scale
		);
		if let Some(translate) = self.translate {
			ensure!(
				translate.iter().all(|t| t.is_finite()),
				"cityjson translate must be finite, got {translate:?}"
			);
		}
		ensure!(!self.parts.is_empty(), "the name of the parts property must not be empty");
		Ok(())
	}

	/// The mapping of a geometry property, falling back to a `MultiSurface` at the default LoD.
	#[must_use]
	pub fn geometry_mapping(&self, property: &str) -> GeometryMapping {
		self
			.geometries
			.iter()
			.find(|m| m.property == property)
			.cloned()
			.unwrap_or_else(|| GeometryMapping::new(property, &self.default_lod, false))
	}

	#[must_use]
	pub fn accepts_lod(&self, lod: &str) -> bool {
		self.lod.as_ref().is_none_or(|filter| filter == lod)
	}
}
