use serde::Deserialize;
use std::fmt::Display;

/// Geometry types a feature property can carry.
///
/// The type decides how many part indices locate a coordinate sequence: a polygon needs the
/// ring index, a multi polygon the polygon and the ring index.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeometryType {
	Point,
	MultiPoint,
	LineString,
	MultiLineString,
	Polygon,
	MultiPolygon,
}

impl GeometryType {
	/// Number of part indices between the geometry and its coordinate sequences.
	#[must_use]
	pub fn part_depth(&self) -> usize {
		match self {
			GeometryType::Point | GeometryType::MultiPoint | GeometryType::LineString => 0,
			GeometryType::MultiLineString | GeometryType::Polygon => 1,
			GeometryType::MultiPolygon => 2,
		}
	}

	/// Name used by GeoJSON.
	#[must_use]
	pub fn as_geojson_str(&self) -> &'static str {
		match self {
			GeometryType::Point => "Point",
			GeometryType::MultiPoint => "MultiPoint",
			GeometryType::LineString => "LineString",
			GeometryType::MultiLineString => "MultiLineString",
			GeometryType::Polygon => "Polygon",
			GeometryType::MultiPolygon => "MultiPolygon",
		}
	}

	#[must_use]
	pub fn is_areal(&self) -> bool {
		matches!(self, GeometryType::Polygon | GeometryType::MultiPolygon)
	}
}

impl Display for GeometryType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_geojson_str())
	}
}
