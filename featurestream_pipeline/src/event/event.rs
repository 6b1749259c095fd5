use crate::schema::PropertyPath;
use serde::Deserialize;
use std::fmt::Display;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EventKind {
	Start,
	End,
	FeatureStart,
	FeatureEnd,
	Property,
	CoordinateChunk,
	GeometryEnd,
}

impl EventKind {
	#[must_use]
	pub fn as_str(&self) -> &'static str {
		match self {
			EventKind::Start => "start",
			EventKind::End => "end",
			EventKind::FeatureStart => "feature-start",
			EventKind::FeatureEnd => "feature-end",
			EventKind::Property => "property",
			EventKind::CoordinateChunk => "coordinates",
			EventKind::GeometryEnd => "geometry-end",
		}
	}
}

impl Display for EventKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One event of a backend response.
///
/// `multiplicity` holds one index per array segment of `path`. `part` addresses the
/// coordinate sequence inside a geometry, e.g. `[polygon, ring]` for a multi polygon.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum FeatureEvent {
	#[serde(rename_all = "camelCase")]
	Start {
		#[serde(default)]
		number_matched: Option<u64>,
		#[serde(default)]
		number_returned: Option<u64>,
	},
	End,
	FeatureStart,
	FeatureEnd,
	Property {
		path: PropertyPath,
		#[serde(default)]
		multiplicity: Vec<usize>,
		#[serde(default)]
		value: Option<String>,
	},
	#[serde(rename = "coordinates")]
	CoordinateChunk {
		path: PropertyPath,
		#[serde(default)]
		multiplicity: Vec<usize>,
		#[serde(default)]
		part: Vec<usize>,
		text: String,
	},
	GeometryEnd,
}

impl FeatureEvent {
	#[must_use]
	pub fn kind(&self) -> EventKind {
		match self {
			FeatureEvent::Start { .. } => EventKind::Start,
			FeatureEvent::End => EventKind::End,
			FeatureEvent::FeatureStart => EventKind::FeatureStart,
			FeatureEvent::FeatureEnd => EventKind::FeatureEnd,
			FeatureEvent::Property { .. } => EventKind::Property,
			FeatureEvent::CoordinateChunk { .. } => EventKind::CoordinateChunk,
			FeatureEvent::GeometryEnd => EventKind::GeometryEnd,
		}
	}

	#[must_use]
	pub fn start() -> Self {
		FeatureEvent::Start {
			number_matched: None,
			number_returned: None,
		}
	}

	#[must_use]
	pub fn property(path: &str, multiplicity: &[usize], value: &str) -> Self {
		FeatureEvent::Property {
			path: PropertyPath::from(path),
			multiplicity: multiplicity.to_vec(),
			value: Some(value.to_string()),
		}
	}

	#[must_use]
	pub fn coordinates(path: &str, multiplicity: &[usize], part: &[usize], text: &str) -> Self {
		FeatureEvent::CoordinateChunk {
			path: PropertyPath::from(path),
			multiplicity: multiplicity.to_vec(),
			part: part.to_vec(),
			text: text.to_string(),
		}
	}
}
