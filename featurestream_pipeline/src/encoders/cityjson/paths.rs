//! Classifies emitted property paths by their place in the CityJSON object tree.

use super::{CityJsonOptions, GeometryMapping};
use crate::schema::{FeatureSchema, PropertySchema};

#[derive(Clone, Debug, PartialEq)]
pub enum Target {
	Id,
	/// A value that ends up in `attributes`, `name` joins the segments below the object.
	Attribute { name: String, array: bool },
	Address { index: usize, field: String },
	Geometry(GeometryMapping),
	SurfaceType { index: usize },
	SurfaceGeometry { index: usize },
	/// Any other value of a thematic surface.
	SurfaceOther,
	/// Object markers and values without a place in the output.
	Ignored,
}

/// Where an event belongs: the chain of part indices leading to its object, and its role there.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
	pub parts: Vec<usize>,
	pub target: Target,
}

impl Location {
	#[must_use]
	pub fn new(
		schema: &FeatureSchema,
		segments: &[String],
		multiplicity: &[usize],
		property: Option<&PropertySchema>,
		options: &CityJsonOptions,
	) -> Self {
		let flags = schema.array_flags(segments);
		let mut remaining = multiplicity.iter().copied();
		let indices: Vec<Option<usize>> = flags
			.iter()
			.map(|is_array| is_array.then(|| remaining.next().unwrap_or(0)))
			.collect();

		let mut parts = Vec::new();
		let mut start = 0;
		while start + 1 < segments.len() && segments[start] == options.parts {
			parts.push(indices[start].unwrap_or(0));
			start += 1;
		}

		let rest = &segments[start..];
		let target = classify(rest, &flags[start..], &indices[start..], property, options);
		Location { parts, target }
	}
}

fn classify(
	rest: &[String],
	flags: &[bool],
	indices: &[Option<usize>],
	property: Option<&PropertySchema>,
	options: &CityJsonOptions,
) -> Target {
	let Some(first) = rest.first() else {
		return Target::Ignored;
	};
	let index = indices.first().copied().flatten().unwrap_or(0);

	if *first == options.parts {
		return Target::Ignored;
	}
	if *first == options.address {
		return if rest.len() > 1 {
			Target::Address {
				index,
				field: rest[1..].join("."),
			}
		} else {
			Target::Ignored
		};
	}
	if *first == options.surfaces {
		return match rest.get(1) {
			Some(name) if *name == options.surface_type => Target::SurfaceType { index },
			Some(name) if *name == options.surface_geometry => Target::SurfaceGeometry { index },
			_ => Target::SurfaceOther,
		};
	}

	match property {
		Some(p) if p.is_geometry() => Target::Geometry(options.geometry_mapping(&rest.join("."))),
		Some(p) if p.is_id() && rest.len() == 1 => Target::Id,
		Some(p) if p.is_object() => Target::Ignored,
		_ => Target::Attribute {
			name: rest.join("."),
			array: flags.iter().any(|f| *f),
		},
	}
}
