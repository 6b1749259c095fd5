//! GeoJSON `FeatureCollection` output.
//!
//! Geometries are written while their coordinates arrive. Properties are collected per feature
//! and written when the feature ends, because flat property events cannot be turned into
//! nested JSON objects any earlier.

mod geometry;
mod properties;
mod writer;

pub use geometry::*;
pub use properties::*;
pub use writer::*;

use crate::{
	event::RequestContext,
	traits::{EncoderFactoryTrait, FeatureWriter},
};
use anyhow::Result;

pub struct Factory {}

impl EncoderFactoryTrait for Factory {
	fn get_tag_name(&self) -> &str {
		"geojson"
	}

	fn get_media_type(&self) -> &str {
		"application/geo+json"
	}

	fn get_docs(&self) -> String {
		String::from("GeoJSON FeatureCollection (RFC 7946). Nested and array properties become nested JSON values.")
	}

	fn build(&self, _request: &RequestContext) -> Result<Box<dyn FeatureWriter>> {
		Ok(Box::new(GeoJsonWriter::new()))
	}
}
