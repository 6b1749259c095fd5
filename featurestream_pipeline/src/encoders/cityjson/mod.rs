//! CityJSON output, as one document or as a CityJSON text sequence.
//!
//! A feature becomes a building with its parts as child objects. The flat event stream visits
//! the values of an object and of its parts interleaved, so every object collects its
//! attributes, address and geometries in deferred buffers that are flushed when the object is
//! complete. A [`SectionStack`] tracks where in the object tree the current event belongs.
//!
//! Geometries reference an indexed vertex table of quantized integer positions.

mod boundaries;
mod buffers;
mod feature;
mod options;
mod paths;
mod section;
mod writer;

pub use boundaries::*;
pub use buffers::*;
pub use feature::*;
pub use options::*;
pub use paths::*;
pub use section::*;
pub use writer::*;

use crate::{
	event::RequestContext,
	traits::{EncoderFactoryTrait, FeatureWriter},
};
use anyhow::Result;

pub struct Factory {
	options: CityJsonOptions,
	mode: CityJsonMode,
}

impl Factory {
	#[must_use]
	pub fn document() -> Self {
		Self {
			options: CityJsonOptions::default(),
			mode: CityJsonMode::Document,
		}
	}

	#[must_use]
	pub fn sequence() -> Self {
		Self {
			options: CityJsonOptions::default(),
			mode: CityJsonMode::Sequence,
		}
	}

	#[must_use]
	pub fn with_options(mut self, options: CityJsonOptions) -> Self {
		self.options = options;
		self
	}
}

impl EncoderFactoryTrait for Factory {
	fn get_tag_name(&self) -> &str {
		match self.mode {
			CityJsonMode::Document => "cityjson",
			CityJsonMode::Sequence => "cityjson-seq",
		}
	}

	fn get_media_type(&self) -> &str {
		match self.mode {
			CityJsonMode::Document => "application/city+json",
			CityJsonMode::Sequence => "application/city+json-seq",
		}
	}

	fn get_docs(&self) -> String {
		match self.mode {
			CityJsonMode::Document => String::from(
				"CityJSON document. Buildings with their parts as child objects, attributes, addresses and geometries referencing one quantized vertex table.",
			),
			CityJsonMode::Sequence => String::from(
				"CityJSON text sequence (version 1.1). A header line, then one CityJSONFeature per line with its own vertices.",
			),
		}
	}

	fn build(&self, _request: &RequestContext) -> Result<Box<dyn FeatureWriter>> {
		Ok(Box::new(CityJsonWriter::new(self.options.clone(), self.mode)?))
	}
}
