use crate::{
	encoders::get_encoder_factories,
	event::RequestContext,
	traits::{EncoderFactoryTrait, FeatureWriter},
	writers::common_writers,
};
use anyhow::{Result, anyhow};
use itertools::Itertools;
use std::collections::HashMap;

/// The output formats known to a service, by tag name.
pub struct EncoderRegistry {
	encoders: HashMap<String, Box<dyn EncoderFactoryTrait>>,
}

impl EncoderRegistry {
	#[must_use]
	pub fn new_empty() -> Self {
		EncoderRegistry {
			encoders: HashMap::new(),
		}
	}

	#[must_use]
	pub fn new_default() -> Self {
		let mut registry = EncoderRegistry::new_empty();
		for factory in get_encoder_factories() {
			registry.add_factory(factory);
		}
		registry
	}

	/// Registers a format, replacing any format with the same tag name.
	pub fn add_factory(&mut self, factory: Box<dyn EncoderFactoryTrait>) {
		self.encoders.insert(factory.get_tag_name().to_string(), factory);
	}

	pub fn get(&self, tag: &str) -> Result<&dyn EncoderFactoryTrait> {
		self
			.encoders
			.get(tag)
			.map(|factory| factory.as_ref())
			.ok_or_else(|| anyhow!("output format '{tag}' unknown, use one of: {}", self.tags().join(", ")))
	}

	#[must_use]
	pub fn tags(&self) -> Vec<&str> {
		self.encoders.keys().map(String::as_str).sorted().collect()
	}

	/// The full writer chain of a response: the common writers followed by the encoder.
	pub fn writers_for(&self, tag: &str, request: &RequestContext) -> Result<Vec<Box<dyn FeatureWriter>>> {
		let encoder = self.get(tag)?.build(request)?;
		let mut writers = common_writers(request);
		writers.push(encoder);
		Ok(writers)
	}

	pub fn get_docs(&self) -> String {
		[
			include_str!("help.md").to_string(),
			self
				.encoders
				.values()
				.sorted_by_key(|f| f.get_tag_name())
				.map(|f| format!("\n## {}\n`{}`\n\n{}\n", f.get_tag_name(), f.get_media_type(), f.get_docs()))
				.join(""),
		]
		.join("\n")
	}
}

impl Default for EncoderRegistry {
	fn default() -> Self {
		Self::new_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::FeatureSchema;
	use pretty_assertions::assert_eq;

	#[test]
	fn default_formats() {
		let registry = EncoderRegistry::new_default();
		assert_eq!(registry.tags(), ["cityjson", "cityjson-seq", "geojson"]);
	}

	#[test]
	fn unknown_format() {
		let registry = EncoderRegistry::new_default();
		let error = registry.get("gml").err().unwrap().to_string();
		assert_eq!(
			error,
			"output format 'gml' unknown, use one of: cityjson, cityjson-seq, geojson"
		);
	}

	#[test]
	fn writer_chain_ends_with_encoder() -> Result<()> {
		let registry = EncoderRegistry::new_default();
		let request = RequestContext::new(FeatureSchema::new("building", vec![]));
		let writers = registry.writers_for("geojson", &request)?;
		let names: Vec<&str> = writers.iter().map(|w| w.name()).collect();
		assert_eq!(
			names,
			["transform properties", "filter properties", "filter links", "geojson"]
		);
		Ok(())
	}

	#[test]
	fn docs_list_every_format() {
		let docs = EncoderRegistry::new_default().get_docs();
		assert!(docs.starts_with("# Output formats"));
		for tag in ["## cityjson\n", "## cityjson-seq\n", "## geojson\n"] {
			assert!(docs.contains(tag), "missing {tag}");
		}
		assert!(docs.contains("`application/city+json`"));
	}
}
