use super::OutputConfig;
use anyhow::{Context, Result};
use featurestream_pipeline::{
	EncoderRegistry,
	encoders::cityjson::{self, CityJsonOptions},
	event::RequestContext,
	rules::{Codelists, RuleTable},
	schema::FeatureSchema,
};
use log::debug;
use serde::Deserialize;
use std::{
	fs::File,
	io::{BufReader, Read},
	path::{Path, PathBuf},
	sync::Arc,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Config {
	/// The feature type delivered by the backend.
	pub schema: FeatureSchema,

	/// Rules by property path, applied in the order they are listed.
	#[serde(default)]
	pub transformations: RuleTable,

	/// Codelists by id, each mapping codes to values.
	#[serde(default)]
	pub codelists: Codelists,

	/// YAML files with further codelists, relative to the configuration file.
	#[serde(default)]
	pub codelist_files: Vec<PathBuf>,

	#[serde(default)]
	pub output: OutputConfig,

	#[serde(default)]
	pub cityjson: CityJsonOptions,
}

impl Config {
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		let mut config: Config = serde_yaml_ng::from_reader(reader)?;
		config.load_codelist_files()?;
		Ok(config)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		let mut config: Config = serde_yaml_ng::from_str(text)?;
		config.load_codelist_files()?;
		Ok(config)
	}

	/// Parse from a file path, resolving `codelistFiles` relative to that file.
	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("failed to open config {path:?}"))?;
		let mut config: Config =
			serde_yaml_ng::from_reader(BufReader::new(file)).with_context(|| format!("failed to parse config {path:?}"))?;
		config.resolve_paths(path.parent().unwrap_or(Path::new(".")));
		config.load_codelist_files()?;
		Ok(config)
	}

	pub fn resolve_paths(&mut self, base: &Path) {
		for file in &mut self.codelist_files {
			if file.is_relative() {
				*file = base.join(&*file);
			}
		}
	}

	fn load_codelist_files(&mut self) -> Result<()> {
		for path in std::mem::take(&mut self.codelist_files) {
			debug!("loading codelists from {path:?}");
			let file = File::open(&path).with_context(|| format!("failed to open codelists {path:?}"))?;
			let codelists: Codelists =
				serde_yaml_ng::from_reader(BufReader::new(file)).with_context(|| format!("failed to parse codelists {path:?}"))?;
			self.codelists.merge(codelists);
		}
		Ok(())
	}

	/// The request for a full response with the configured output defaults.
	pub fn request_context(&self) -> RequestContext {
		let mut request = RequestContext::new(self.schema.clone());
		request.rules = Arc::new(self.transformations.clone());
		request.codelists = Arc::new(self.codelists.clone());
		self.output.apply(&mut request);
		request
	}

	/// The default formats, with CityJSON using the configured options.
	pub fn registry(&self) -> EncoderRegistry {
		let mut registry = EncoderRegistry::new_default();
		registry.add_factory(Box::new(cityjson::Factory::document().with_options(self.cityjson.clone())));
		registry.add_factory(Box::new(cityjson::Factory::sequence().with_options(self.cityjson.clone())));
		registry
	}

	pub fn default_format(&self) -> &str {
		self.output.format.as_deref().unwrap_or("geojson")
	}
}
