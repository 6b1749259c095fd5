use super::{CityJsonOptions, CityJsonVersion, CoordinateSettings, FeatureEncoder, Location, VertexTable};
use crate::{
	event::TransformationContext,
	traits::{FeatureWriter, Propagation},
	writers::ENCODER_PRIORITY,
};
use anyhow::{Result, anyhow};
use featurestream_core::json::{JsonState, JsonWrite};
use log::{debug, warn};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CityJsonMode {
	/// One `CityJSON` object with a shared vertex table.
	Document,
	/// A header line followed by one `CityJSONFeature` line per feature.
	Sequence,
}

#[derive(Debug)]
pub struct CityJsonWriter {
	options: Arc<CityJsonOptions>,
	mode: CityJsonMode,
	json: JsonState,
	settings: CoordinateSettings,
	vertices: VertexTable,
	feature: Option<FeatureEncoder>,
	features: u64,
	coercion_failures: usize,
}

impl CityJsonWriter {
	pub fn new(mut options: CityJsonOptions, mode: CityJsonMode) -> Result<Self> {
		options.check()?;
		if mode == CityJsonMode::Sequence && options.version != CityJsonVersion::V1_1 {
			warn!("CityJSON sequences need version 1.1, ignoring version {}", options.version);
			options.version = CityJsonVersion::V1_1;
		}
		Ok(Self {
			vertices: VertexTable::new(&options),
			options: Arc::new(options),
			mode,
			json: JsonState::default(),
			settings: CoordinateSettings::default(),
			feature: None,
			features: 0,
			coercion_failures: 0,
		})
	}

	/// Values written as strings because they did not match their declared type.
	#[must_use]
	pub fn coercion_failures(&self) -> usize {
		self.coercion_failures
	}

	fn feature(&mut self) -> Result<&mut FeatureEncoder> {
		self.feature.as_mut().ok_or_else(|| anyhow!("event outside of a feature"))
	}

	fn location(&self, ctx: &TransformationContext) -> Location {
		let cursor = &ctx.cursor;
		Location::new(
			&cursor.feature_type,
			cursor.path.segments(),
			&cursor.multiplicity,
			cursor.property.as_deref(),
			&self.options,
		)
	}
}

impl FeatureWriter for CityJsonWriter {
	fn name(&self) -> &str {
		match self.mode {
			CityJsonMode::Document => "cityjson",
			CityJsonMode::Sequence => "cityjson-seq",
		}
	}

	fn sort_priority(&self) -> i32 {
		ENCODER_PRIORITY
	}

	fn on_start(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		// resolve the reprojection before the first byte is written
		self.settings = CoordinateSettings {
			transformer: ctx.request.crs_transformer()?,
			options: ctx.request.processor_options(),
		};
		let version = self.options.version;
		let reference_system = version.reference_system(&ctx.request.target_crs);

		match self.mode {
			CityJsonMode::Document => {
				self.json = JsonState::new(ctx.request.pretty);
				self.vertices = VertexTable::new(&self.options);
				let mut writer = self.json.writer(ctx.output);
				writer.start_object()?;
				writer.string_field("type", "CityJSON")?;
				writer.string_field("version", version.as_str())?;
				writer.start_object_field("metadata")?;
				writer.string_field("referenceSystem", &reference_system)?;
				writer.end_object()?;
				writer.start_object_field("CityObjects")?;
			}
			CityJsonMode::Sequence => {
				self.json = JsonState::new_sequence();
				self.vertices = VertexTable::with_translate(&self.options, self.options.translate.unwrap_or_default());
				let mut writer = self.json.writer(ctx.output);
				writer.start_object()?;
				writer.string_field("type", "CityJSON")?;
				writer.string_field("version", version.as_str())?;
				writer.field("transform")?;
				self.vertices.transform()?.write_json(&mut writer)?;
				writer.start_object_field("metadata")?;
				writer.string_field("referenceSystem", &reference_system)?;
				writer.end_object()?;
				writer.start_object_field("CityObjects")?;
				writer.end_object()?;
				writer.start_array_field("vertices")?;
				writer.end_array()?;
				writer.end_object()?;
			}
		}
		Ok(Propagation::Continue)
	}

	fn on_end(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		if self.mode == CityJsonMode::Document {
			let mut writer = self.json.writer(ctx.output);
			writer.end_object()?;
			writer.field("transform")?;
			self.vertices.transform()?.write_json(&mut writer)?;
			writer.field("vertices")?;
			self.vertices.write_json(&mut writer)?;
			writer.end_object()?;
		}
		if self.coercion_failures > 0 {
			warn!(
				"{} values did not match their declared type and were written as strings",
				self.coercion_failures
			);
		}
		debug!("wrote {} features with {} vertices", self.features, self.vertices.len());
		Ok(Propagation::Continue)
	}

	fn on_feature_start(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		if self.mode == CityJsonMode::Sequence {
			self.vertices.clear();
		}
		self.feature = Some(FeatureEncoder::new(
			self.options.clone(),
			ctx.cursor.feature_type.clone(),
			self.settings.clone(),
		));
		Ok(Propagation::Continue)
	}

	fn on_feature_end(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		let mut feature = self
			.feature
			.take()
			.ok_or_else(|| anyhow!("feature end without feature start"))?;
		let mut writer = self.json.writer(ctx.output);

		match self.mode {
			CityJsonMode::Document => {
				feature.finish(&mut writer)?;
			}
			CityJsonMode::Sequence => {
				writer.start_object()?;
				writer.string_field("type", "CityJSONFeature")?;
				writer.start_object_field("CityObjects")?;
				let id = feature.finish(&mut writer)?;
				writer.end_object()?;
				writer.string_field("id", &id)?;
				writer.field("vertices")?;
				self.vertices.write_json(&mut writer)?;
				writer.end_object()?;
			}
		}

		self.coercion_failures += feature.coercion_failures();
		self.features += 1;
		Ok(Propagation::Continue)
	}

	fn on_property(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		let location = self.location(ctx);
		let cursor = &ctx.cursor;
		let value_type = cursor.property.as_ref().and_then(|p| p.value_type());
		let path = cursor.path.to_string();
		self
			.feature()?
			.property(&location, cursor.value.as_deref(), value_type, &path)?;
		Ok(Propagation::Continue)
	}

	fn on_coordinates(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		let location = self.location(ctx);
		let cursor = &ctx.cursor;
		let geometry = cursor
			.property
			.as_ref()
			.and_then(|p| p.geometry_type.map(|t| (t, p.dimension.unwrap_or(2))));
		let text = cursor.value.as_deref().unwrap_or_default();

		let Some(feature) = self.feature.as_mut() else {
			return Err(anyhow!("coordinates outside of a feature"));
		};
		feature.coordinates(&location, geometry, &cursor.geometry_part, text, &mut self.vertices)?;
		Ok(Propagation::Continue)
	}

	fn on_geometry_end(&mut self, _ctx: &mut TransformationContext) -> Result<Propagation> {
		let Some(feature) = self.feature.as_mut() else {
			return Err(anyhow!("geometry end outside of a feature"));
		};
		feature.geometry_end(&mut self.vertices)?;
		Ok(Propagation::Continue)
	}
}
