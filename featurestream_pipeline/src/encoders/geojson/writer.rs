use super::{GeometryWriter, PropertyTree};
use crate::{
	encoders::coerce_value,
	event::{Link, TransformationContext},
	traits::{FeatureWriter, Propagation},
	writers::ENCODER_PRIORITY,
};
use anyhow::{Result, anyhow};
use featurestream_core::json::{JsonScalar, JsonState, JsonWrite};
use featurestream_geometry::{CoordinateProcessor, CrsTransformer, ProcessorOptions};
use log::{debug, warn};
use std::sync::Arc;

#[derive(Debug)]
enum GeometryState {
	Pending,
	Writing(GeometryWriter),
	/// Coordinates of a secondary geometry are skipped.
	Skipping,
	Written,
}

#[derive(Debug)]
pub struct GeoJsonWriter {
	json: JsonState,
	transformer: Option<Arc<dyn CrsTransformer>>,
	options: ProcessorOptions,
	id: Option<JsonScalar>,
	properties: PropertyTree,
	geometry: GeometryState,
	features: u64,
}

impl Default for GeoJsonWriter {
	fn default() -> Self {
		Self::new()
	}
}

impl GeoJsonWriter {
	#[must_use]
	pub fn new() -> Self {
		Self {
			json: JsonState::default(),
			transformer: None,
			options: ProcessorOptions::default(),
			id: None,
			properties: PropertyTree::default(),
			geometry: GeometryState::Pending,
			features: 0,
		}
	}
}

fn write_link(writer: &mut dyn JsonWrite, link: &Link) -> Result<()> {
	writer.start_object()?;
	writer.string_field("href", &link.href)?;
	writer.string_field("rel", &link.rel)?;
	if let Some(media_type) = &link.media_type {
		writer.string_field("type", media_type)?;
	}
	if let Some(title) = &link.title {
		writer.string_field("title", title)?;
	}
	writer.end_object()
}

impl FeatureWriter for GeoJsonWriter {
	fn name(&self) -> &str {
		"geojson"
	}

	fn sort_priority(&self) -> i32 {
		ENCODER_PRIORITY
	}

	fn on_start(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		// resolve the reprojection before the first byte is written
		self.transformer = ctx.request.crs_transformer()?;
		self.options = ctx.request.processor_options();
		self.json = JsonState::new(ctx.request.pretty);

		let mut writer = self.json.writer(ctx.output);
		writer.start_object()?;
		writer.string_field("type", "FeatureCollection")?;
		if let Some(matched) = ctx.cursor.number_matched {
			writer.scalar_field("numberMatched", &matched.into())?;
		}
		if let Some(returned) = ctx.cursor.number_returned {
			writer.scalar_field("numberReturned", &returned.into())?;
		}
		if !ctx.request.links.is_empty() {
			writer.start_array_field("links")?;
			for link in &ctx.request.links {
				write_link(&mut writer, link)?;
			}
			writer.end_array()?;
		}
		writer.start_array_field("features")?;
		Ok(Propagation::Continue)
	}

	fn on_end(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		let mut writer = self.json.writer(ctx.output);
		writer.end_array()?;
		if ctx.cursor.number_returned.is_none() {
			writer.scalar_field("numberReturned", &self.features.into())?;
		}
		writer.end_object()?;
		debug!("wrote {} features", self.features);
		Ok(Propagation::Continue)
	}

	fn on_feature_start(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		self.id = None;
		self.properties.clear();
		self.geometry = GeometryState::Pending;

		let mut writer = self.json.writer(ctx.output);
		writer.start_object()?;
		writer.string_field("type", "Feature")?;
		Ok(Propagation::Continue)
	}

	fn on_feature_end(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		let mut writer = self.json.writer(ctx.output);
		if !matches!(self.geometry, GeometryState::Written) {
			writer.field("geometry")?;
			writer.null()?;
		}
		if let Some(id) = self.id.take() {
			writer.scalar_field("id", &id)?;
		}
		writer.field("properties")?;
		self.properties.write_json(&mut writer)?;
		writer.end_object()?;
		self.features += 1;
		Ok(Propagation::Continue)
	}

	fn on_property(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		let cursor = &ctx.cursor;
		let property = cursor.property.as_ref();
		let value_type = property.and_then(|p| p.value_type());

		let value = match &cursor.value {
			Some(value) => coerce_value(value, value_type, &cursor.path.to_string()).0,
			// object properties announce themselves without a value
			None if property.is_some_and(|p| p.is_object()) => return Ok(Propagation::Continue),
			None => JsonScalar::Null,
		};

		if cursor.path.len() == 1 && property.is_some_and(|p| p.is_id()) {
			self.id = Some(value);
			return Ok(Propagation::Continue);
		}

		let segments = cursor.path.segments();
		let arrays = cursor.feature_type.array_flags(segments);
		self.properties.insert(segments, &arrays, &cursor.multiplicity, value)?;
		Ok(Propagation::Continue)
	}

	fn on_coordinates(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		let cursor = &ctx.cursor;
		let text = cursor.value.as_deref().unwrap_or_default();

		match &mut self.geometry {
			GeometryState::Pending => {
				let property = cursor
					.property
					.as_ref()
					.ok_or_else(|| anyhow!("geometry '{}' is not part of the schema", cursor.path))?;
				let geometry_type = property
					.geometry_type
					.ok_or_else(|| anyhow!("geometry type of '{}' is unknown", cursor.path))?;
				let processor = CoordinateProcessor::new(
					property.dimension.unwrap_or(2),
					self.transformer.clone(),
					self.options.clone(),
				)?;

				let mut geometry = GeometryWriter::new(geometry_type, processor);
				let mut writer = self.json.writer(ctx.output);
				writer.field("geometry")?;
				geometry.chunk(&cursor.geometry_part, text, &mut writer)?;
				self.geometry = GeometryState::Writing(geometry);
			}
			GeometryState::Writing(geometry) => {
				let mut writer = self.json.writer(ctx.output);
				geometry.chunk(&cursor.geometry_part, text, &mut writer)?;
			}
			GeometryState::Written => {
				warn!("skipping secondary geometry '{}'", cursor.path);
				self.geometry = GeometryState::Skipping;
			}
			GeometryState::Skipping => {}
		}
		Ok(Propagation::Continue)
	}

	fn on_geometry_end(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		match std::mem::replace(&mut self.geometry, GeometryState::Written) {
			GeometryState::Writing(mut geometry) => {
				let mut writer = self.json.writer(ctx.output);
				geometry.finish(&mut writer)?;
			}
			GeometryState::Skipping | GeometryState::Written => {}
			GeometryState::Pending => {
				self.geometry = GeometryState::Pending;
			}
		}
		Ok(Propagation::Continue)
	}
}
