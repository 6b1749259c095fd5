use crate::{
	event::{RequestContext, TransformationContext},
	rules::{MappedPath, SchemaTransformer, TransformedSchema, ValueTransformer},
	schema::PropertyPath,
	traits::{FeatureWriter, Propagation},
};
use anyhow::Result;
use log::{debug, trace};

/// Applies the configured transformation rules.
///
/// Schema rules are resolved once when the writer is created. Afterwards the cursor of every
/// property or geometry event is rewritten to the emitted path, removed properties are
/// stopped and values pass through the value rules.
#[derive(Debug)]
pub struct TransformPropertiesWriter {
	transformed: TransformedSchema,
	values: ValueTransformer,
}

impl TransformPropertiesWriter {
	#[must_use]
	pub fn new(request: &RequestContext) -> Self {
		let transformed = SchemaTransformer::new(&request.rules, request.representation).apply(&request.schema);
		debug!(
			"transformed schema '{}' has {} top-level properties",
			transformed.schema.name,
			transformed.schema.properties.len()
		);
		Self {
			transformed,
			values: ValueTransformer::new(request),
		}
	}

	/// Rewrites the cursor path, `false` if the property is removed.
	fn rename(&self, ctx: &mut TransformationContext) -> bool {
		let emitted: PropertyPath = match self.transformed.map(&ctx.cursor.path) {
			MappedPath::Emitted(path) => path.clone(),
			MappedPath::Removed => {
				trace!("dropping removed property '{}'", ctx.cursor.path);
				return false;
			}
			MappedPath::Unknown => return true,
		};
		ctx.cursor.property = self.transformed.schema.resolve_path(&emitted);
		ctx.cursor.path = emitted;
		true
	}
}

impl FeatureWriter for TransformPropertiesWriter {
	fn name(&self) -> &str {
		"transform properties"
	}

	fn sort_priority(&self) -> i32 {
		100
	}

	fn on_start(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		ctx.cursor.feature_type = self.transformed.schema.clone();
		Ok(Propagation::Continue)
	}

	fn on_property(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		let source = ctx.cursor.path.clone();
		if !self.rename(ctx) {
			return Ok(Propagation::Stop);
		}
		if let Some(value) = ctx.cursor.value.take() {
			ctx.cursor.value = Some(self.values.transform(&source, value));
		}
		Ok(Propagation::Continue)
	}

	fn on_coordinates(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		Ok(if self.rename(ctx) {
			Propagation::Continue
		} else {
			Propagation::Stop
		})
	}

	fn on_geometry_end(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		self.on_coordinates(ctx)
	}
}
