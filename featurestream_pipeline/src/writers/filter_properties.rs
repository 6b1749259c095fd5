use crate::{
	event::TransformationContext,
	traits::{FeatureWriter, Propagation},
};
use anyhow::Result;

/// Drops properties that were not requested and geometries if `skip_geometry` is set.
///
/// The selection refers to emitted top-level names. The id property is always kept.
#[derive(Debug, Default)]
pub struct FilterPropertiesWriter;

impl FilterPropertiesWriter {
	#[must_use]
	pub fn new() -> Self {
		Self
	}

	fn is_selected(ctx: &TransformationContext) -> bool {
		let Some(selection) = &ctx.request.properties else {
			return true;
		};
		let cursor = &ctx.cursor;
		if cursor.path.len() == 1 && cursor.property.as_ref().is_some_and(|p| p.is_id()) {
			return true;
		}
		cursor
			.path
			.first()
			.is_some_and(|name| selection.iter().any(|s| s == name))
	}
}

fn propagate(keep: bool) -> Propagation {
	if keep { Propagation::Continue } else { Propagation::Stop }
}

impl FeatureWriter for FilterPropertiesWriter {
	fn name(&self) -> &str {
		"filter properties"
	}

	fn sort_priority(&self) -> i32 {
		200
	}

	fn on_property(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		Ok(propagate(Self::is_selected(ctx)))
	}

	fn on_coordinates(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		Ok(propagate(!ctx.request.skip_geometry))
	}

	fn on_geometry_end(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		Ok(propagate(!ctx.request.skip_geometry))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		event::{FeatureEvent, RequestContext},
		schema::{FeatureSchema, PropertySchema, Role, ValueType},
	};
	use rstest::rstest;
	use std::sync::Arc;

	fn context_for<'a>(request: RequestContext, output: &'a mut Vec<u8>, event: FeatureEvent) -> TransformationContext<'a> {
		let request = Arc::new(request);
		let schema = request.schema.clone();
		let mut ctx = TransformationContext::new(request, output);
		ctx.cursor.advance(event, &schema);
		ctx
	}

	fn request(selection: Option<&[&str]>, skip_geometry: bool) -> RequestContext {
		let mut request = RequestContext::new(FeatureSchema::new(
			"t",
			vec![
				PropertySchema::value("id", ValueType::String).with_role(Role::Id),
				PropertySchema::value("name", ValueType::String),
				PropertySchema::object("address", vec![PropertySchema::value("street", ValueType::String)]),
			],
		));
		request.properties = selection.map(|s| s.iter().map(|n| (*n).to_string()).collect());
		request.skip_geometry = skip_geometry;
		request
	}

	#[rstest]
	#[case(None, "name", Propagation::Continue)]
	#[case(Some(&["address"][..]), "name", Propagation::Stop)]
	#[case(Some(&["address"][..]), "address.street", Propagation::Continue)]
	#[case(Some(&["address"][..]), "id", Propagation::Continue)]
	#[case(Some(&[][..]), "address.street", Propagation::Stop)]
	fn selection(#[case] chosen: Option<&[&str]>, #[case] path: &str, #[case] expected: Propagation) -> Result<()> {
		let mut output = Vec::new();
		let mut ctx = context_for(request(chosen, false), &mut output, FeatureEvent::property(path, &[], "v"));
		assert_eq!(FilterPropertiesWriter::new().on_property(&mut ctx)?, expected);
		Ok(())
	}

	#[rstest]
	#[case(false, Propagation::Continue)]
	#[case(true, Propagation::Stop)]
	fn skip_geometry(#[case] skip: bool, #[case] expected: Propagation) -> Result<()> {
		let mut output = Vec::new();
		let mut ctx = context_for(
			request(Some(&[]), skip),
			&mut output,
			FeatureEvent::coordinates("geom", &[], &[], "1 2"),
		);
		let mut writer = FilterPropertiesWriter::new();
		assert_eq!(writer.on_coordinates(&mut ctx)?, expected);
		assert_eq!(writer.on_geometry_end(&mut ctx)?, expected);
		Ok(())
	}
}
