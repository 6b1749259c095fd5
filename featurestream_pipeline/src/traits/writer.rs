//! Defines the [`FeatureWriter`] trait implemented by every stage of the writer chain.

use crate::event::TransformationContext;
use anyhow::Result;
use std::fmt::Debug;

/// Decides whether the writers after the current one see the event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Propagation {
	Continue,
	/// Drops the event for all later writers.
	Stop,
}

/// One stage of the writer chain.
///
/// Writers are called in ascending [`sort_priority`](FeatureWriter::sort_priority). Every
/// handler sees the cursor as left by the writers before it and may rewrite it, or replace
/// the request, for the writers after it. Errors abort the whole response.
pub trait FeatureWriter: Debug {
	fn name(&self) -> &str;

	fn sort_priority(&self) -> i32;

	fn on_start(&mut self, _ctx: &mut TransformationContext) -> Result<Propagation> {
		Ok(Propagation::Continue)
	}

	fn on_end(&mut self, _ctx: &mut TransformationContext) -> Result<Propagation> {
		Ok(Propagation::Continue)
	}

	fn on_feature_start(&mut self, _ctx: &mut TransformationContext) -> Result<Propagation> {
		Ok(Propagation::Continue)
	}

	fn on_feature_end(&mut self, _ctx: &mut TransformationContext) -> Result<Propagation> {
		Ok(Propagation::Continue)
	}

	fn on_property(&mut self, _ctx: &mut TransformationContext) -> Result<Propagation> {
		Ok(Propagation::Continue)
	}

	fn on_coordinates(&mut self, _ctx: &mut TransformationContext) -> Result<Propagation> {
		Ok(Propagation::Continue)
	}

	fn on_geometry_end(&mut self, _ctx: &mut TransformationContext) -> Result<Propagation> {
		Ok(Propagation::Continue)
	}
}
