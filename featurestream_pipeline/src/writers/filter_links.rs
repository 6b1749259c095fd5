use crate::{
	event::TransformationContext,
	traits::{FeatureWriter, Propagation},
};
use anyhow::Result;
use log::trace;
use std::sync::Arc;

/// Removes links with an excluded relation before an encoder writes them.
///
/// The filtered link list replaces the request for the later writers of the current event.
#[derive(Debug, Default)]
pub struct FilterLinksWriter;

impl FilterLinksWriter {
	#[must_use]
	pub fn new() -> Self {
		Self
	}

	fn filter(ctx: &mut TransformationContext) {
		let request = &ctx.request;
		if request.excluded_link_rels.is_empty()
			|| !request.links.iter().any(|l| request.excluded_link_rels.contains(&l.rel))
		{
			return;
		}

		let mut filtered = (**request).clone();
		filtered.links.retain(|l| !request.excluded_link_rels.contains(&l.rel));
		trace!("removed {} links", request.links.len() - filtered.links.len());
		ctx.request = Arc::new(filtered);
	}
}

impl FeatureWriter for FilterLinksWriter {
	fn name(&self) -> &str {
		"filter links"
	}

	fn sort_priority(&self) -> i32 {
		300
	}

	fn on_start(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		Self::filter(ctx);
		Ok(Propagation::Continue)
	}

	fn on_end(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
		Self::filter(ctx);
		Ok(Propagation::Continue)
	}
}
