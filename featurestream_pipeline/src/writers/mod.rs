//! The writers in front of every encoder.
//!
//! | writer | priority |
//! |---|---|
//! | [`TransformPropertiesWriter`] | 100 |
//! | [`FilterPropertiesWriter`] | 200 |
//! | [`FilterLinksWriter`] | 300 |
//!
//! Encoders use [`ENCODER_PRIORITY`] and therefore always run last.

mod filter_links;
mod filter_properties;
mod transform_properties;

pub use filter_links::*;
pub use filter_properties::*;
pub use transform_properties::*;

use crate::{event::RequestContext, traits::FeatureWriter};

pub const ENCODER_PRIORITY: i32 = 1000;

/// Creates the writers every response passes through before reaching the encoder.
#[must_use]
pub fn common_writers(request: &RequestContext) -> Vec<Box<dyn FeatureWriter>> {
	vec![
		Box::new(TransformPropertiesWriter::new(request)),
		Box::new(FilterPropertiesWriter::new()),
		Box::new(FilterLinksWriter::new()),
	]
}
