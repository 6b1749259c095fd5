use crate::{event::RequestContext, traits::FeatureWriter};
use anyhow::Result;

/// Creates the encoder writer of one output format.
///
/// Factories live as long as the registry; every response gets its own encoder instance.
pub trait EncoderFactoryTrait: Send + Sync {
	/// Name used to select the format, e.g. `geojson`.
	fn get_tag_name(&self) -> &str;

	fn get_media_type(&self) -> &str;

	fn get_docs(&self) -> String;

	fn build(&self, request: &RequestContext) -> Result<Box<dyn FeatureWriter>>;
}
