//! The output encoders. Each one is the last writer of its chain.

pub mod cityjson;
pub mod geojson;
mod values;

pub use values::*;

use crate::traits::EncoderFactoryTrait;

pub fn get_encoder_factories() -> Vec<Box<dyn EncoderFactoryTrait>> {
	vec![
		Box::new(geojson::Factory {}),
		Box::new(cityjson::Factory::document()),
		Box::new(cityjson::Factory::sequence()),
	]
}
