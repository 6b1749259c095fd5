//! Turns a flat stream of feature events into GeoJSON or CityJSON documents.
//!
//! A backend emits [`event::FeatureEvent`]s in the order
//! `start (feature-start (property | coordinates+ geometry-end)* feature-end)* end`.
//! A [`FeatureStream`] checks that order and hands every event to a chain of
//! [`traits::FeatureWriter`]s sorted by priority. The writers in front rename, remove, reformat
//! and filter properties, the last writer encodes the output format.
//!
//! # Examples
//!
//! ```rust
//! use featurestream_pipeline::{
//!     EncoderRegistry, FeatureStream,
//!     event::{FeatureEvent, RequestContext},
//!     schema::{FeatureSchema, PropertySchema, ValueType},
//! };
//! use std::sync::Arc;
//!
//! fn main() -> anyhow::Result<()> {
//!     let schema = FeatureSchema::new("place", vec![PropertySchema::value("name", ValueType::String)]);
//!     let request = Arc::new(RequestContext::new(schema));
//!     let writers = EncoderRegistry::new_default().writers_for("geojson", &request)?;
//!
//!     let mut output: Vec<u8> = Vec::new();
//!     let mut stream = FeatureStream::new(request, writers, &mut output);
//!     stream.push(FeatureEvent::start())?;
//!     stream.push(FeatureEvent::FeatureStart)?;
//!     stream.push(FeatureEvent::property("name", &[], "Acme"))?;
//!     stream.push(FeatureEvent::FeatureEnd)?;
//!     stream.push(FeatureEvent::End)?;
//!     drop(stream);
//!
//!     assert!(String::from_utf8(output)?.contains(r#""name":"Acme""#));
//!     Ok(())
//! }
//! ```

pub mod encoders;
pub mod event;
mod factory;
pub mod rules;
pub mod schema;
mod stream;
pub mod traits;
pub mod writers;

pub use factory::EncoderRegistry;
pub use stream::FeatureStream;
