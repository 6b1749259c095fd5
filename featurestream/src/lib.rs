//! # featurestream
//!
//! Streams the feature events of a query backend through a chain of writers into GeoJSON or
//! CityJSON documents.
//!
//! ## Features
//! - **Rules**: rename, remove, reformat and map properties while they stream by.
//! - **Formats**: GeoJSON `FeatureCollection`, CityJSON documents and CityJSON text sequences.
//! - **Configuration**: one YAML file describing the feature type, its rules and the output.
//!
//! ## Usage Example
//!
//! ```rust
//! use featurestream::{
//!     config::Config,
//!     pipeline::{EncoderRegistry, FeatureStream, event::JsonLinesEventSource},
//! };
//! use std::{io::Cursor, sync::Arc};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_string("schema:\n  name: place\n  properties:\n    - name: name\n      type: STRING\n")?;
//!     let request = Arc::new(config.request_context());
//!     let writers = config.registry().writers_for("geojson", &request)?;
//!
//!     let events = "{\"event\":\"start\"}\n{\"event\":\"end\"}\n";
//!     let mut output: Vec<u8> = Vec::new();
//!     FeatureStream::new(request, writers, &mut output).run(&mut JsonLinesEventSource::new(Cursor::new(events)))?;
//!
//!     assert!(String::from_utf8(output)?.starts_with("{\"type\":\"FeatureCollection\""));
//!     Ok(())
//! }
//! ```

pub mod config;

pub use featurestream_core as core;
pub use featurestream_geometry as geometry;
pub use featurestream_pipeline as pipeline;
