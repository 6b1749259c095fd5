//! Configuration of a feature service.
//!
//! - [`Config`]: top-level YAML loader with the feature type, its rules and codelists
//! - [`OutputConfig`]: output defaults (CRS, precision, links, formatting)
//!
//! CityJSON settings reuse [`CityJsonOptions`](featurestream_pipeline::encoders::cityjson::CityJsonOptions).

mod main;
mod output;

pub use main::Config;
pub use output::OutputConfig;
