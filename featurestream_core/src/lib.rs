//! Contains the streaming JSON writer, the replayable JSON recorder and the error kinds
//! shared by all featurestream crates.

pub mod error;
pub mod json;

pub use error::*;
