//! Coordinate handling for the feature stream.
//!
//! - [`CoordinateProcessor`] turns streamed ordinate text into [`Coordinates`].
//! - [`CrsTransformer`] is the contract for the external reprojection service.
//! - [`Vertices`] quantizes coordinates into an indexed integer vertex table.

mod coordinates;
pub mod crs;
mod geometry_type;
mod processor;
mod vertices;

pub use coordinates::*;
pub use crs::{Crs, CrsTransformer, CrsTransformerFactory, DefaultCrsTransformerFactory};
pub use geometry_type::*;
pub use processor::*;
pub use vertices::*;
