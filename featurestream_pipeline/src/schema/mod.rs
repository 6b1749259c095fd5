//! Feature type descriptors.
//!
//! A [`FeatureSchema`] describes the properties a backend delivers for one feature type. The
//! writers use it to look up the value type, array-ness and role of the property an event
//! refers to.

mod feature;
mod path;
mod property;

pub use feature::*;
pub use path::*;
pub use property::*;
