//! The feature event model.
//!
//! A backend reports a response as a flat sequence of [`FeatureEvent`]s. The
//! [`TransformationContext`] carries the immutable request settings, the cursor describing the
//! event currently being dispatched, and the output sink.

mod context;
#[allow(clippy::module_inception)]
mod event;
mod source;

pub use context::*;
pub use event::*;
pub use source::*;
