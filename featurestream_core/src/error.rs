//! Error kinds the pipeline has to tell apart.
//!
//! Everything else travels as a plain [`anyhow::Error`]. These types are attached to an
//! `anyhow::Error` and recovered with [`is_transform_error`] or `downcast_ref`, even after
//! context has been added on the way up.

use thiserror::Error;

/// A coordinate could not be reprojected. Always fatal for the current response.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("failed to transform coordinates from {source_crs} to {target_crs}: {reason}")]
pub struct TransformError {
	pub source_crs: String,
	pub target_crs: String,
	pub reason: String,
}

impl TransformError {
	pub fn new(source_crs: &str, target_crs: &str, reason: impl Into<String>) -> Self {
		Self {
			source_crs: source_crs.to_string(),
			target_crs: target_crs.to_string(),
			reason: reason.into(),
		}
	}
}

/// The event source violated the ordering contract of the feature stream.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EventOrderError {
	#[error("stream-start must be the first event and may only occur once")]
	UnexpectedStart,
	#[error("stream-end received before stream-start or twice")]
	UnexpectedEnd,
	#[error("event received after stream-end")]
	AfterEnd,
	#[error("feature-start received while feature is still open")]
	NestedFeature,
	#[error("feature-end received without matching feature-start")]
	UnbalancedFeatureEnd,
	#[error("{0} received outside of a feature")]
	OutsideFeature(&'static str),
	#[error("geometry-end received without coordinates")]
	GeometryEndWithoutCoordinates,
	#[error("{0} received while a geometry is still open")]
	GeometryNotClosed(&'static str),
	#[error("stream ended while a feature is still open")]
	UnclosedFeature,
	#[error("event source ended before stream-end")]
	MissingEnd,
}

/// Returns `true` if any error in the chain is a [`TransformError`].
#[must_use]
pub fn is_transform_error(error: &anyhow::Error) -> bool {
	error.chain().any(|e| e.is::<TransformError>())
}

/// Returns `true` if any error in the chain is an [`EventOrderError`].
#[must_use]
pub fn is_event_order_error(error: &anyhow::Error) -> bool {
	error.chain().any(|e| e.is::<EventOrderError>())
}
