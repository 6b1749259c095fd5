//! An in-memory capture of [`JsonWrite`] calls.
//!
//! A recorder accepts writes before the surrounding document is ready for them and replays
//! the captured operations, in order, into any other [`JsonWrite`] later on. Structural
//! validation happens on replay, in the writer that finally produces bytes.

use super::{JsonScalar, JsonState, JsonWrite};
use anyhow::Result;

#[derive(Clone, Debug, PartialEq)]
pub enum JsonOp {
	StartObject,
	EndObject,
	StartArray,
	EndArray,
	Field(String),
	Scalar(JsonScalar),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct JsonRecorder {
	ops: Vec<JsonOp>,
}

impl JsonRecorder {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.ops.is_empty()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.ops.len()
	}

	#[must_use]
	pub fn ops(&self) -> &[JsonOp] {
		&self.ops
	}

	/// Appends another recording.
	pub fn append(&mut self, other: JsonRecorder) {
		self.ops.extend(other.ops);
	}

	/// Writes all captured operations into `target`.
	pub fn replay(&self, target: &mut dyn JsonWrite) -> Result<()> {
		for op in &self.ops {
			match op {
				JsonOp::StartObject => target.start_object()?,
				JsonOp::EndObject => target.end_object()?,
				JsonOp::StartArray => target.start_array()?,
				JsonOp::EndArray => target.end_array()?,
				JsonOp::Field(name) => target.field(name)?,
				JsonOp::Scalar(value) => target.scalar(value)?,
			}
		}
		Ok(())
	}

	/// Replays the recording as a standalone compact JSON document.
	pub fn to_json_string(&self) -> Result<String> {
		let mut buffer = Vec::new();
		let mut state = JsonState::new(false);
		self.replay(&mut state.writer(&mut buffer))?;
		Ok(String::from_utf8(buffer)?)
	}
}

impl JsonWrite for JsonRecorder {
	fn start_object(&mut self) -> Result<()> {
		self.ops.push(JsonOp::StartObject);
		Ok(())
	}

	fn end_object(&mut self) -> Result<()> {
		self.ops.push(JsonOp::EndObject);
		Ok(())
	}

	fn start_array(&mut self) -> Result<()> {
		self.ops.push(JsonOp::StartArray);
		Ok(())
	}

	fn end_array(&mut self) -> Result<()> {
		self.ops.push(JsonOp::EndArray);
		Ok(())
	}

	fn field(&mut self, name: &str) -> Result<()> {
		self.ops.push(JsonOp::Field(name.to_string()));
		Ok(())
	}

	fn scalar(&mut self, value: &JsonScalar) -> Result<()> {
		self.ops.push(JsonOp::Scalar(value.clone()));
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn records_in_order() -> Result<()> {
		let mut recorder = JsonRecorder::new();
		recorder.start_object_field("attributes")?;
		recorder.string_field("name", "Acme")?;
		assert_eq!(
			recorder.ops(),
			&[
				JsonOp::Field(String::from("attributes")),
				JsonOp::StartObject,
				JsonOp::Field(String::from("name")),
				JsonOp::Scalar(JsonScalar::from("Acme")),
			]
		);
		Ok(())
	}

	#[test]
	fn replay_into_open_document() -> Result<()> {
		let mut deferred = JsonRecorder::new();
		deferred.start_array_field("address")?;
		deferred.start_object()?;
		deferred.string_field("street", "Main St")?;
		deferred.end_object()?;
		deferred.end_array()?;

		let mut buffer = Vec::new();
		let mut state = JsonState::new(false);
		let mut writer = state.writer(&mut buffer);
		writer.start_object()?;
		writer.string_field("type", "Building")?;
		deferred.replay(&mut writer)?;
		writer.end_object()?;

		assert_eq!(
			String::from_utf8(buffer)?,
			r#"{"type":"Building","address":[{"street":"Main St"}]}"#
		);
		Ok(())
	}

	#[test]
	fn replay_into_recorder() -> Result<()> {
		let mut inner = JsonRecorder::new();
		inner.integer(1)?;
		let mut outer = JsonRecorder::new();
		outer.start_array()?;
		inner.replay(&mut outer)?;
		outer.end_array()?;
		assert_eq!(outer.to_json_string()?, "[1]");
		assert_eq!(outer.len(), 3);
		Ok(())
	}

	#[test]
	fn invalid_recording_fails_on_replay() {
		let mut recorder = JsonRecorder::new();
		recorder.start_object().unwrap();
		recorder.integer(1).unwrap();
		assert!(recorder.to_json_string().is_err());
	}
}
