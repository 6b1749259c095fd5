//! Deferred output of the CityJSON encoder.
//!
//! The attributes, the address and the geometries of an object arrive interleaved with those of
//! its parts, but each must end up as one contiguous member of its object. Every kind has one
//! active buffer. Starting a buffer for another object parks the active one, flushing a buffer
//! promotes the most recently parked one again.

use super::CityJsonVersion;
use anyhow::{Result, ensure};
use featurestream_core::json::{JsonRecorder, JsonScalar, JsonWrite};
use log::{trace, warn};
use std::fmt::Display;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BufferKind {
	Attributes,
	Address,
	Geometry,
}

impl BufferKind {
	/// The order in which the buffers of an object are flushed.
	pub const ALL: [BufferKind; 3] = [BufferKind::Attributes, BufferKind::Address, BufferKind::Geometry];

	fn index(self) -> usize {
		self as usize
	}

	#[must_use]
	pub fn field_name(self) -> &'static str {
		match self {
			BufferKind::Attributes => "attributes",
			BufferKind::Address => "address",
			BufferKind::Geometry => "geometry",
		}
	}
}

impl Display for BufferKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.field_name())
	}
}

#[derive(Debug)]
pub struct DeferredBuffer {
	kind: BufferKind,
	owner: usize,
	version: CityJsonVersion,
	recorder: JsonRecorder,
	/// Index of the address entry being written.
	entry: Option<usize>,
	/// Values of array attributes by name, in order of first appearance.
	arrays: Vec<(String, Vec<JsonScalar>)>,
	dropping: bool,
}

impl DeferredBuffer {
	fn start(kind: BufferKind, owner: usize, version: CityJsonVersion) -> Result<Self> {
		let mut recorder = JsonRecorder::new();
		recorder.field(kind.field_name())?;
		match kind {
			BufferKind::Attributes => recorder.start_object()?,
			BufferKind::Address => {
				if version == CityJsonVersion::V1_1 {
					recorder.start_array()?;
				}
				recorder.start_object()?;
			}
			BufferKind::Geometry => recorder.start_array()?,
		}
		Ok(Self {
			kind,
			owner,
			version,
			recorder,
			entry: None,
			arrays: Vec::new(),
			dropping: false,
		})
	}

	#[must_use]
	pub fn owner(&self) -> usize {
		self.owner
	}

	/// Direct access for geometry objects.
	pub fn writer(&mut self) -> &mut JsonRecorder {
		&mut self.recorder
	}

	/// Writes one attribute. Values of an array attribute are collected and written as one
	/// array when the buffer closes, even when values of other attributes arrive in between.
	pub fn attribute(&mut self, name: &str, array: bool, value: &JsonScalar) -> Result<()> {
		if !array {
			self.recorder.field(name)?;
			return self.recorder.scalar(value);
		}
		match self.arrays.iter_mut().find(|(n, _)| n == name) {
			Some((_, values)) => values.push(value.clone()),
			None => self.arrays.push((name.to_string(), vec![value.clone()])),
		}
		Ok(())
	}

	fn write_arrays(&mut self) -> Result<()> {
		for (name, values) in std::mem::take(&mut self.arrays) {
			self.recorder.field(&name)?;
			self.recorder.start_array()?;
			for value in &values {
				self.recorder.scalar(value)?;
			}
			self.recorder.end_array()?;
		}
		Ok(())
	}

	/// Writes one field of the address entry `index`, moving to the next entry when it changes.
	pub fn address_field(&mut self, index: usize, field: &str, value: &JsonScalar) -> Result<()> {
		match self.entry {
			None => self.entry = Some(index),
			Some(entry) if entry != index => self.next(index)?,
			Some(_) => {}
		}
		if self.dropping {
			return Ok(());
		}
		self.recorder.scalar_field(field, value)
	}

	fn next(&mut self, index: usize) -> Result<()> {
		self.entry = Some(index);
		if self.version == CityJsonVersion::V1_0 {
			if !self.dropping {
				warn!("CityJSON 1.0 allows one address per object, dropping address {index} and any further");
				self.dropping = true;
			}
			return Ok(());
		}
		self.recorder.end_object()?;
		self.recorder.start_object()
	}

	fn close(mut self) -> Result<JsonRecorder> {
		match self.kind {
			BufferKind::Attributes => {
				self.write_arrays()?;
				self.recorder.end_object()?;
			}
			BufferKind::Address => {
				self.recorder.end_object()?;
				if self.version == CityJsonVersion::V1_1 {
					self.recorder.end_array()?;
				}
			}
			BufferKind::Geometry => self.recorder.end_array()?,
		}
		Ok(self.recorder)
	}
}

#[derive(Debug)]
pub struct BufferSlots {
	version: CityJsonVersion,
	active: [Option<DeferredBuffer>; 3],
	parked: [Vec<DeferredBuffer>; 3],
	started: [usize; 3],
	flushed: [usize; 3],
}

impl BufferSlots {
	#[must_use]
	pub fn new(version: CityJsonVersion) -> Self {
		Self {
			version,
			active: [None, None, None],
			parked: [Vec::new(), Vec::new(), Vec::new()],
			started: [0; 3],
			flushed: [0; 3],
		}
	}

	/// The active buffer of `owner`, started if needed.
	pub fn ensure(&mut self, kind: BufferKind, owner: usize) -> Result<&mut DeferredBuffer> {
		let k = kind.index();
		if self.active[k].as_ref().is_some_and(|b| b.owner == owner) {
			return self.active_for(kind, owner).ok_or_else(|| unreachable_buffer(kind, owner));
		}
		ensure!(
			!self.parked[k].iter().any(|b| b.owner == owner),
			"the {kind} buffer of object {owner} is parked while the object is written"
		);
		if let Some(active) = self.active[k].take() {
			trace!("parking {kind} buffer of object {}", active.owner);
			self.parked[k].push(active);
		}
		trace!("starting {kind} buffer of object {owner}");
		self.started[k] += 1;
		Ok(self.active[k].insert(DeferredBuffer::start(kind, owner, self.version)?))
	}

	pub fn active_for(&mut self, kind: BufferKind, owner: usize) -> Option<&mut DeferredBuffer> {
		self.active[kind.index()].as_mut().filter(|b| b.owner == owner)
	}

	/// Closes the buffer of `owner`, appends it to `body` and promotes the last parked buffer.
	///
	/// Returns `false` if the object never started a buffer of this kind.
	pub fn stop_and_flush(&mut self, kind: BufferKind, owner: usize, body: &mut JsonRecorder) -> Result<bool> {
		let k = kind.index();
		if !self.active[k].as_ref().is_some_and(|b| b.owner == owner) {
			ensure!(
				!self.parked[k].iter().any(|b| b.owner == owner),
				"the {kind} buffer of object {owner} is parked while the object is closed"
			);
			return Ok(false);
		}
		if let Some(buffer) = self.active[k].take() {
			body.append(buffer.close()?);
			self.flushed[k] += 1;
			trace!("flushed {kind} buffer of object {owner}");
		}
		self.active[k] = self.parked[k].pop();
		if let Some(promoted) = &self.active[k] {
			trace!("promoted {kind} buffer of object {}", promoted.owner);
		}
		Ok(true)
	}

	/// No buffer is active or parked.
	#[must_use]
	pub fn is_idle(&self) -> bool {
		self.active.iter().all(Option::is_none) && self.parked.iter().all(Vec::is_empty)
	}

	/// Number of started and flushed buffers of a kind.
	#[must_use]
	pub fn balance(&self, kind: BufferKind) -> (usize, usize) {
		(self.started[kind.index()], self.flushed[kind.index()])
	}
}

fn unreachable_buffer(kind: BufferKind, owner: usize) -> anyhow::Error {
	anyhow::anyhow!("the {kind} buffer of object {owner} vanished")
}
