//! Turns streamed ordinate text into finished coordinate sequences.
//!
//! The backend delivers coordinates as text chunks of whitespace or comma separated
//! ordinates. Chunk borders may split a number, so an unfinished token is carried over
//! into the next chunk. Every complete tuple is reprojected immediately; a sequence is
//! simplified and rounded once it is finished.

use super::{Coordinates, CrsTransformer};
use anyhow::{Context, Result, ensure};
use geo::{LineString, Simplify};
use log::trace;
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcessorOptions {
	/// Number of decimal places of emitted ordinates.
	pub precision: Option<u8>,
	/// Douglas-Peucker tolerance in target units, applied to 2D sequences only.
	pub simplify_tolerance: Option<f64>,
}

#[derive(Debug)]
pub struct CoordinateProcessor {
	dimension: usize,
	transformer: Option<Arc<dyn CrsTransformer>>,
	options: ProcessorOptions,
	pending: String,
	ordinates: Vec<f64>,
	part: Vec<Coordinates>,
}

impl CoordinateProcessor {
	pub fn new(dimension: usize, transformer: Option<Arc<dyn CrsTransformer>>, options: ProcessorOptions) -> Result<Self> {
		ensure!(
			dimension == 2 || dimension == 3,
			"coordinate dimension must be 2 or 3, got {dimension}"
		);
		Ok(Self {
			dimension,
			transformer,
			options,
			pending: String::new(),
			ordinates: Vec::with_capacity(3),
			part: Vec::new(),
		})
	}

	#[must_use]
	pub fn dimension(&self) -> usize {
		self.dimension
	}

	/// Feeds a chunk of raw coordinate text.
	pub fn push_chunk(&mut self, chunk: &str) -> Result<()> {
		for c in chunk.chars() {
			if c.is_whitespace() || c == ',' {
				self.flush_pending()?;
			} else {
				self.pending.push(c);
			}
		}
		Ok(())
	}

	/// Feeds exactly one ordinate.
	pub fn push_ordinate(&mut self, text: &str) -> Result<()> {
		let value = text
			.trim()
			.parse::<f64>()
			.with_context(|| format!("invalid ordinate '{text}'"))?;
		self.ordinates.push(value);

		if self.ordinates.len() == self.dimension {
			let coordinates = Coordinates::from_slice(&self.ordinates)?;
			self.ordinates.clear();
			let coordinates = match &self.transformer {
				Some(transformer) => transformer.transform(&coordinates)?,
				None => coordinates,
			};
			self.part.push(coordinates);
		}
		Ok(())
	}

	fn flush_pending(&mut self) -> Result<()> {
		if !self.pending.is_empty() {
			let token = std::mem::take(&mut self.pending);
			self.push_ordinate(&token)?;
		}
		Ok(())
	}

	/// Number of complete positions in the current sequence.
	#[must_use]
	pub fn len(&self) -> usize {
		self.part.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.part.is_empty() && self.ordinates.is_empty() && self.pending.is_empty()
	}

	/// Finishes the current coordinate sequence and returns it simplified and rounded.
	///
	/// `closed` marks rings: they are never simplified below four positions.
	pub fn finish_part(&mut self, closed: bool) -> Result<Vec<Coordinates>> {
		self.flush_pending()?;
		ensure!(
			self.ordinates.is_empty(),
			"incomplete coordinate tuple: got {} of {} ordinates",
			self.ordinates.len(),
			self.dimension
		);

		let mut part = std::mem::take(&mut self.part);

		if let Some(tolerance) = self.options.simplify_tolerance {
			if self.dimension == 2 && part.len() > 2 {
				let line: LineString<f64> = part.iter().map(geo::Coord::from).collect();
				let simplified: Vec<Coordinates> = line.simplify(tolerance).0.into_iter().map(Coordinates::from).collect();
				if !closed || simplified.len() >= 4 {
					trace!("simplified sequence from {} to {} positions", part.len(), simplified.len());
					part = simplified;
				}
			}
		}

		if let Some(precision) = self.options.precision {
			for c in &mut part {
				*c = c.round(precision);
			}
		}

		Ok(part)
	}
}
