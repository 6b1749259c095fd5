//! Quantized, indexed vertex table as used by CityJSON.
//!
//! Every accepted position is shifted by `translate`, divided by `scale` and rounded to the
//! nearest integer. Geometries reference positions by their index in the table. Decoding
//! `v * scale + translate` reproduces the original within `scale / 2` per axis.

use super::Coordinates;
use anyhow::{Result, ensure};
use featurestream_core::json::JsonWrite;
use std::collections::HashMap;

// Integers beyond 2^53 are no longer exact in the consumers' float math.
const MAX_QUANTIZED: f64 = 9_007_199_254_740_992.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexTransform {
	pub scale: [f64; 3],
	pub translate: [f64; 3],
}

impl VertexTransform {
	pub fn new(scale: [f64; 3], translate: [f64; 3]) -> Result<Self> {
		ensure!(
			scale.iter().all(|s| s.is_finite() && *s > 0.0),
			"scale must be positive, got {scale:?}"
		);
		ensure!(
			translate.iter().all(|t| t.is_finite()),
			"translate must be finite, got {translate:?}"
		);
		Ok(Self { scale, translate })
	}

	/// Uses the floored position as translation, keeping quantized values small.
	pub fn anchored_at(scale: [f64; 3], origin: &Coordinates) -> Result<Self> {
		Self::new(scale, origin.as_xyz().map(f64::floor))
	}

	pub fn quantize(&self, coordinates: &Coordinates) -> Result<[i64; 3]> {
		let xyz = coordinates.as_xyz();
		let mut result = [0i64; 3];
		for axis in 0..3 {
			let value = ((xyz[axis] - self.translate[axis]) / self.scale[axis]).round();
			ensure!(
				value.is_finite() && value.abs() < MAX_QUANTIZED,
				"cannot quantize {coordinates:?} with scale {:?} and translate {:?}",
				self.scale,
				self.translate
			);
			result[axis] = value as i64;
		}
		Ok(result)
	}

	#[must_use]
	pub fn decode(&self, vertex: [i64; 3]) -> [f64; 3] {
		[0, 1, 2].map(|axis| vertex[axis] as f64 * self.scale[axis] + self.translate[axis])
	}

	/// Writes `{"scale":[…],"translate":[…]}`.
	pub fn write_json(&self, writer: &mut dyn JsonWrite) -> Result<()> {
		writer.start_object()?;
		for (name, values) in [("scale", self.scale), ("translate", self.translate)] {
			writer.start_array_field(name)?;
			for v in values {
				writer.number(v)?;
			}
			writer.end_array()?;
		}
		writer.end_object()
	}
}

#[derive(Clone, Debug)]
pub struct Vertices {
	transform: VertexTransform,
	entries: Vec<[i64; 3]>,
	index: Option<HashMap<[i64; 3], usize>>,
}

impl Vertices {
	/// With `deduplicate`, identical quantized positions share one index.
	#[must_use]
	pub fn new(transform: VertexTransform, deduplicate: bool) -> Self {
		Self {
			transform,
			entries: Vec::new(),
			index: deduplicate.then(HashMap::new),
		}
	}

	/// Quantizes a position and returns its index in the table.
	pub fn add(&mut self, coordinates: &Coordinates) -> Result<usize> {
		let vertex = self.transform.quantize(coordinates)?;
		if let Some(index) = &mut self.index {
			if let Some(i) = index.get(&vertex) {
				return Ok(*i);
			}
			index.insert(vertex, self.entries.len());
		}
		self.entries.push(vertex);
		Ok(self.entries.len() - 1)
	}

	#[must_use]
	pub fn transform(&self) -> &VertexTransform {
		&self.transform
	}

	#[must_use]
	pub fn entries(&self) -> &[[i64; 3]] {
		&self.entries
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn clear(&mut self) {
		self.entries.clear();
		if let Some(index) = &mut self.index {
			index.clear();
		}
	}

	/// Writes the table as an array of integer triples.
	pub fn write_json(&self, writer: &mut dyn JsonWrite) -> Result<()> {
		writer.start_array()?;
		for vertex in &self.entries {
			writer.start_array()?;
			for v in vertex {
				writer.integer(*v)?;
			}
			writer.end_array()?;
		}
		writer.end_array()
	}
}
