use anyhow::Result;
use featurestream_core::json::{JsonWrite, round_to_precision};
use std::fmt::Debug;

/// A 2D or 3D position.
#[derive(Clone, Copy, PartialEq)]
pub struct Coordinates {
	xyz: [f64; 3],
	has_z: bool,
}

impl Coordinates {
	#[must_use]
	pub fn new(x: f64, y: f64) -> Self {
		Self {
			xyz: [x, y, 0.0],
			has_z: false,
		}
	}

	#[must_use]
	pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
		Self {
			xyz: [x, y, z],
			has_z: true,
		}
	}

	/// Builds coordinates from two or three ordinates.
	pub fn from_slice(values: &[f64]) -> Result<Self> {
		match values {
			[x, y] => Ok(Self::new(*x, *y)),
			[x, y, z] => Ok(Self::new_3d(*x, *y, *z)),
			_ => anyhow::bail!("coordinates need 2 or 3 ordinates, got {}", values.len()),
		}
	}

	#[must_use]
	pub fn x(&self) -> f64 {
		self.xyz[0]
	}

	#[must_use]
	pub fn y(&self) -> f64 {
		self.xyz[1]
	}

	#[must_use]
	pub fn z(&self) -> Option<f64> {
		self.has_z.then_some(self.xyz[2])
	}

	#[must_use]
	pub fn dimension(&self) -> usize {
		if self.has_z { 3 } else { 2 }
	}

	/// All three ordinates, a missing z is `0`.
	#[must_use]
	pub fn as_xyz(&self) -> [f64; 3] {
		self.xyz
	}

	#[must_use]
	pub fn with_xy(&self, x: f64, y: f64) -> Self {
		Self {
			xyz: [x, y, self.xyz[2]],
			has_z: self.has_z,
		}
	}

	#[must_use]
	pub fn round(&self, precision: u8) -> Self {
		Self {
			xyz: self.xyz.map(|v| round_to_precision(v, precision)),
			has_z: self.has_z,
		}
	}

	/// Writes the position as a JSON array of numbers.
	pub fn write_json(&self, writer: &mut dyn JsonWrite) -> Result<()> {
		writer.start_array()?;
		writer.number(self.x())?;
		writer.number(self.y())?;
		if let Some(z) = self.z() {
			writer.number(z)?;
		}
		writer.end_array()
	}
}

impl From<[f64; 2]> for Coordinates {
	fn from(value: [f64; 2]) -> Self {
		Coordinates::new(value[0], value[1])
	}
}

impl From<[f64; 3]> for Coordinates {
	fn from(value: [f64; 3]) -> Self {
		Coordinates::new_3d(value[0], value[1], value[2])
	}
}

impl From<(f64, f64)> for Coordinates {
	fn from(value: (f64, f64)) -> Self {
		Coordinates::new(value.0, value.1)
	}
}

impl From<geo::Coord> for Coordinates {
	fn from(value: geo::Coord) -> Self {
		Coordinates::new(value.x, value.y)
	}
}

impl From<&Coordinates> for geo::Coord {
	fn from(value: &Coordinates) -> Self {
		geo::Coord {
			x: value.x(),
			y: value.y(),
		}
	}
}

impl Debug for Coordinates {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.has_z {
			self.xyz.fmt(f)
		} else {
			[self.xyz[0], self.xyz[1]].fmt(f)
		}
	}
}
