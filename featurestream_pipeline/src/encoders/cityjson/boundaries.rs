use super::CityJsonOptions;
use anyhow::{Result, bail, ensure};
use featurestream_core::json::JsonWrite;
use featurestream_geometry::{CoordinateProcessor, Coordinates, GeometryType, VertexTransform, Vertices};
use log::warn;

/// The CityJSON geometry a streamed geometry becomes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Shape {
	pub type_name: &'static str,
	/// Arrays around the nesting of the streamed geometry.
	pub wrap: usize,
}

impl Shape {
	#[must_use]
	pub fn of(geometry_type: GeometryType, solid: bool) -> Option<Shape> {
		use GeometryType::*;
		let (type_name, wrap) = match (geometry_type, solid) {
			(Polygon, true) => ("Solid", 2),
			(MultiPolygon, true) => ("Solid", 1),
			(_, true) => return None,
			(Point, false) => ("MultiPoint", 1),
			(MultiPoint, false) => ("MultiPoint", 0),
			(LineString, false) => ("MultiLineString", 1),
			(MultiLineString, false) => ("MultiLineString", 0),
			(Polygon, false) => ("MultiSurface", 1),
			(MultiPolygon, false) => ("MultiSurface", 0),
		};
		Some(Shape { type_name, wrap })
	}
}

/// The vertex table, created with the first vertex unless the translation is configured.
#[derive(Debug)]
pub struct VertexTable {
	scale: [f64; 3],
	translate: Option<[f64; 3]>,
	deduplicate: bool,
	vertices: Option<Vertices>,
}

impl VertexTable {
	#[must_use]
	pub fn new(options: &CityJsonOptions) -> Self {
		Self {
			scale: options.scale,
			translate: options.translate,
			deduplicate: options.deduplicate_vertices,
			vertices: None,
		}
	}

	/// A table whose translation is known before any vertex arrives.
	#[must_use]
	pub fn with_translate(options: &CityJsonOptions, translate: [f64; 3]) -> Self {
		Self {
			translate: Some(translate),
			..Self::new(options)
		}
	}

	pub fn add(&mut self, coordinates: &Coordinates) -> Result<usize> {
		if self.vertices.is_none() {
			let transform = match self.translate {
				Some(translate) => VertexTransform::new(self.scale, translate)?,
				None => VertexTransform::anchored_at(self.scale, coordinates)?,
			};
			self.vertices = Some(Vertices::new(transform, self.deduplicate));
		}
		match &mut self.vertices {
			Some(vertices) => vertices.add(coordinates),
			None => bail!("vertex table is missing"),
		}
	}

	pub fn transform(&self) -> Result<VertexTransform> {
		match &self.vertices {
			Some(vertices) => Ok(*vertices.transform()),
			None => VertexTransform::new(self.scale, self.translate.unwrap_or_default()),
		}
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.vertices.as_ref().map_or(0, Vertices::len)
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Drops the vertices but keeps the transform.
	pub fn clear(&mut self) {
		if let Some(vertices) = &mut self.vertices {
			vertices.clear();
		}
	}

	pub fn write_json(&self, writer: &mut dyn JsonWrite) -> Result<()> {
		match &self.vertices {
			Some(vertices) => vertices.write_json(writer),
			None => {
				writer.start_array()?;
				writer.end_array()
			}
		}
	}
}

/// Streams the `boundaries` of a CityJSON geometry as vertex indices.
///
/// Works like the GeoJSON geometry writer, with indices into the vertex table in place of
/// positions. Rings drop their closing position.
#[derive(Debug)]
pub struct BoundaryWriter {
	geometry_type: GeometryType,
	processor: CoordinateProcessor,
	/// Arrays opened at the start and closed at the end, the first part level is never reopened.
	fixed: usize,
	open: Option<Vec<usize>>,
	surfaces: usize,
}

impl BoundaryWriter {
	/// With `appended`, the outermost array is already open and belongs to the caller.
	pub fn new(geometry_type: GeometryType, processor: CoordinateProcessor, wrap: usize, appended: bool) -> Result<Self> {
		let levels = wrap + geometry_type.part_depth();
		ensure!(
			!appended || levels > 0,
			"a {geometry_type} cannot be appended to other boundaries"
		);
		Ok(Self {
			geometry_type,
			processor,
			fixed: levels - usize::from(appended),
			open: None,
			surfaces: 0,
		})
	}

	fn part_levels(&self) -> usize {
		self.geometry_type.part_depth()
	}

	fn normalize(&self, part: &[usize]) -> Vec<usize> {
		let depth = self.part_levels();
		if part.len() > depth {
			warn!("ignoring surplus part indices {part:?} of a {}", self.geometry_type);
		}
		(0..depth).map(|i| part.get(i).copied().unwrap_or(0)).collect()
	}

	pub fn chunk(
		&mut self,
		part: &[usize],
		text: &str,
		writer: &mut dyn JsonWrite,
		vertices: &mut VertexTable,
	) -> Result<()> {
		let part = self.normalize(part);
		let depth = part.len();
		let transition = self.open.as_ref().map(|open| open.iter().zip(&part).position(|(a, b)| a != b));

		match transition {
			None => {
				for _ in 0..self.fixed {
					writer.start_array()?;
				}
				self.surfaces = 1;
				self.begin_sequence(writer)?;
			}
			Some(Some(changed)) => {
				self.finish_sequence(writer, vertices)?;
				for _ in changed + 1..depth {
					writer.end_array()?;
				}
				for _ in changed + 1..depth {
					writer.start_array()?;
				}
				if changed == 0 && self.geometry_type == GeometryType::MultiPolygon {
					self.surfaces += 1;
				}
				self.begin_sequence(writer)?;
			}
			Some(None) => {}
		}

		self.open = Some(part);
		self.processor.push_chunk(text)
	}

	fn begin_sequence(&self, writer: &mut dyn JsonWrite) -> Result<()> {
		if self.geometry_type == GeometryType::Point {
			Ok(())
		} else {
			writer.start_array()
		}
	}

	fn finish_sequence(&mut self, writer: &mut dyn JsonWrite, vertices: &mut VertexTable) -> Result<()> {
		let closed = self.geometry_type.is_areal();
		let mut positions = self.processor.finish_part(closed)?;
		if self.geometry_type == GeometryType::Point {
			ensure!(
				positions.len() == 1,
				"a point needs exactly one position, got {}",
				positions.len()
			);
			return writer.integer(vertices.add(&positions[0])? as i64);
		}
		if closed && positions.len() > 1 && positions.first() == positions.last() {
			positions.pop();
		}
		for position in &positions {
			writer.integer(vertices.add(position)? as i64)?;
		}
		writer.end_array()
	}

	/// Closes all arrays and returns the number of surfaces written.
	pub fn finish(&mut self, writer: &mut dyn JsonWrite, vertices: &mut VertexTable) -> Result<usize> {
		if self.open.take().is_none() {
			bail!("boundaries finished before any coordinates arrived");
		}
		self.finish_sequence(writer, vertices)?;
		for _ in 0..self.fixed {
			writer.end_array()?;
		}
		Ok(self.surfaces)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use featurestream_core::json::JsonRecorder;
	use featurestream_geometry::ProcessorOptions;
	use pretty_assertions::assert_eq;

	fn write(
		geometry_type: GeometryType,
		wrap: usize,
		appended: bool,
		chunks: &[(&[usize], &str)],
	) -> Result<(String, usize)> {
		let options = CityJsonOptions {
			translate: Some([0.0; 3]),
			scale: [1.0; 3],
			..CityJsonOptions::default()
		};
		let mut vertices = VertexTable::new(&options);
		let processor = CoordinateProcessor::new(2, None, ProcessorOptions::default())?;
		let mut boundaries = BoundaryWriter::new(geometry_type, processor, wrap, appended)?;
		let mut recorder = JsonRecorder::new();
		if appended {
			recorder.start_array()?;
		}
		for (part, text) in chunks {
			boundaries.chunk(part, text, &mut recorder, &mut vertices)?;
		}
		let surfaces = boundaries.finish(&mut recorder, &mut vertices)?;
		if appended {
			recorder.end_array()?;
		}
		Ok((recorder.to_json_string()?, surfaces))
	}

	#[test]
	fn shapes() {
		assert_eq!(Shape::of(GeometryType::MultiPolygon, true), Some(Shape {
			type_name: "Solid",
			wrap: 1
		}));
		assert_eq!(Shape::of(GeometryType::LineString, true), None);
		assert_eq!(Shape::of(GeometryType::Point, false), Some(Shape {
			type_name: "MultiPoint",
			wrap: 1
		}));
	}

	#[test]
	fn point_as_multi_point() -> Result<()> {
		assert_eq!(write(GeometryType::Point, 1, false, &[(&[], "3 4")])?.0, "[0]");
		Ok(())
	}

	#[test]
	fn polygon_as_multi_surface_without_closing_vertex() -> Result<()> {
		assert_eq!(
			write(GeometryType::Polygon, 1, false, &[(&[0], "0 0 1 0 1 1 0 0")])?,
			(String::from("[[[0,1,2]]]"), 1)
		);
		Ok(())
	}

	#[test]
	fn multi_polygon_as_solid_shares_vertices() -> Result<()> {
		let (json, surfaces) = write(
			GeometryType::MultiPolygon,
			1,
			false,
			&[(&[0, 0], "0 0 1 0 1 1 0 0"), (&[1, 0], "1 0 1 1 2 2 1 0")],
		)?;
		assert_eq!(json, "[[[[0,1,2]],[[1,2,3]]]]");
		assert_eq!(surfaces, 2);
		Ok(())
	}

	#[test]
	fn multi_polygon_appended_to_open_surfaces() -> Result<()> {
		assert_eq!(
			write(
				GeometryType::MultiPolygon,
				0,
				true,
				&[(&[0, 0], "0 0 1 0 1 1 0 0"), (&[1, 0], "5 5 6 5 6 6 5 5")],
			)?,
			(String::from("[[[0,1,2]],[[3,4,5]]]"), 2)
		);
		Ok(())
	}

	#[test]
	fn polygon_appended_to_open_surfaces() -> Result<()> {
		assert_eq!(
			write(
				GeometryType::Polygon,
				1,
				true,
				&[(&[0], "0 0 4 0 4 4 0 0"), (&[1], "1 1 2 1 2 2 1 1")],
			)?,
			(String::from("[[[0,1,2],[3,4,5]]]"), 1)
		);
		Ok(())
	}

	#[test]
	fn vertex_table_anchors_at_first_vertex() -> Result<()> {
		let mut table = VertexTable::new(&CityJsonOptions::default());
		assert_eq!(table.add(&Coordinates::new_3d(1.0, 2.0, 3.0))?, 0);
		assert_eq!(table.add(&Coordinates::new_3d(1.0, 2.0, 3.0))?, 0);
		assert_eq!(table.len(), 1);
		assert_eq!(table.transform()?.translate, [1.0, 2.0, 3.0]);
		Ok(())
	}
}
