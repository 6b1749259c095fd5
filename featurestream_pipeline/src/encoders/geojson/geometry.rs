use anyhow::{Result, bail, ensure};
use featurestream_core::json::JsonWrite;
use featurestream_geometry::{CoordinateProcessor, GeometryType};
use log::warn;

/// Streams one GeoJSON geometry object while its coordinate chunks arrive.
///
/// Nesting arrays are opened and closed whenever the part index of the chunks changes, so
/// only the current coordinate sequence is held in memory.
#[derive(Debug)]
pub struct GeometryWriter {
	geometry_type: GeometryType,
	processor: CoordinateProcessor,
	open: Option<Vec<usize>>,
}

impl GeometryWriter {
	#[must_use]
	pub fn new(geometry_type: GeometryType, processor: CoordinateProcessor) -> Self {
		Self {
			geometry_type,
			processor,
			open: None,
		}
	}

	fn normalize(&self, part: &[usize]) -> Vec<usize> {
		let depth = self.geometry_type.part_depth();
		if part.len() > depth {
			warn!("ignoring surplus part indices {part:?} of a {}", self.geometry_type);
		}
		(0..depth).map(|i| part.get(i).copied().unwrap_or(0)).collect()
	}

	pub fn chunk(&mut self, part: &[usize], text: &str, writer: &mut dyn JsonWrite) -> Result<()> {
		let part = self.normalize(part);
		let depth = part.len();

		// index of the first changed part, `None` while the same sequence continues
		let transition = self.open.as_ref().map(|open| open.iter().zip(&part).position(|(a, b)| a != b));

		match transition {
			None => {
				writer.start_object()?;
				writer.string_field("type", self.geometry_type.as_geojson_str())?;
				writer.field("coordinates")?;
				for _ in 0..depth {
					writer.start_array()?;
				}
				self.begin_sequence(writer)?;
			}
			Some(Some(changed)) => {
				self.finish_sequence(writer)?;
				for _ in changed + 1..depth {
					writer.end_array()?;
				}
				for _ in changed + 1..depth {
					writer.start_array()?;
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

	fn finish_sequence(&mut self, writer: &mut dyn JsonWrite) -> Result<()> {
		let positions = self.processor.finish_part(self.geometry_type.is_areal())?;
		if self.geometry_type == GeometryType::Point {
			ensure!(
				positions.len() == 1,
				"a point needs exactly one position, got {}",
				positions.len()
			);
			return positions[0].write_json(writer);
		}
		for position in &positions {
			position.write_json(writer)?;
		}
		writer.end_array()
	}

	/// Closes the geometry object.
	pub fn finish(&mut self, writer: &mut dyn JsonWrite) -> Result<()> {
		let Some(open) = self.open.take() else {
			bail!("geometry finished before any coordinates arrived");
		};
		self.finish_sequence(writer)?;
		for _ in 0..open.len() {
			writer.end_array()?;
		}
		writer.end_object()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use featurestream_core::json::JsonRecorder;
	use featurestream_geometry::ProcessorOptions;
	use pretty_assertions::assert_eq;

	fn write(geometry_type: GeometryType, chunks: &[(&[usize], &str)]) -> Result<String> {
		let processor = CoordinateProcessor::new(2, None, ProcessorOptions::default())?;
		let mut geometry = GeometryWriter::new(geometry_type, processor);
		let mut recorder = JsonRecorder::new();
		for (part, text) in chunks {
			geometry.chunk(part, text, &mut recorder)?;
		}
		geometry.finish(&mut recorder)?;
		recorder.to_json_string()
	}

	#[test]
	fn point() -> Result<()> {
		assert_eq!(
			write(GeometryType::Point, &[(&[], "7.1 "), (&[], "50.2")])?,
			r#"{"type":"Point","coordinates":[7.1,50.2]}"#
		);
		Ok(())
	}

	#[test]
	fn point_with_two_positions_fails() {
		assert!(write(GeometryType::Point, &[(&[], "1 2 3 4")]).is_err());
	}

	#[test]
	fn line_string_split_inside_a_number() -> Result<()> {
		assert_eq!(
			write(GeometryType::LineString, &[(&[], "1 2 3"), (&[], "0 5")])?,
			r#"{"type":"LineString","coordinates":[[1,2],[30,5]]}"#
		);
		Ok(())
	}

	#[test]
	fn polygon_with_hole() -> Result<()> {
		assert_eq!(
			write(
				GeometryType::Polygon,
				&[
					(&[0], "0 0 4 0 4 4 0 4 0 0"),
					(&[1], "1 1 2 1 2 2 1 1"),
				]
			)?,
			r#"{"type":"Polygon","coordinates":[[[0,0],[4,0],[4,4],[0,4],[0,0]],[[1,1],[2,1],[2,2],[1,1]]]}"#
		);
		Ok(())
	}

	#[test]
	fn multi_polygon() -> Result<()> {
		assert_eq!(
			write(
				GeometryType::MultiPolygon,
				&[
					(&[0, 0], "0 0 1 0 1 1 0 0"),
					(&[1, 0], "5 5 6 5 6 6 5 5"),
					(&[1, 1], "5.2 5.2 5.4 5.2 5.4 5.4 5.2 5.2"),
				]
			)?,
			r#"{"type":"MultiPolygon","coordinates":[[[[0,0],[1,0],[1,1],[0,0]]],[[[5,5],[6,5],[6,6],[5,5]],[[5.2,5.2],[5.4,5.2],[5.4,5.4],[5.2,5.2]]]]}"#
		);
		Ok(())
	}

	#[test]
	fn multi_line_string_with_missing_part_index() -> Result<()> {
		assert_eq!(
			write(GeometryType::MultiLineString, &[(&[], "0 0 1 1"), (&[1], "2 2 3 3")])?,
			r#"{"type":"MultiLineString","coordinates":[[[0,0],[1,1]],[[2,2],[3,3]]]}"#
		);
		Ok(())
	}

	#[test]
	fn finish_without_coordinates_fails() -> Result<()> {
		let processor = CoordinateProcessor::new(2, None, ProcessorOptions::default())?;
		let mut geometry = GeometryWriter::new(GeometryType::Point, processor);
		assert!(geometry.finish(&mut JsonRecorder::new()).is_err());
		Ok(())
	}
}
