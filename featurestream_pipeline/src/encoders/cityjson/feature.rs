use super::{
	BoundaryWriter, BufferKind, BufferSlots, CityJsonOptions, CityJsonVersion, GeometryMapping, Location, Section,
	SectionStack, Shape, Target, VertexTable,
};
use crate::{
	encoders::coerce_value,
	schema::{FeatureSchema, ValueType},
};
use anyhow::{Result, anyhow, bail, ensure};
use featurestream_core::json::{JsonRecorder, JsonScalar, JsonWrite};
use featurestream_geometry::{CoordinateProcessor, CrsTransformer, GeometryType, ProcessorOptions};
use log::{debug, warn};
use std::{collections::BTreeMap, sync::Arc};
use uuid::Uuid;

/// How coordinates are reprojected, simplified and rounded.
#[derive(Clone, Debug, Default)]
pub struct CoordinateSettings {
	pub transformer: Option<Arc<dyn CrsTransformer>>,
	pub options: ProcessorOptions,
}

impl CoordinateSettings {
	fn processor(&self, dimension: usize) -> Result<CoordinateProcessor> {
		CoordinateProcessor::new(dimension, self.transformer.clone(), self.options.clone())
	}
}

#[derive(Debug)]
struct CityObject {
	id: Option<String>,
	parent: Option<usize>,
	children: Vec<usize>,
	part_index: usize,
	has_surfaces: bool,
	lods: Vec<String>,
	body: JsonRecorder,
	surfaced: Option<SurfacedGeometry>,
}

impl CityObject {
	fn new(parent: Option<usize>, part_index: usize, has_surfaces: bool) -> Self {
		Self {
			id: None,
			parent,
			children: Vec::new(),
			part_index,
			has_surfaces,
			lods: Vec::new(),
			body: JsonRecorder::new(),
			surfaced: None,
		}
	}
}

/// A solid that is replaced by the thematic surfaces of its object, if any arrive.
#[derive(Debug)]
struct SurfacedGeometry {
	lod: String,
	fallback: JsonRecorder,
	started: bool,
	/// Surface index of every written polygon.
	values: Vec<usize>,
	types: BTreeMap<usize, String>,
}

impl SurfacedGeometry {
	fn new(lod: &str) -> Self {
		Self {
			lod: lod.to_string(),
			fallback: JsonRecorder::new(),
			started: false,
			values: Vec::new(),
			types: BTreeMap::new(),
		}
	}

	fn write_semantics(&self, writer: &mut dyn JsonWrite) -> Result<()> {
		let typed: Vec<(usize, &str)> = self
			.types
			.iter()
			.filter(|(index, _)| self.values.contains(index))
			.map(|(index, name)| (*index, name.as_str()))
			.collect();

		writer.start_object_field("semantics")?;
		writer.start_array_field("surfaces")?;
		for (_, name) in &typed {
			writer.start_object()?;
			writer.string_field("type", &semantic_surface_type(name))?;
			writer.end_object()?;
		}
		writer.end_array()?;
		writer.start_array_field("values")?;
		for surface in &self.values {
			match typed.iter().position(|(index, _)| index == surface) {
				Some(position) => writer.integer(position as i64)?,
				None => writer.null()?,
			}
		}
		writer.end_array()?;
		writer.end_object()
	}
}

fn semantic_surface_type(name: &str) -> String {
	match name.to_lowercase().as_str() {
		"wall" => String::from("WallSurface"),
		"roof" => String::from("RoofSurface"),
		"ground" => String::from("GroundSurface"),
		"closure" => String::from("ClosureSurface"),
		_ => name.to_string(),
	}
}

fn write_geometry_header(writer: &mut dyn JsonWrite, type_name: &str, lod: &str, version: CityJsonVersion) -> Result<()> {
	writer.start_object()?;
	writer.string_field("type", type_name)?;
	writer.field("lod")?;
	match (version, lod.parse::<f64>()) {
		(CityJsonVersion::V1_0, Ok(number)) => writer.number(number)?,
		_ => writer.string(lod)?,
	}
	writer.field("boundaries")
}

#[derive(Debug)]
struct OpenObject {
	object: usize,
	parts: Vec<usize>,
	/// Section depth right after the object was entered.
	base_depth: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Destination {
	Buffer,
	Fallback,
}

#[derive(Debug)]
struct GeometryInProgress {
	boundaries: BoundaryWriter,
	destination: Destination,
	owner: usize,
	surface: Option<usize>,
}

/// Encodes the events of one feature into a tree of city objects.
///
/// Values are written into deferred buffers of the object they belong to. When an object is
/// closed its buffers are flushed into its body, when the feature ends all objects are written
/// parent first.
#[derive(Debug)]
pub struct FeatureEncoder {
	options: Arc<CityJsonOptions>,
	schema: Arc<FeatureSchema>,
	settings: CoordinateSettings,
	sections: SectionStack,
	buffers: BufferSlots,
	objects: Vec<CityObject>,
	open: Vec<OpenObject>,
	geometry: Option<GeometryInProgress>,
	coercion_failures: usize,
}

impl FeatureEncoder {
	#[must_use]
	pub fn new(options: Arc<CityJsonOptions>, schema: Arc<FeatureSchema>, settings: CoordinateSettings) -> Self {
		let mut encoder = Self {
			buffers: BufferSlots::new(options.version),
			options,
			schema,
			settings,
			sections: SectionStack::new(),
			objects: Vec::new(),
			open: Vec::new(),
			geometry: None,
			coercion_failures: 0,
		};
		let has_surfaces = encoder.has_surfaces(&[]);
		encoder.objects.push(CityObject::new(None, 0, has_surfaces));
		encoder.sections.enter(Section::InParentObject);
		encoder.open.push(OpenObject {
			object: 0,
			parts: Vec::new(),
			base_depth: encoder.sections.depth(),
		});
		encoder
	}

	#[must_use]
	pub fn section(&self) -> Section {
		self.sections.current()
	}

	#[must_use]
	pub fn buffers(&self) -> &BufferSlots {
		&self.buffers
	}

	/// Number of values that did not match their declared type.
	#[must_use]
	pub fn coercion_failures(&self) -> usize {
		self.coercion_failures
	}

	fn has_surfaces(&self, parts: &[usize]) -> bool {
		let mut path = vec![self.options.parts.clone(); parts.len()];
		path.push(self.options.surfaces.clone());
		self.schema.resolve(&path).is_some()
	}

	fn owner(&self) -> Result<usize> {
		self.open.last().map(|o| o.object).ok_or_else(|| anyhow!("no open city object"))
	}

	pub fn property(
		&mut self,
		location: &Location,
		value: Option<&str>,
		value_type: Option<ValueType>,
		path: &str,
	) -> Result<()> {
		if location.target == Target::Ignored {
			return Ok(());
		}
		ensure!(
			!self.sections.current().is_geometry(),
			"property '{path}' arrived inside a geometry"
		);
		self.focus(&location.parts)?;
		let owner = self.owner()?;

		match &location.target {
			Target::Id => {
				self.settle()?;
				self.objects[owner].id = value.map(str::to_string);
			}
			Target::Attribute { name, array } => {
				self.settle()?;
				let scalar = self.coerce(value, value_type, path);
				self
					.buffers
					.ensure(BufferKind::Attributes, owner)?
					.attribute(name, *array, &scalar)?;
			}
			Target::Address { index, field } => {
				if self.sections.current() != Section::InAddress {
					self.settle()?;
					self.sections.enter(Section::InAddress);
				}
				let scalar = self.coerce(value, value_type, path);
				self
					.buffers
					.ensure(BufferKind::Address, owner)?
					.address_field(*index, field, &scalar)?;
			}
			Target::SurfaceType { index } => {
				self.enter_surfaces()?;
				if self.sections.current() == Section::InChildSurfaces {
					if let (Some(value), Some(surfaced)) = (value, self.objects[owner].surfaced.as_mut()) {
						surfaced.types.insert(*index, value.to_string());
					}
				}
			}
			Target::SurfaceGeometry { .. } | Target::SurfaceOther => self.enter_surfaces()?,
			Target::Geometry(mapping) => debug!("ignoring the value of geometry property '{}'", mapping.property),
			Target::Ignored => {}
		}
		Ok(())
	}

	fn coerce(&mut self, value: Option<&str>, value_type: Option<ValueType>, path: &str) -> JsonScalar {
		let Some(value) = value else {
			return JsonScalar::Null;
		};
		let (scalar, failed) = coerce_value(value, value_type, path);
		if failed {
			self.coercion_failures += 1;
		}
		scalar
	}

	pub fn coordinates(
		&mut self,
		location: &Location,
		geometry: Option<(GeometryType, usize)>,
		part: &[usize],
		text: &str,
		vertices: &mut VertexTable,
	) -> Result<()> {
		if !self.sections.current().is_geometry() {
			self.begin_geometry(location, geometry)?;
		}
		let Some(mut build) = self.geometry.take() else {
			// ignored geometry
			return Ok(());
		};
		let result = self
			.destination(build.destination, build.owner)
			.and_then(|writer| build.boundaries.chunk(part, text, writer, vertices));
		self.geometry = Some(build);
		result
	}

	pub fn geometry_end(&mut self, vertices: &mut VertexTable) -> Result<()> {
		let section = self.sections.current();
		match section {
			Section::InGeometryIgnored => {
				self.sections.leave()?;
			}
			Section::InGeometry | Section::InGeometryWithChildSurfaces | Section::InChildSurfaceGeometry => {
				let Some(mut build) = self.geometry.take() else {
					bail!("geometry ended in {section:?} without coordinates");
				};
				let writer = self.destination(build.destination, build.owner)?;
				let surfaces = build.boundaries.finish(writer, vertices)?;
				if build.surface.is_none() {
					writer.end_object()?;
				}

				match build.surface {
					Some(index) => {
						let surfaced = self.objects[build.owner]
							.surfaced
							.as_mut()
							.ok_or_else(|| anyhow!("thematic surface without a solid"))?;
						surfaced.values.extend(std::iter::repeat_n(index, surfaces));
						self.sections.leave()?;
					}
					None if section == Section::InGeometryWithChildSurfaces => {
						self.sections.switch(Section::WaitingForChildSurfaces);
					}
					None => {
						self.sections.leave()?;
					}
				}
			}
			other => bail!("geometry-end in section {other:?}"),
		}
		Ok(())
	}

	/// Closes all objects and writes them as members of `CityObjects`, returns the root id.
	pub fn finish(&mut self, writer: &mut dyn JsonWrite) -> Result<String> {
		ensure!(self.geometry.is_none(), "feature ended inside a geometry");
		while !self.open.is_empty() {
			self.close_top()?;
		}
		ensure!(
			self.sections.current() == Section::Outside && self.sections.depth() == 0,
			"feature ended in section {:?}",
			self.sections.current()
		);
		ensure!(self.buffers.is_idle(), "feature ended with buffers left open");

		let mut ids: Vec<String> = Vec::with_capacity(self.objects.len());
		for object in &self.objects {
			let id = match (&object.id, object.parent) {
				(Some(id), _) => id.clone(),
				(None, None) => Uuid::new_v4().to_string(),
				(None, Some(parent)) => format!("{}-part-{}", ids[parent], object.part_index + 1),
			};
			ids.push(id);
		}

		self.write_object(0, &ids, writer)?;
		Ok(ids.swap_remove(0))
	}

	fn write_object(&self, index: usize, ids: &[String], writer: &mut dyn JsonWrite) -> Result<()> {
		let object = &self.objects[index];
		writer.start_object_field(&ids[index])?;
		let object_type = match object.parent {
			Some(_) => &self.options.part_type,
			None => &self.options.object_type,
		};
		writer.string_field("type", object_type)?;
		if let Some(parent) = object.parent {
			writer.start_array_field("parents")?;
			writer.string(&ids[parent])?;
			writer.end_array()?;
		}
		if !object.children.is_empty() {
			writer.start_array_field("children")?;
			for child in &object.children {
				writer.string(&ids[*child])?;
			}
			writer.end_array()?;
		}
		object.body.replay(writer)?;
		writer.end_object()?;

		for child in &object.children {
			self.write_object(*child, ids, writer)?;
		}
		Ok(())
	}

	/// Closes the objects off the part chain and opens the missing ones.
	fn focus(&mut self, parts: &[usize]) -> Result<()> {
		while self.open.len() > 1 && !parts.starts_with(&self.open[self.open.len() - 1].parts) {
			self.close_top()?;
		}
		loop {
			let depth = self.open.last().map_or(0, |o| o.parts.len());
			if depth >= parts.len() {
				return Ok(());
			}
			self.open_child(parts[..=depth].to_vec())?;
		}
	}

	fn open_child(&mut self, parts: Vec<usize>) -> Result<()> {
		self.settle()?;
		let parent = self.owner()?;
		let index = self.objects.len();
		let part_index = parts.last().copied().unwrap_or(0);
		let has_surfaces = self.has_surfaces(&parts);
		self.objects.push(CityObject::new(Some(parent), part_index, has_surfaces));
		self.objects[parent].children.push(index);

		self.sections.enter(Section::InParentObject);
		self.open.push(OpenObject {
			object: index,
			parts,
			base_depth: self.sections.depth(),
		});
		Ok(())
	}

	fn close_top(&mut self) -> Result<()> {
		self.settle()?;
		let open = self.open.pop().ok_or_else(|| anyhow!("no city object to close"))?;
		while self.sections.depth() > open.base_depth {
			self.sections.leave()?;
		}
		ensure!(
			self.sections.current() == Section::InParentObject,
			"city object closed in section {:?}",
			self.sections.current()
		);

		if let Some(surfaced) = self.objects[open.object].surfaced.take() {
			self.complete_surfaces(open.object, surfaced)?;
		}
		for kind in BufferKind::ALL {
			self
				.buffers
				.stop_and_flush(kind, open.object, &mut self.objects[open.object].body)?;
		}
		self.sections.leave()?;
		Ok(())
	}

	/// Leaves the transient sections of property groups.
	fn settle(&mut self) -> Result<()> {
		loop {
			match self.sections.current() {
				Section::InAddress | Section::InChildSurfacesIgnored => {
					self.sections.leave()?;
				}
				Section::InChildSurfaces => {
					self.sections.leave()?;
					let owner = self.owner()?;
					if let Some(surfaced) = self.objects[owner].surfaced.take() {
						self.complete_surfaces(owner, surfaced)?;
					}
				}
				_ => return Ok(()),
			}
		}
	}

	fn enter_surfaces(&mut self) -> Result<()> {
		match self.sections.current() {
			Section::InChildSurfaces | Section::InChildSurfacesIgnored => {}
			_ => {
				self.settle()?;
				if self.sections.current() == Section::WaitingForChildSurfaces {
					self.sections.switch(Section::InChildSurfaces);
				} else {
					self.sections.enter(Section::InChildSurfacesIgnored);
				}
			}
		}
		Ok(())
	}

	/// Writes the thematic surfaces of an object, or its solid if none arrived.
	fn complete_surfaces(&mut self, owner: usize, surfaced: SurfacedGeometry) -> Result<()> {
		let writer = self.destination(Destination::Buffer, owner)?;
		if surfaced.started {
			writer.end_array()?;
			surfaced.write_semantics(writer)?;
			writer.end_object()?;
		} else if !surfaced.fallback.is_empty() {
			debug!("no thematic surfaces arrived, writing the LoD {} solid", surfaced.lod);
			writer.append(surfaced.fallback);
		}
		Ok(())
	}

	fn destination(&mut self, destination: Destination, owner: usize) -> Result<&mut JsonRecorder> {
		match destination {
			Destination::Buffer => self
				.buffers
				.active_for(BufferKind::Geometry, owner)
				.map(|buffer| buffer.writer())
				.ok_or_else(|| anyhow!("geometry buffer of city object {owner} is not active")),
			Destination::Fallback => self.objects[owner]
				.surfaced
				.as_mut()
				.map(|surfaced| &mut surfaced.fallback)
				.ok_or_else(|| anyhow!("city object {owner} has no solid to replace")),
		}
	}

	fn begin_geometry(&mut self, location: &Location, geometry: Option<(GeometryType, usize)>) -> Result<()> {
		self.focus(&location.parts)?;
		match &location.target {
			Target::Geometry(mapping) => self.begin_object_geometry(mapping, geometry),
			Target::SurfaceGeometry { index } => self.begin_surface_geometry(*index, geometry),
			other => {
				self.settle()?;
				warn!("ignoring coordinates of {other:?}");
				self.sections.enter(Section::InGeometryIgnored);
				Ok(())
			}
		}
	}

	fn begin_object_geometry(&mut self, mapping: &GeometryMapping, geometry: Option<(GeometryType, usize)>) -> Result<()> {
		self.settle()?;
		let owner = self.owner()?;
		let shape = geometry.and_then(|(geometry_type, _)| Shape::of(geometry_type, mapping.solid));

		let skip = if self.sections.current() == Section::WaitingForChildSurfaces {
			Some("waiting for thematic surfaces")
		} else if !self.options.accepts_lod(&mapping.lod) {
			Some("filtered LoD")
		} else if self.objects[owner].lods.contains(&mapping.lod) {
			Some("LoD already written")
		} else {
			None
		};
		let (Some((geometry_type, dimension)), Some(shape), None) = (geometry, shape, skip) else {
			match skip {
				Some(reason) => debug!("ignoring geometry '{}': {reason}", mapping.property),
				None => warn!("ignoring geometry '{}' of type {geometry:?}", mapping.property),
			}
			self.sections.enter(Section::InGeometryIgnored);
			return Ok(());
		};

		let processor = self.settings.processor(dimension)?;
		let object = &mut self.objects[owner];
		object.lods.push(mapping.lod.clone());
		let surfaced = mapping.solid
			&& mapping.lod == self.options.surfaces_lod
			&& object.has_surfaces
			&& object.surfaced.is_none();

		self.buffers.ensure(BufferKind::Geometry, owner)?;
		let destination = if surfaced {
			self.objects[owner].surfaced = Some(SurfacedGeometry::new(&mapping.lod));
			self.sections.enter(Section::InGeometryWithChildSurfaces);
			Destination::Fallback
		} else {
			self.sections.enter(Section::InGeometry);
			Destination::Buffer
		};

		let version = self.options.version;
		write_geometry_header(self.destination(destination, owner)?, shape.type_name, &mapping.lod, version)?;
		self.geometry = Some(GeometryInProgress {
			boundaries: BoundaryWriter::new(geometry_type, processor, shape.wrap, false)?,
			destination,
			owner,
			surface: None,
		});
		Ok(())
	}

	fn begin_surface_geometry(&mut self, index: usize, geometry: Option<(GeometryType, usize)>) -> Result<()> {
		self.enter_surfaces()?;
		let owner = self.owner()?;
		let areal = geometry.filter(|(t, _)| matches!(t, GeometryType::Polygon | GeometryType::MultiPolygon));
		let (Some((geometry_type, dimension)), Section::InChildSurfaces) = (areal, self.sections.current()) else {
			if areal.is_none() {
				warn!("ignoring thematic surface {index} of type {geometry:?}");
			}
			self.sections.enter(Section::InGeometryIgnored);
			return Ok(());
		};

		let processor = self.settings.processor(dimension)?;
		let Some(surfaced) = self.objects[owner].surfaced.as_mut() else {
			bail!("thematic surfaces of city object {owner} without a solid");
		};
		let first = !surfaced.started;
		surfaced.started = true;
		let lod = surfaced.lod.clone();

		self.sections.enter(Section::InChildSurfaceGeometry);
		let version = self.options.version;
		let writer = self.destination(Destination::Buffer, owner)?;
		if first {
			write_geometry_header(writer, "MultiSurface", &lod, version)?;
			writer.start_array()?;
		}
		let wrap = Shape::of(geometry_type, false).map_or(0, |shape| shape.wrap);
		self.geometry = Some(GeometryInProgress {
			boundaries: BoundaryWriter::new(geometry_type, processor, wrap, true)?,
			destination: Destination::Buffer,
			owner,
			surface: Some(index),
		});
		Ok(())
	}
}
