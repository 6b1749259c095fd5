use anyhow::{Result, anyhow};
use log::trace;

/// Where in the object tree of a feature the encoder currently is.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Section {
	#[default]
	Outside,
	InParentObject,
	InAddress,
	InGeometry,
	InGeometryIgnored,
	/// Writing a solid that thematic surfaces of the same object may replace.
	InGeometryWithChildSurfaces,
	WaitingForChildSurfaces,
	InChildSurfaces,
	InChildSurfaceGeometry,
	InChildSurfacesIgnored,
}

impl Section {
	#[must_use]
	pub fn is_geometry(&self) -> bool {
		matches!(
			self,
			Section::InGeometry
				| Section::InGeometryIgnored
				| Section::InGeometryWithChildSurfaces
				| Section::InChildSurfaceGeometry
		)
	}
}

/// Nested sections with their enclosing sections kept on an explicit stack.
///
/// Every `enter` returns to the section it was called in on the matching `leave`, whatever the
/// nesting depth of parts within parts.
#[derive(Clone, Debug, Default)]
pub struct SectionStack {
	current: Section,
	previous: Vec<Section>,
}

impl SectionStack {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn current(&self) -> Section {
		self.current
	}

	/// Number of enclosing sections.
	#[must_use]
	pub fn depth(&self) -> usize {
		self.previous.len()
	}

	pub fn enter(&mut self, section: Section) {
		trace!("section {:?} -> {section:?}", self.current);
		self.previous.push(self.current);
		self.current = section;
	}

	/// Replaces the current section without changing where `leave` returns to.
	pub fn switch(&mut self, section: Section) {
		trace!("section {:?} => {section:?}", self.current);
		self.current = section;
	}

	pub fn leave(&mut self) -> Result<Section> {
		let previous = self
			.previous
			.pop()
			.ok_or_else(|| anyhow!("cannot leave section {:?}, it was never entered", self.current))?;
		trace!("section {:?} <- {previous:?}", self.current);
		self.current = previous;
		Ok(previous)
	}
}
