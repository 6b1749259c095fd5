use super::{EventKind, FeatureEvent};
use crate::{
	rules::{CodelistLookup, Codelists, RuleTable},
	schema::{FeatureSchema, PropertyPath, PropertySchema},
};
use anyhow::Result;
use featurestream_geometry::{Crs, CrsTransformer, CrsTransformerFactory, DefaultCrsTransformerFactory, ProcessorOptions};
use serde::Deserialize;
use std::{io::Write, sync::Arc};

/// Which representation of the features was requested.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
	#[default]
	Full,
	/// Reduced representation used for collection overviews.
	Overview,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Link {
	pub href: String,
	pub rel: String,
	#[serde(default, rename = "type")]
	pub media_type: Option<String>,
	#[serde(default)]
	pub title: Option<String>,
}

impl Link {
	#[must_use]
	pub fn new(href: &str, rel: &str) -> Self {
		Self {
			href: href.to_string(),
			rel: rel.to_string(),
			media_type: None,
			title: None,
		}
	}
}

/// Everything fixed for the duration of one response.
///
/// Writers may replace the request for the writers after them by swapping the `Arc` in the
/// context. The replacement is only visible while the current event is dispatched.
#[derive(Clone, Debug)]
pub struct RequestContext {
	pub schema: Arc<FeatureSchema>,
	pub rules: Arc<RuleTable>,
	pub codelists: Arc<dyn CodelistLookup>,
	pub crs_transformers: Arc<dyn CrsTransformerFactory>,
	pub source_crs: Crs,
	pub target_crs: Crs,
	pub representation: Representation,
	/// Top-level properties to emit, all when `None`.
	pub properties: Option<Vec<String>>,
	pub skip_geometry: bool,
	pub links: Vec<Link>,
	/// Link relations removed before the links are written.
	pub excluded_link_rels: Vec<String>,
	pub service_url: String,
	pub pretty: bool,
	pub precision: Option<u8>,
	pub simplify_tolerance: Option<f64>,
}

impl RequestContext {
	#[must_use]
	pub fn new(schema: FeatureSchema) -> Self {
		Self {
			schema: Arc::new(schema),
			rules: Arc::new(RuleTable::default()),
			codelists: Arc::new(Codelists::default()),
			crs_transformers: Arc::new(DefaultCrsTransformerFactory),
			source_crs: Crs::Crs84,
			target_crs: Crs::Crs84,
			representation: Representation::Full,
			properties: None,
			skip_geometry: false,
			links: Vec::new(),
			excluded_link_rels: Vec::new(),
			service_url: String::new(),
			pretty: false,
			precision: None,
			simplify_tolerance: None,
		}
	}

	#[must_use]
	pub fn processor_options(&self) -> ProcessorOptions {
		ProcessorOptions {
			precision: self.precision,
			simplify_tolerance: self.simplify_tolerance,
		}
	}

	/// The reprojection from source to target CRS, `None` if they are equal.
	pub fn crs_transformer(&self) -> Result<Option<Arc<dyn CrsTransformer>>> {
		Ok(self.crs_transformers.get(&self.source_crs, &self.target_crs)?)
	}
}

/// Describes the event being dispatched.
///
/// `path` and `property` start out as the source path and its descriptor. Writers may rewrite
/// them for the writers after them, e.g. after renaming a property.
#[derive(Clone, Debug, Default)]
pub struct CursorState {
	pub kind: Option<EventKind>,
	pub number_matched: Option<u64>,
	pub number_returned: Option<u64>,
	/// Descriptor of the emitted feature type.
	pub feature_type: Arc<FeatureSchema>,
	/// Number of features started so far.
	pub feature_count: u64,
	pub path: PropertyPath,
	pub property: Option<Arc<PropertySchema>>,
	pub multiplicity: Vec<usize>,
	pub geometry_part: Vec<usize>,
	/// Property value, or the raw text of a coordinate chunk.
	pub value: Option<String>,
}

impl CursorState {
	/// Moves the cursor to `event`, resolving paths against the source `schema`.
	pub fn advance(&mut self, event: FeatureEvent, schema: &Arc<FeatureSchema>) {
		self.kind = Some(event.kind());
		match event {
			FeatureEvent::Start {
				number_matched,
				number_returned,
			} => {
				self.number_matched = number_matched;
				self.number_returned = number_returned;
				self.feature_type = schema.clone();
				self.feature_count = 0;
				self.clear_location();
			}
			FeatureEvent::FeatureStart => {
				self.feature_count += 1;
				self.clear_location();
			}
			FeatureEvent::End | FeatureEvent::FeatureEnd => self.clear_location(),
			FeatureEvent::Property {
				path,
				multiplicity,
				value,
			} => {
				self.locate(path, multiplicity, schema);
				self.geometry_part.clear();
				self.value = value;
			}
			FeatureEvent::CoordinateChunk {
				path,
				multiplicity,
				part,
				text,
			} => {
				self.locate(path, multiplicity, schema);
				self.geometry_part = part;
				self.value = Some(text);
			}
			FeatureEvent::GeometryEnd => {
				self.value = None;
			}
		}
	}

	/// Points the cursor at a source path.
	pub fn locate(&mut self, path: PropertyPath, multiplicity: Vec<usize>, schema: &FeatureSchema) {
		self.property = schema.resolve_path(&path);
		self.path = path;
		self.multiplicity = multiplicity;
	}

	fn clear_location(&mut self) {
		self.path = PropertyPath::default();
		self.property = None;
		self.multiplicity.clear();
		self.geometry_part.clear();
		self.value = None;
	}
}

pub struct TransformationContext<'a> {
	pub request: Arc<RequestContext>,
	pub cursor: CursorState,
	pub output: &'a mut dyn Write,
}

impl<'a> TransformationContext<'a> {
	pub fn new(request: Arc<RequestContext>, output: &'a mut dyn Write) -> Self {
		Self {
			request,
			cursor: CursorState::default(),
			output,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::ValueType;
	use pretty_assertions::assert_eq;

	fn schema() -> Arc<FeatureSchema> {
		Arc::new(FeatureSchema::new(
			"t",
			vec![PropertySchema::value("name", ValueType::String)],
		))
	}

	#[test]
	fn advance_tracks_location() {
		let schema = schema();
		let mut cursor = CursorState::default();
		cursor.advance(
			FeatureEvent::Start {
				number_matched: Some(3),
				number_returned: Some(1),
			},
			&schema,
		);
		assert_eq!(cursor.number_matched, Some(3));
		assert_eq!(cursor.feature_type.name, "t");

		cursor.advance(FeatureEvent::FeatureStart, &schema);
		assert_eq!(cursor.feature_count, 1);

		cursor.advance(FeatureEvent::property("name", &[], "x"), &schema);
		assert_eq!(cursor.kind, Some(EventKind::Property));
		assert_eq!(cursor.path, PropertyPath::from("name"));
		assert_eq!(cursor.property.as_ref().unwrap().name, "name");
		assert_eq!(cursor.value.as_deref(), Some("x"));

		cursor.advance(FeatureEvent::property("other", &[2], "y"), &schema);
		assert!(cursor.property.is_none());
		assert_eq!(cursor.multiplicity, [2]);

		cursor.advance(FeatureEvent::FeatureEnd, &schema);
		assert!(cursor.path.is_empty());
		assert!(cursor.value.is_none());
	}

	#[test]
	fn identity_needs_no_transformer() -> Result<()> {
		let request = RequestContext::new(FeatureSchema::default());
		assert!(request.crs_transformer()?.is_none());
		Ok(())
	}
}
