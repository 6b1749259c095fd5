use featurestream_geometry::Crs;
use featurestream_pipeline::event::{Link, Representation, RequestContext};
use serde::Deserialize;

#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct OutputConfig {
	/// Format used when none is requested.
	#[serde(default)]
	pub format: Option<String>,

	/// CRS of the coordinates delivered by the backend, CRS84 if not set.
	#[serde(default)]
	pub source_crs: Option<Crs>,

	/// CRS of the output, the source CRS if not set.
	#[serde(default)]
	pub crs: Option<Crs>,

	/// Decimal places of written ordinates.
	#[serde(default)]
	pub precision: Option<u8>,

	/// Douglas-Peucker tolerance for 2D parts.
	#[serde(default)]
	pub simplify_tolerance: Option<f64>,

	#[serde(default)]
	pub pretty: bool,

	#[serde(default)]
	pub representation: Representation,

	/// Base URL of the service, used for links.
	#[serde(default)]
	pub service_url: Option<String>,

	#[serde(default)]
	pub links: Vec<Link>,

	/// Link relations never written.
	#[serde(default)]
	pub excluded_link_rels: Vec<String>,
}

impl OutputConfig {
	pub fn apply(&self, request: &mut RequestContext) {
		if let Some(crs) = self.source_crs {
			request.source_crs = crs;
		}
		request.target_crs = self.crs.unwrap_or(request.source_crs);
		request.precision = self.precision;
		request.simplify_tolerance = self.simplify_tolerance;
		request.pretty = self.pretty;
		request.representation = self.representation;
		if let Some(url) = &self.service_url {
			request.service_url = url.trim_end_matches('/').to_string();
		}
		request.links = self.links.clone();
		request.excluded_link_rels = self.excluded_link_rels.clone();
	}
}
