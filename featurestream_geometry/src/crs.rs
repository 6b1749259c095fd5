//! Coordinate reference systems and the contract of the reprojection service.
//!
//! The pipeline never does projection math itself beyond the spherical Mercator pair below.
//! Anything else comes from a caller-supplied [`CrsTransformerFactory`].

use super::Coordinates;
use anyhow::{Result, anyhow};
use featurestream_core::TransformError;
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::{
	fmt::{Debug, Display},
	str::FromStr,
	sync::Arc,
};

const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;
const RADIUS: f64 = 6_378_137.0; // meters

/// A coordinate reference system, identified by its EPSG code.
///
/// `CRS84` is kept apart from `EPSG:4326` because it is what clients expect as the default,
/// both use longitude/latitude axis order inside the pipeline.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(try_from = "String")]
pub enum Crs {
	Crs84,
	Epsg(u32),
}

impl Crs {
	pub const WEB_MERCATOR: Crs = Crs::Epsg(3857);
	pub const WGS84: Crs = Crs::Epsg(4326);

	#[must_use]
	pub fn is_wgs84(&self) -> bool {
		matches!(self, Crs::Crs84 | Crs::Epsg(4326))
	}

	/// OGC URI of the reference system.
	#[must_use]
	pub fn uri(&self) -> String {
		match self {
			Crs::Crs84 => String::from("http://www.opengis.net/def/crs/OGC/1.3/CRS84"),
			Crs::Epsg(code) => format!("https://www.opengis.net/def/crs/EPSG/0/{code}"),
		}
	}
}

impl Display for Crs {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Crs::Crs84 => f.write_str("CRS84"),
			Crs::Epsg(code) => write!(f, "EPSG:{code}"),
		}
	}
}

impl FromStr for Crs {
	type Err = anyhow::Error;

	fn from_str(value: &str) -> Result<Self> {
		lazy_static! {
			static ref REG_CRS84: Regex = RegexBuilder::new(r"^(?:https?://www\.opengis\.net/def/crs/OGC/1\.3/)?CRS84$")
				.case_insensitive(true)
				.build()
				.unwrap();
			static ref REG_EPSG: Regex =
				RegexBuilder::new(r"^(?:EPSG:|urn:ogc:def:crs:EPSG::|https?://www\.opengis\.net/def/crs/EPSG/0/)(\d+)$")
					.case_insensitive(true)
					.build()
					.unwrap();
		}

		let value = value.trim();
		if REG_CRS84.is_match(value) {
			return Ok(Crs::Crs84);
		}
		let code = REG_EPSG
			.captures(value)
			.and_then(|c| c.get(1))
			.ok_or_else(|| anyhow!("unknown coordinate reference system '{value}'"))?;
		Ok(Crs::Epsg(code.as_str().parse()?))
	}
}

impl TryFrom<String> for Crs {
	type Error = anyhow::Error;

	fn try_from(value: String) -> Result<Self> {
		Crs::from_str(&value)
	}
}

/// Reprojects single points from one reference system into another.
pub trait CrsTransformer: Debug + Send + Sync {
	fn source(&self) -> Crs;
	fn target(&self) -> Crs;
	fn transform(&self, coordinates: &Coordinates) -> Result<Coordinates, TransformError>;
}

/// Hands out transformers for pairs of reference systems.
pub trait CrsTransformerFactory: Debug + Send + Sync {
	/// Returns `None` if no reprojection is necessary.
	fn get(&self, source: &Crs, target: &Crs) -> Result<Option<Arc<dyn CrsTransformer>>, TransformError>;
}

/// Knows the identity and the WGS84 <-> Web Mercator pair.
#[derive(Debug, Default)]
pub struct DefaultCrsTransformerFactory;

impl CrsTransformerFactory for DefaultCrsTransformerFactory {
	fn get(&self, source: &Crs, target: &Crs) -> Result<Option<Arc<dyn CrsTransformer>>, TransformError> {
		if source == target || (source.is_wgs84() && target.is_wgs84()) {
			return Ok(None);
		}
		if source.is_wgs84() && *target == Crs::WEB_MERCATOR {
			return Ok(Some(Arc::new(MercatorTransformer {
				source: *source,
				inverse: false,
			})));
		}
		if *source == Crs::WEB_MERCATOR && target.is_wgs84() {
			return Ok(Some(Arc::new(MercatorTransformer {
				source: *target,
				inverse: true,
			})));
		}
		Err(TransformError::new(
			&source.to_string(),
			&target.to_string(),
			"no transformation available",
		))
	}
}

/// Spherical Mercator (EPSG:3857) in both directions.
#[derive(Debug)]
struct MercatorTransformer {
	source: Crs,
	inverse: bool,
}

impl MercatorTransformer {
	fn error(&self, reason: String) -> TransformError {
		TransformError::new(&self.source().to_string(), &self.target().to_string(), reason)
	}
}

impl CrsTransformer for MercatorTransformer {
	fn source(&self) -> Crs {
		if self.inverse { Crs::WEB_MERCATOR } else { self.source }
	}

	fn target(&self) -> Crs {
		if self.inverse { self.source } else { Crs::WEB_MERCATOR }
	}

	fn transform(&self, coordinates: &Coordinates) -> Result<Coordinates, TransformError> {
		let (x, y) = (coordinates.x(), coordinates.y());
		if !x.is_finite() || !y.is_finite() {
			return Err(self.error(format!("non-finite coordinates {coordinates:?}")));
		}

		if self.inverse {
			let lon = (x / RADIUS).to_degrees();
			let lat = (2.0 * (y / RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
			return Ok(coordinates.with_xy(lon, lat));
		}

		if !(-180.0..=180.0).contains(&x) || y.abs() > MAX_MERCATOR_LAT {
			return Err(self.error(format!("{coordinates:?} is outside of the Web Mercator domain")));
		}
		let phi = y.to_radians();
		Ok(coordinates.with_xy(
			RADIUS * x.to_radians(),
			RADIUS * (std::f64::consts::FRAC_PI_4 + phi / 2.0).tan().ln(),
		))
	}
}
