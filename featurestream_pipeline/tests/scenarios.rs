use anyhow::Result;
use featurestream_core::{is_event_order_error, is_transform_error};
use featurestream_geometry::Crs;
use featurestream_pipeline::{
	EncoderRegistry, FeatureStream,
	event::{JsonLinesEventSource, RequestContext, Representation},
	rules::RuleTable,
	schema::FeatureSchema,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::{io::Cursor, sync::Arc};

const SCHEMA: &str = "
name: building
properties:
  - name: id
    type: STRING
    role: ID
  - name: name
    type: STRING
  - name: internalCode
    type: STRING
  - name: built
    type: DATE
  - name: storeys
    type: INTEGER
  - name: position
    type: GEOMETRY
    geometryType: POINT
    dimension: 3
";

const RULES: &str = "
name:
  - rename: label
internalCode:
  - remove: ALWAYS
built:
  - dateFormat: '[day].[month].[year]'
";

const EVENTS: &str = r#"
# one building
{"event":"start","numberMatched":1}
{"event":"feature-start"}
{"event":"property","path":"id","value":"b1"}
{"event":"property","path":"name","value":"Town Hall"}
{"event":"property","path":"internalCode","value":"X-17"}
{"event":"property","path":"built","value":"2021-03-04"}
{"event":"property","path":"storeys","value":"abc"}
{"event":"coordinates","path":"position","text":"1.0 2.0 "}
{"event":"coordinates","path":"position","text":"3.0"}
{"event":"geometry-end"}
{"event":"feature-end"}
{"event":"end"}
"#;

fn request() -> Result<RequestContext> {
	let schema: FeatureSchema = serde_yaml_ng::from_str(SCHEMA)?;
	let rules: RuleTable = serde_yaml_ng::from_str(RULES)?;
	let mut request = RequestContext::new(schema);
	request.rules = Arc::new(rules);
	Ok(request)
}

fn convert(request: RequestContext, format: &str, events: &str) -> Result<String> {
	let request = Arc::new(request);
	let writers = EncoderRegistry::new_default().writers_for(format, &request)?;
	let mut output: Vec<u8> = Vec::new();
	let mut stream = FeatureStream::new(request, writers, &mut output);
	stream.run(&mut JsonLinesEventSource::new(Cursor::new(events)))?;
	drop(stream);
	Ok(String::from_utf8(output)?)
}

#[test]
fn geojson_applies_rules_in_place() -> Result<()> {
	let text = convert(request()?, "geojson", EVENTS)?;

	// the renamed property keeps the position of its source
	let label = text.find("\"label\"").unwrap();
	let built = text.find("\"built\"").unwrap();
	assert!(label < built, "{text}");
	assert!(!text.contains("internalCode"));

	let output: Value = serde_json::from_str(&text)?;
	assert_eq!(
		output,
		json!({
			"type": "FeatureCollection",
			"numberMatched": 1,
			"features": [{
				"type": "Feature",
				"geometry": {"type": "Point", "coordinates": [1, 2, 3]},
				"id": "b1",
				"properties": {"label": "Town Hall", "built": "04.03.2021", "storeys": "abc"}
			}],
			"numberReturned": 1
		})
	);
	Ok(())
}

#[test]
fn cityjson_single_vertex() -> Result<()> {
	let output: Value = serde_json::from_str(&convert(request()?, "cityjson", EVENTS)?)?;
	assert_eq!(output["vertices"], json!([[0, 0, 0]]));
	assert_eq!(output["transform"]["translate"], json!([1, 2, 3]));
	assert_eq!(
		output["CityObjects"]["b1"],
		json!({
			"type": "Building",
			"attributes": {"label": "Town Hall", "built": "04.03.2021", "storeys": "abc"},
			"geometry": [{"type": "MultiPoint", "lod": "1", "boundaries": [0]}]
		})
	);
	Ok(())
}

#[test]
fn overview_and_property_selection() -> Result<()> {
	let mut request = request()?;
	request.representation = Representation::Overview;
	request.properties = Some(vec![String::from("label")]);
	request.skip_geometry = true;

	let output: Value = serde_json::from_str(&convert(request, "geojson", EVENTS)?)?;
	assert_eq!(
		output["features"][0],
		json!({"type": "Feature", "geometry": null, "id": "b1", "properties": {"label": "Town Hall"}})
	);
	Ok(())
}

#[test]
fn unsupported_reprojection_is_a_transform_error() -> Result<()> {
	let mut request = request()?;
	request.target_crs = Crs::Epsg(25832);
	let error = convert(request, "cityjson", EVENTS).unwrap_err();
	assert!(is_transform_error(&error), "{error:?}");
	Ok(())
}

#[test]
fn truncated_stream_is_an_event_order_error() -> Result<()> {
	let events = EVENTS.replace("{\"event\":\"end\"}", "");
	let error = convert(request()?, "geojson", &events).unwrap_err();
	assert!(is_event_order_error(&error), "{error:?}");
	Ok(())
}
