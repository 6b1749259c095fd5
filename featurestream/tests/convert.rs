use assert_cmd::{Command, cargo};
use predicates::{prelude::*, str};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::path::PathBuf;
use tempfile::{TempDir, tempdir};

fn testdata(filename: &str) -> String {
	PathBuf::from(env!("CARGO_MANIFEST_DIR"))
		.join("../testdata")
		.join(filename)
		.to_string_lossy()
		.to_string()
}

fn temp_output(filename: &str) -> (TempDir, PathBuf) {
	let dir = tempdir().expect("failed to create temp dir");
	let path = dir.path().join(filename);
	(dir, path)
}

/// Runs `convert` on the test events, writing to stdout.
fn convert(extra_args: &[&str]) -> Value {
	let config = testdata("config.yml");
	let events = testdata("events.jsonl");
	let mut args = vec!["convert", "--config", config.as_str()];
	args.extend_from_slice(extra_args);
	args.extend_from_slice(&[events.as_str(), "-"]);

	let output = Command::new(cargo::cargo_bin!()).args(args).output().unwrap();
	assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
	serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn geojson_with_rules() {
	let output = convert(&[]);
	assert_eq!(output["type"], json!("FeatureCollection"));
	assert_eq!(output["numberMatched"], json!(2));
	assert_eq!(output["links"][0]["rel"], json!("self"));

	let first = &output["features"][0];
	assert_eq!(first["id"], json!("DEBY_1"));
	assert_eq!(first["geometry"]["type"], json!("MultiPolygon"));
	assert_eq!(
		first["properties"],
		json!({
			"label": "Town Hall",
			"function": "commercial",
			"built": "01.05.1904",
			"storeys": 3,
			"address": [{"street": "Marktplatz 1", "city": "Musterstadt"}]
		})
	);

	let second = &output["features"][1];
	assert_eq!(second["properties"]["function"], json!("residential"));
	assert_eq!(
		second["properties"]["consistsOfBuildingPart"],
		json!([{"id": "DEBY_2_P1", "storeys": 1}])
	);
	// the first geometry of a feature is its GeoJSON geometry, wherever it is nested
	assert_eq!(second["geometry"]["type"], json!("MultiPolygon"));
}

#[test]
fn overview_without_geometry() {
	let output = convert(&["--overview", "--skip-geometry", "--properties", "label,storeys"]);
	let features = output["features"].as_array().unwrap();
	assert_eq!(features.len(), 2);
	assert_eq!(features[0]["geometry"], Value::Null);
	assert_eq!(features[0]["properties"], json!({"label": "Town Hall", "storeys": 3}));
	assert_eq!(features[1]["properties"], json!({"storeys": 2}));
}

#[test]
fn cityjson_document() {
	let output = convert(&["--format", "cityjson"]);
	assert_eq!(output["type"], json!("CityJSON"));
	assert_eq!(output["version"], json!("1.1"));
	assert_eq!(output["transform"]["scale"], json!([0.001, 0.001, 0.001]));

	let objects = output["CityObjects"].as_object().unwrap();
	assert_eq!(objects.len(), 3);
	assert_eq!(objects["DEBY_1"]["type"], json!("Building"));
	assert_eq!(objects["DEBY_1"]["address"], json!([{"street": "Marktplatz 1", "city": "Musterstadt"}]));
	assert_eq!(objects["DEBY_2"]["children"], json!(["DEBY_2_P1"]));
	assert_eq!(objects["DEBY_2_P1"]["type"], json!("BuildingPart"));
	assert_eq!(objects["DEBY_2_P1"]["parents"], json!(["DEBY_2"]));
	assert_eq!(objects["DEBY_2_P1"]["attributes"], json!({"storeys": 1}));
	assert_eq!(objects["DEBY_2_P1"]["geometry"][0]["type"], json!("Solid"));

	// rings drop their closing position
	assert_eq!(output["vertices"].as_array().unwrap().len(), 6);
}

#[test]
fn cityjson_sequence_to_file() {
	let (temp_dir, path) = temp_output("buildings.city.jsonl");
	Command::new(cargo::cargo_bin!())
		.args([
			"convert",
			"--config",
			&testdata("config.yml"),
			"--format",
			"cityjson-seq",
			&testdata("events.jsonl"),
			path.to_str().unwrap(),
		])
		.assert()
		.success()
		.stdout(str::is_empty());

	let text = std::fs::read_to_string(&path).unwrap();
	let lines: Vec<Value> = text.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
	assert_eq!(lines.len(), 3);
	assert_eq!(lines[0]["type"], json!("CityJSON"));
	assert_eq!(lines[1]["type"], json!("CityJSONFeature"));
	assert_eq!(lines[1]["id"], json!("DEBY_1"));
	assert_eq!(lines[2]["id"], json!("DEBY_2"));

	drop(temp_dir);
}

#[test]
fn events_from_stdin() {
	Command::new(cargo::cargo_bin!())
		.args(["convert", "--config", &testdata("config.yml"), "-", "-"])
		.write_stdin("{\"event\":\"start\"}\n{\"event\":\"end\"}\n")
		.assert()
		.success()
		.stdout(str::contains("\"features\":[]"));
}

#[test]
fn unknown_format() {
	Command::new(cargo::cargo_bin!())
		.args([
			"convert",
			"--config",
			&testdata("config.yml"),
			"--format",
			"gml",
			&testdata("events.jsonl"),
			"-",
		])
		.assert()
		.failure()
		.stderr(str::contains("output format 'gml' unknown"));
}

#[test]
fn unsupported_reprojection() {
	Command::new(cargo::cargo_bin!())
		.args([
			"convert",
			"--config",
			&testdata("config.yml"),
			"--crs",
			"EPSG:25832",
			&testdata("events.jsonl"),
			"-",
		])
		.assert()
		.failure()
		.stdout(str::is_empty());
}

#[test]
fn schema_command() {
	Command::new(cargo::cargo_bin!())
		.args(["schema", "--config", &testdata("config.yml"), "--overview"])
		.assert()
		.success()
		.stdout(str::contains("  label: String (from name)"))
		.stdout(str::contains("consistsOfBuildingPart").not())
		.stdout(str::contains("internalCode").not());
}
