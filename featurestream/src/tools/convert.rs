use anyhow::{Context, Result};
use featurestream::{
	config::Config,
	geometry::Crs,
	pipeline::{
		FeatureStream,
		event::{EventSource, JsonLinesEventSource, Representation},
	},
};
use log::info;
use std::{
	fs::File,
	io::{BufWriter, Write},
	path::{Path, PathBuf},
	sync::Arc,
};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// feature events, one JSON object per line, or "-" for stdin
	#[arg()]
	events: String,

	/// output file, or "-" for stdout
	#[arg()]
	output: String,

	/// configuration with the feature schema, rules and output defaults
	#[arg(long, short, value_name = "YAML", display_order = 1)]
	config: PathBuf,

	/// output format: geojson, cityjson or cityjson-seq
	#[arg(long, short, display_order = 1)]
	format: Option<String>,

	/// target coordinate reference system, e.g. EPSG:3857
	#[arg(long, display_order = 2)]
	crs: Option<Crs>,

	/// write the reduced overview representation
	#[arg(long, display_order = 2)]
	overview: bool,

	/// only write these top-level properties
	#[arg(long, value_name = "a,b", value_delimiter = ',', display_order = 2)]
	properties: Option<Vec<String>>,

	/// do not write geometries
	#[arg(long, display_order = 2)]
	skip_geometry: bool,

	/// indent the output
	#[arg(long, display_order = 3)]
	pretty: bool,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let config = Config::from_path(&arguments.config)?;

	let mut request = config.request_context();
	if let Some(crs) = arguments.crs {
		request.target_crs = crs;
	}
	if arguments.overview {
		request.representation = Representation::Overview;
	}
	if arguments.properties.is_some() {
		request.properties = arguments.properties.clone();
	}
	request.skip_geometry |= arguments.skip_geometry;
	request.pretty |= arguments.pretty;
	let request = Arc::new(request);

	let format = arguments.format.as_deref().unwrap_or(config.default_format());
	let writers = config.registry().writers_for(format, &request)?;

	let mut source: Box<dyn EventSource> = if arguments.events == "-" {
		Box::new(JsonLinesEventSource::new(std::io::stdin().lock()))
	} else {
		Box::new(JsonLinesEventSource::from_path(Path::new(&arguments.events))?)
	};

	let mut output: Box<dyn Write> = if arguments.output == "-" {
		Box::new(std::io::stdout().lock())
	} else {
		let file = File::create(&arguments.output).with_context(|| format!("failed to create {:?}", arguments.output))?;
		Box::new(BufWriter::new(file))
	};

	info!("convert {:?} to {:?} as {format}", arguments.events, arguments.output);

	let mut stream = FeatureStream::new(request, writers, &mut output);
	stream.run(source.as_mut())?;
	drop(stream);
	output.flush()?;

	info!("finished converting features");
	Ok(())
}
