use anyhow::Result;
use featurestream::{
	config::Config,
	pipeline::{
		event::Representation,
		rules::SchemaTransformer,
		schema::{FeatureSchema, PropertySchema},
	},
};
use std::{fmt::Write, path::PathBuf, sync::Arc};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// configuration with the feature schema and its rules
	#[arg(long, short, value_name = "YAML")]
	config: PathBuf,

	/// apply the rules of the overview representation
	#[arg(long)]
	overview: bool,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let config = Config::from_path(&arguments.config)?;
	let representation = if arguments.overview {
		Representation::Overview
	} else {
		Representation::Full
	};
	let transformed = SchemaTransformer::new(&config.transformations, representation).apply(&config.schema);
	print!("{}", describe(&transformed.schema));
	Ok(())
}

/// One line per property in output order, nested properties indented.
fn describe(schema: &FeatureSchema) -> String {
	fn visit(properties: &[Arc<PropertySchema>], depth: usize, text: &mut String) {
		for property in properties {
			let mut line = format!("{}{}: {:?}", "  ".repeat(depth), property.name, property.property_type);
			if let Some(geometry_type) = property.geometry_type {
				let _ = write!(line, " {geometry_type}");
			}
			if let Some(source) = &property.source
				&& source.last() != Some(property.name.as_str())
			{
				let _ = write!(line, " (from {source})");
			}
			text.push_str(&line);
			text.push('\n');
			visit(&property.properties, depth + 1, text);
		}
	}

	let mut text = format!("{}\n", schema.name);
	visit(&schema.properties, 1, &mut text);
	text
}
