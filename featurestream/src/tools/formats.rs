use anyhow::Result;
use featurestream::config::Config;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
#[command(disable_version_flag = true)]
pub struct Subcommand {
	/// list the formats with the CityJSON options of this configuration
	#[arg(long, short, value_name = "YAML")]
	config: Option<PathBuf>,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let registry = match &arguments.config {
		Some(path) => Config::from_path(path)?.registry(),
		None => featurestream::pipeline::EncoderRegistry::new_default(),
	};
	println!("{}", registry.get_docs());
	Ok(())
}
