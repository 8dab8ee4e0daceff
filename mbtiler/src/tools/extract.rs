use anyhow::Result;
use mbtiler_container::{TileStore, extract_tiles};
use mbtiler_core::{PathPattern, progress::LogProgress};
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// MBTiles archive to read
	#[arg()]
	input_file: PathBuf,

	/// directory the tiles are written to
	#[arg(long = "output-dir", short, default_value = ".")]
	output: PathBuf,

	/// file name pattern, e.g. {z}/{x}/{y}.{ext}; {a} {o} insert latitude and longitude, {ZZ} zero pads
	#[arg(long, short, default_value = mbtiler_core::pattern::DEFAULT_PATTERN, value_parser = PathPattern::parse)]
	pattern: PathPattern,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let store = TileStore::open(&arguments.input_file)?;
	let count = extract_tiles(&store, &arguments.output, &arguments.pattern, &mut LogProgress::default())?;
	println!("Extracted {count} tiles to '{}'", arguments.output.display());
	Ok(())
}
