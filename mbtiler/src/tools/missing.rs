use anyhow::Result;
use mbtiler_container::{MissingReportOptions, TileStore, write_missing_report};
use mbtiler_core::MBTilesError;
use std::{fs::File, io::BufWriter, path::PathBuf};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// MBTiles archive to analyze
	#[arg()]
	input_file: PathBuf,

	/// text file receiving one /z/x/y line per missing tile
	#[arg()]
	report_file: PathBuf,

	/// write XYZ rows instead of TMS rows
	#[arg(long, short = 'i', visible_alias = "inverse")]
	xyz: bool,

	/// write the four tiles one zoom level deeper instead of the missing tile
	#[arg(long, short)]
	upper_zoom: bool,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let store = TileStore::open(&arguments.input_file)?;
	let file = File::create(&arguments.report_file).map_err(MBTilesError::io(&arguments.report_file))?;
	let options = MissingReportOptions {
		xyz: arguments.xyz,
		upper_zoom: arguments.upper_zoom,
	};
	let count = write_missing_report(&store, &mut BufWriter::new(file), &options)?;
	println!("Wrote {count} missing tiles to '{}'", arguments.report_file.display());
	Ok(())
}
