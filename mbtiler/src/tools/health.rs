use anyhow::Result;
use mbtiler_container::{HEALTH_THRESHOLD, TileStore, check_health};
use mbtiler_core::MBTilesError;
use std::{fs, path::PathBuf};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// MBTiles archive to check
	#[arg()]
	input_file: PathBuf,

	/// delete the archive if it is unhealthy
	#[arg(long)]
	delete: bool,

	/// lowest share of present tiles in the highest level's extent that counts as healthy
	#[arg(long, default_value_t = HEALTH_THRESHOLD)]
	threshold: f64,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let path = &arguments.input_file;
	let store = TileStore::open(path)?;
	let healthy = match check_health(&store)? {
		Some(report) => {
			println!(
				"level {}: {} of {} tiles present, ratio {:.3}",
				report.level, report.tiles, report.expected, report.ratio
			);
			report.is_healthy(arguments.threshold)
		}
		None => {
			println!("no tiles");
			false
		}
	};
	drop(store);

	if healthy {
		println!("'{}' is healthy", path.display());
		return Ok(());
	}
	println!("'{}' is unhealthy", path.display());
	if arguments.delete {
		fs::remove_file(path).map_err(MBTilesError::io(path))?;
		println!("Deleted '{}'", path.display());
	}
	Ok(())
}
