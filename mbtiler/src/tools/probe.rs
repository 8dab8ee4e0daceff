use anyhow::Result;
use mbtiler_container::TileStore;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// MBTiles archive to inspect
	#[arg()]
	input_file: PathBuf,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let store = TileStore::open(&arguments.input_file)?;
	let summary = store.summary()?;

	println!("file:   {}", summary.file_path.display());
	println!("tiles:  {}", summary.tile_count);
	match (summary.min_zoom, summary.max_zoom) {
		(Some(min), Some(max)) => println!("zoom:   {min}..={max}"),
		_ => println!("zoom:   none"),
	}
	println!("format: {}", store.format_hint().unwrap_or("unknown"));

	for range in store.level_ranges()? {
		println!(
			"level {:>2}: {:>8} tiles, x {}..={}, tms rows {}..={}",
			range.level, range.count, range.x_min, range.x_max, range.row_min, range.row_max
		);
	}
	Ok(())
}
