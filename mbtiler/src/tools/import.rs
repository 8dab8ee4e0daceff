use anyhow::Result;
use mbtiler_container::{DirectoryTreeSource, ImportOptions, import_tree};
use mbtiler_core::progress::LogProgress;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// directory tree laid out as {z}/{x}/{y}.{ext}
	#[arg()]
	input_dir: PathBuf,

	/// archive to write, defaults to a name built from description, center and zoom levels
	#[arg(long, short)]
	output: Option<PathBuf>,

	/// import only this zoom level
	#[arg(long = "zoom", short = 'z', value_name = "LEVEL")]
	level: Option<u8>,

	/// stored as metadata and used as file name prefix
	#[arg(long, short, default_value = "")]
	description: String,

	/// add tiles to an existing archive, replacing tiles at the same address
	#[arg(long, short)]
	augment: bool,

	/// the tree uses TMS rows instead of XYZ rows
	#[arg(long)]
	tms: bool,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let source = DirectoryTreeSource::open(&arguments.input_dir)?.with_tms_rows(arguments.tms);
	let options = ImportOptions {
		level: arguments.level,
		description: arguments.description.clone(),
		augment: arguments.augment,
	};
	let report = import_tree(
		&source,
		arguments.output.as_deref(),
		&options,
		&mut LogProgress::default(),
	)?;
	println!(
		"Imported {} tiles (zoom {}..={}) to '{}'",
		report.tiles,
		report.min_zoom,
		report.max_zoom,
		report.path.display()
	);
	Ok(())
}
