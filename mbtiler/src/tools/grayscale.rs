use anyhow::Result;
use mbtiler_container::grayscale_tree;
use mbtiler_core::progress::LogProgress;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// directory searched recursively for PNG and JPEG files
	#[arg()]
	input_dir: PathBuf,

	/// directory receiving the converted files under the same relative paths
	#[arg()]
	output_dir: PathBuf,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let report = grayscale_tree(&arguments.input_dir, &arguments.output_dir, &mut LogProgress::default())?;
	if report.failed > 0 {
		log::warn!("{} files could not be converted", report.failed);
	}
	println!("Converted {} images to '{}'", report.converted, arguments.output_dir.display());
	Ok(())
}
