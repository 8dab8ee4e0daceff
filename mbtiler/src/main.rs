mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
	author,
	version,
	about,
	long_about = None,
	propagate_version = true,
	disable_help_subcommand = true,
	arg_required_else_help = true,
)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[command(flatten)]
	verbose: Verbosity<WarnLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Extract every tile of an MBTiles archive into a directory tree
	Extract(tools::extract::Subcommand),

	/// Copy an MBTiles archive while adding, removing or re-encoding zoom levels
	Convert(tools::convert::Subcommand),

	/// List, read and write MBTiles metadata
	#[command(subcommand)]
	Metadata(tools::metadata::Subcommand),

	/// Show tile count, zoom range and per level extent of an MBTiles archive
	Probe(tools::probe::Subcommand),

	/// Build an MBTiles archive from a {z}/{x}/{y} directory tree
	Import(tools::import::Subcommand),

	/// Convert every PNG and JPEG file of a directory tree to grayscale
	Grayscale(tools::grayscale::Subcommand),

	/// List the tiles missing inside each zoom level's extent
	Missing(tools::missing::Subcommand),

	/// Check how densely the highest zoom level is filled
	Health(tools::health::Subcommand),
}

fn main() -> ExitCode {
	let cli = Cli::parse();

	env_logger::Builder::new()
		.filter_level(cli.verbose.log_level_filter())
		.format_timestamp(None)
		.init();

	match run(&cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("Error: {err:#}");
			ExitCode::FAILURE
		}
	}
}

fn run(cli: &Cli) -> Result<()> {
	match &cli.command {
		Commands::Extract(arguments) => tools::extract::run(arguments),
		Commands::Convert(arguments) => tools::convert::run(arguments),
		Commands::Metadata(arguments) => tools::metadata::run(arguments),
		Commands::Probe(arguments) => tools::probe::run(arguments),
		Commands::Import(arguments) => tools::import::run(arguments),
		Commands::Grayscale(arguments) => tools::grayscale::run(arguments),
		Commands::Missing(arguments) => tools::missing::run(arguments),
		Commands::Health(arguments) => tools::health::run(arguments),
	}
}
