use anyhow::{Result, bail};
use mbtiler_container::TileStore;
use mbtiler_core::Metadata;
use std::path::PathBuf;

#[derive(clap::Subcommand, Debug)]
pub enum Subcommand {
	/// Print every key=value pair
	#[command(arg_required_else_help = true)]
	List {
		/// MBTiles archive
		input_file: PathBuf,
	},

	/// Print the value stored for a key
	#[command(arg_required_else_help = true)]
	Get {
		/// MBTiles archive
		input_file: PathBuf,
		key: String,
	},

	/// Store a value for a key
	#[command(arg_required_else_help = true)]
	Set {
		/// MBTiles archive
		input_file: PathBuf,
		key: String,
		value: String,

		/// fail if the key already exists
		#[arg(long)]
		no_overwrite: bool,
	},
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	match arguments {
		Subcommand::List { input_file } => {
			for (key, value) in TileStore::open(input_file)?.metadata()? {
				println!("{key}={value}");
			}
		}
		Subcommand::Get { input_file, key } => match TileStore::open(input_file)?.metadata_value(key)? {
			Some(value) => println!("{value}"),
			None => bail!("Metadata key '{key}' not found"),
		},
		Subcommand::Set {
			input_file,
			key,
			value,
			no_overwrite,
		} => {
			let entry = Metadata::from([(key.clone(), value.clone())]);
			TileStore::open(input_file)?.set_metadata(&entry, !no_overwrite)?;
		}
	}
	Ok(())
}
