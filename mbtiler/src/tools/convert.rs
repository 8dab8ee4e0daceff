use anyhow::{Result, ensure};
use mbtiler_container::{
	ConvertOptions, ConvertTarget, DirectoryTreeSource, TileSource, TileStore, convert, extract_tiles,
};
use mbtiler_core::{PathPattern, TileFormat, ZoomLevelSpec, progress::LogProgress};
use mbtiler_derive::context;
use std::path::{Path, PathBuf};

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
	/// keep existing tiles, encode generated ones like the input
	#[default]
	Default,
	Png,
	#[value(alias = "jpeg")]
	Jpg,
}

impl OutputFormat {
	fn tile_format(self) -> Option<TileFormat> {
		match self {
			OutputFormat::Default => None,
			OutputFormat::Png => Some(TileFormat::Png),
			OutputFormat::Jpg => Some(TileFormat::Jpeg),
		}
	}
}

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// MBTiles archive or {z}/{x}/{y} directory tree to read
	#[arg()]
	input: PathBuf,

	/// output archive, defaults to <input>_converted.mbtiles next to the input
	#[arg(long, short, value_parser = parse_mbtiles_path)]
	output: Option<PathBuf>,

	/// levels to write: 0 = all existing, -N = lowest minus N, +N = highest plus N, N or =N = level N
	#[arg(long, short, num_args = 1.., value_delimiter = ',', allow_negative_numbers = true, default_value = "0")]
	zoom_levels: Vec<String>,

	/// convert tiles to grayscale
	#[arg(long)]
	grayscale: bool,

	/// encoding of the written tiles
	#[arg(long, value_enum, ignore_case = true, default_value_t)]
	format: OutputFormat,

	/// also extract the converted archive into this directory
	#[arg(long, value_name = "DIR")]
	extract: Option<PathBuf>,

	/// file name pattern of the extracted tiles
	#[arg(long, short, requires = "extract", default_value = mbtiler_core::pattern::DEFAULT_PATTERN, value_parser = PathPattern::parse)]
	pattern: PathPattern,
}

fn parse_mbtiles_path(value: &str) -> Result<PathBuf, String> {
	let path = PathBuf::from(value);
	match path.extension().and_then(|e| e.to_str()) {
		Some(ext) if ext.eq_ignore_ascii_case("mbtiles") => Ok(path),
		_ => Err(String::from("output must end with .mbtiles; use --extract for directories")),
	}
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let source: Box<dyn TileSource> = if arguments.input.is_dir() {
		Box::new(DirectoryTreeSource::open(&arguments.input)?)
	} else {
		Box::new(TileStore::open(&arguments.input)?)
	};

	let output = match &arguments.output {
		Some(path) => path.clone(),
		None => default_output(&arguments.input),
	};
	ensure_distinct(&arguments.input, &output)?;

	let options = ConvertOptions {
		levels: ZoomLevelSpec::parse(&arguments.zoom_levels)?,
		grayscale: arguments.grayscale,
		format: arguments.format.tile_format(),
		..ConvertOptions::default()
	};
	let report = convert(
		source.as_ref(),
		&ConvertTarget::MBTiles(output.clone()),
		&options,
		&mut LogProgress::default(),
	)?;
	log::info!(
		"copied {} tiles, generated {}, skipped {} incomplete blocks",
		report.copied,
		report.generated,
		report.skipped_blocks
	);
	println!("Converted MBTiles written to '{}'", output.display());

	if let Some(dir) = &arguments.extract {
		let store = TileStore::open(&output)?;
		let count = extract_tiles(&store, dir, &arguments.pattern, &mut LogProgress::default())?;
		println!("Extracted {count} tiles to '{}'", dir.display());
	}
	Ok(())
}

/// `<stem>_converted.mbtiles` next to `input`, or `<stem>_converted_<n>.mbtiles` for the first free `n`.
fn default_output(input: &Path) -> PathBuf {
	let dir = input.parent().unwrap_or(Path::new(""));
	let stem = input
		.file_stem()
		.and_then(|s| s.to_str())
		.filter(|s| !s.is_empty())
		.unwrap_or("converted");
	let mut candidate = dir.join(format!("{stem}_converted.mbtiles"));
	let mut suffix = 1;
	while candidate.exists() {
		candidate = dir.join(format!("{stem}_converted_{suffix}.mbtiles"));
		suffix += 1;
	}
	candidate
}

#[context("checking output '{}'", output.display())]
fn ensure_distinct(input: &Path, output: &Path) -> Result<()> {
	let same = match (input.canonicalize(), output.canonicalize()) {
		(Ok(a), Ok(b)) => a == b,
		_ => input == output,
	};
	ensure!(!same, "output must differ from the input");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_fs::TempDir;
	use std::fs;

	#[test]
	fn default_output_counts_up() {
		let dir = TempDir::new().unwrap();
		let input = dir.path().join("world.mbtiles");
		assert_eq!(default_output(&input), dir.path().join("world_converted.mbtiles"));

		fs::write(dir.path().join("world_converted.mbtiles"), "").unwrap();
		fs::write(dir.path().join("world_converted_1.mbtiles"), "").unwrap();
		assert_eq!(default_output(&input), dir.path().join("world_converted_2.mbtiles"));
	}

	#[test]
	fn output_must_be_an_archive() {
		assert!(parse_mbtiles_path("a/b.MBTiles").is_ok());
		assert!(parse_mbtiles_path("a/b").is_err());
		assert!(parse_mbtiles_path("b.sqlite").is_err());
	}

	#[test]
	fn output_must_not_be_the_input() {
		let dir = TempDir::new().unwrap();
		let input = dir.path().join("a.mbtiles");
		fs::write(&input, "").unwrap();
		assert!(ensure_distinct(&input, &dir.path().join("./a.mbtiles")).is_err());
		assert!(ensure_distinct(&input, &dir.path().join("b.mbtiles")).is_ok());
	}
}
