
use mbtiler_core::TileCoord;
use pretty_assertions::assert_eq;
use predicates::str;
use std::fs;
use test_utilities::*;

fn tms(level: u8, x: u32, row: u32) -> TileCoord {
	TileCoord::from_tms(level, x, row).unwrap()
}

#[test]
fn probe_prints_a_summary() {
	let (_dir, input) = fixture(&[1, 2]);
	mbtiler_cmd()
		.args(["probe", path_str(&input)])
		.assert()
		.success()
		.stdout(str::contains("tiles:  20"))
		.stdout(str::contains("zoom:   1..=2"))
		.stdout(str::contains("format: png"))
		.stdout(str::contains("level  2:       16 tiles, x 0..=3, tms rows 0..=3"));
}

#[test]
fn missing_report_in_xyz() {
	let (dir, input) = sparse_fixture(&[tms(2, 1, 1), tms(2, 1, 2), tms(2, 2, 1)]);
	let report = dir.path().join("missing.txt");

	mbtiler_cmd()
		.args(["missing", path_str(&input), path_str(&report), "--xyz"])
		.assert()
		.success()
		.stdout(str::contains("Wrote 1 missing tiles"));
	assert_eq!(fs::read_to_string(&report).unwrap(), "/2/2/1\n");

	mbtiler_cmd()
		.args(["missing", path_str(&input), path_str(&report), "-u"])
		.assert()
		.success();
	assert_eq!(
		fs::read_to_string(&report).unwrap(),
		"/3/4/4\n/3/4/5\n/3/5/4\n/3/5/5\n"
	);
}

#[test]
fn healthy_archives_stay() {
	let (_dir, input) = fixture(&[2]);
	mbtiler_cmd()
		.args(["health", path_str(&input), "--delete"])
		.assert()
		.success()
		.stdout(str::contains("is healthy"));
	assert!(input.exists());
}

#[test]
fn unhealthy_archives_are_deleted_on_request() {
	let (_dir, input) = sparse_fixture(&[tms(3, 0, 0), tms(3, 7, 7)]);
	mbtiler_cmd()
		.args(["health", path_str(&input)])
		.assert()
		.success()
		.stdout(str::contains("ratio 0.031"))
		.stdout(str::contains("is unhealthy"));
	assert!(input.exists());

	mbtiler_cmd()
		.args(["health", path_str(&input), "--delete"])
		.assert()
		.success()
		.stdout(str::contains("Deleted"));
	assert!(!input.exists());
}

#[test]
fn threshold_is_configurable() {
	let (_dir, input) = sparse_fixture(&[tms(3, 0, 0), tms(3, 7, 7)]);
	mbtiler_cmd()
		.args(["health", path_str(&input), "--delete", "--threshold", "0.01"])
		.assert()
		.success()
		.stdout(str::contains("is healthy"));
	assert!(input.exists());
}
