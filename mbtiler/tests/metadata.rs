
use predicates::str;
use test_utilities::*;

#[test]
fn list_prints_every_pair() {
	let (_dir, input) = fixture(&[0]);
	mbtiler_cmd()
		.args(["metadata", "list", path_str(&input)])
		.assert()
		.success()
		.stdout(str::diff("format=png\nname=test\n"));
}

#[test]
fn get_and_set() {
	let (_dir, input) = fixture(&[0]);
	mbtiler_cmd()
		.args(["metadata", "set", path_str(&input), "attribution", "me"])
		.assert()
		.success();
	mbtiler_cmd()
		.args(["metadata", "get", path_str(&input), "attribution"])
		.assert()
		.success()
		.stdout(str::diff("me\n"));
}

#[test]
fn get_unknown_key_fails() {
	let (_dir, input) = fixture(&[0]);
	mbtiler_cmd()
		.args(["metadata", "get", path_str(&input), "nope"])
		.assert()
		.failure()
		.stderr(str::contains("Metadata key 'nope' not found"));
}

#[test]
fn no_overwrite_keeps_the_value() {
	let (_dir, input) = fixture(&[0]);
	mbtiler_cmd()
		.args(["metadata", "set", "--no-overwrite", path_str(&input), "name", "other"])
		.assert()
		.failure()
		.stderr(str::contains("metadata key 'name' already exists"));
	assert_eq!(open(&input).metadata_value("name").unwrap().as_deref(), Some("test"));

	mbtiler_cmd()
		.args(["metadata", "set", path_str(&input), "name", "other"])
		.assert()
		.success();
	assert_eq!(open(&input).metadata_value("name").unwrap().as_deref(), Some("other"));
}
