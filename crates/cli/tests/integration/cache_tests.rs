use std::fs;

use predicates::prelude::*;

use super::common::{TestEnv, path_arg};

#[test]
fn cache_single_file() {
  let env = TestEnv::empty();
  let src = env.data_file("a.tif", "tiff bytes");
  env.results_file("", &format!(r#"{{"files": [{{"path": "{}"}}]}}"#, src));

  env
    .cmd()
    .arg("cache")
    .arg(env.results_path())
    .arg(env.cache_path())
    .assert()
    .success()
    .stdout(predicate::str::contains("Caching complete"))
    .stdout(predicate::str::contains("Files cached: 1"));

  let cached = env.cache_path().join("a.tif");
  assert_eq!(fs::read(&cached).unwrap(), b"tiff bytes");
  let expected = format!(
    "{{\n  \"FILE_LIST\": [\n  {{\n    \"PATH\": \"{p}\",\n    \"NAME\": \"{p}\",\n    \"BASE_IMAGE_NAME\": \"a\"\n  }}\n  ]\n}}",
    p = path_arg(&cached)
  );
  assert_eq!(env.listing(), expected);
}

#[test]
fn cache_container_with_metadata() {
  let env = TestEnv::empty();
  let a = env.data_file("odm/a.tif", "a");
  let b = env.data_file("odm/b.tif", "b");
  env.results_file(
    "step",
    &format!(
      r#"{{"containers": [{{"name": "odm", "metadata": {{"data": {{"k": 1}}}}, "files": [{{"path": "{}"}}, {{"path": "{}"}}]}}]}}"#,
      a, b
    ),
  );

  env
    .cmd()
    .arg("cache")
    .arg(env.results_path())
    .arg(env.cache_path())
    .assert()
    .success();

  assert!(env.cache_path().join("odm/a.tif").is_file());
  assert!(env.cache_path().join("odm/b.tif").is_file());
  assert_eq!(
    fs::read_to_string(env.cache_path().join("odm.json")).unwrap(),
    "{\n  \"k\": 1\n}"
  );
  let listing = env.listing();
  assert!(listing.contains("\"BASE_METADATA_NAME\": \"odm\""));
  assert_eq!(listing.matches("\"PATH\"").count(), 2);
}

#[test]
fn missing_source_fails_and_copies_nothing() {
  let env = TestEnv::empty();
  let present = env.data_file("a.tif", "a");
  let missing = env.data_path().join("missing.tif");
  env.results_file(
    "",
    &format!(
      r#"{{"files": [{{"path": "{}"}}, {{"path": "{}"}}]}}"#,
      present,
      path_arg(&missing)
    ),
  );

  env
    .cmd()
    .arg("cache")
    .arg(env.results_path())
    .arg(env.cache_path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("found 1 missing files out of 2"));

  assert!(env.cache_is_empty());
}

#[test]
fn maps_rewrite_source_paths() {
  let env = TestEnv::empty();
  env.data_file("x.tif", "mapped");
  env.results_file("", r#"{"files": [{"path": "/container/data/x.tif"}]}"#);

  env
    .cmd()
    .arg("cache")
    .arg(env.results_path())
    .arg(env.cache_path())
    .arg("--maps")
    .arg(format!("/container/data:{}", path_arg(&env.data_path())))
    .assert()
    .success();

  assert_eq!(fs::read(env.cache_path().join("x.tif")).unwrap(), b"mapped");
}

#[test]
fn maps_from_environment() {
  let env = TestEnv::empty();
  env.data_file("x.tif", "mapped");
  env.results_file("", r#"{"files": [{"path": "/container/data/x.tif"}]}"#);

  env
    .cmd()
    .env("STEPCACHE_MAPS", format!("/container/data:{}", path_arg(&env.data_path())))
    .arg("cache")
    .arg(env.results_path())
    .arg(env.cache_path())
    .assert()
    .success();

  assert!(env.cache_path().join("x.tif").is_file());
}

#[test]
fn invalid_maps_fail_before_reading() {
  let env = TestEnv::empty();
  env.results_file("", r#"{"files": []}"#);

  env
    .cmd()
    .arg("cache")
    .arg(env.results_path())
    .arg(env.cache_path())
    .arg("--maps")
    .arg("no-colon-here")
    .assert()
    .failure()
    .stderr(predicate::str::contains("none were valid"));

  assert!(env.cache_is_empty());
}

#[test]
fn missing_cache_folder_is_reported() {
  let env = TestEnv::empty();
  env.results_file("", "{}");

  env
    .cmd()
    .arg("cache")
    .arg(env.results_path())
    .arg(env.temp.path().join("nope"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("Cache folder is invalid"));
}

#[test]
fn merge_csv_combines_same_named_files() {
  let env = TestEnv::empty();
  let first = env.data_file("a/plots.csv", "id,v\n1,2\n");
  let second = env.data_file("b/plots.csv", "id,v\n3,4\n");
  env.results_file(
    "",
    &format!(r#"{{"files": [{{"path": "{}"}}, {{"path": "{}"}}]}}"#, first, second),
  );

  env
    .cmd()
    .arg("cache")
    .arg(env.results_path())
    .arg(env.cache_path())
    .args(["--merge-csv", "--csv-header-lines", "1"])
    .assert()
    .success();

  assert_eq!(
    fs::read_to_string(env.cache_path().join("plots.csv")).unwrap(),
    "id,v\n1,2\n3,4\n"
  );
}

#[test]
fn dry_run_writes_nothing() {
  let env = TestEnv::empty();
  let src = env.data_file("a.tif", "a");
  env.results_file("", &format!(r#"{{"files": [{{"path": "{}"}}]}}"#, src));

  env
    .cmd()
    .arg("cache")
    .arg(env.results_path())
    .arg(env.cache_path())
    .arg("--dry-run")
    .assert()
    .success()
    .stdout(predicate::str::contains("Dry run"))
    .stdout(predicate::str::contains("a.tif"));

  assert!(env.cache_is_empty());
}

#[test]
fn json_output_is_valid() {
  let env = TestEnv::empty();
  let src = env.data_file("a.tif", "a");
  env.results_file("", &format!(r#"{{"files": [{{"path": "{}"}}, {{}}]}}"#, src));

  let assert = env
    .cmd()
    .args(["-o", "json"])
    .arg("cache")
    .arg(env.results_path())
    .arg(env.cache_path())
    .assert()
    .success();

  let report: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
  assert_eq!(report["stats"]["files_copied"], 1);
  assert_eq!(report["stats"]["entries_skipped"], 1);
  assert_eq!(report["dry_run"], false);
}
