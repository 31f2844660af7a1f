//! `cache_results` as driven by the command line options.

use std::fs;

use tempfile::TempDir;

use stepcache_lib::cache::{CacheError, CacheOptions, cache_results};
use stepcache_lib::observe::{CacheEvent, RecordingObserver};

struct Dirs {
  temp: TempDir,
}

impl Dirs {
  fn new() -> Self {
    let temp = TempDir::new().unwrap();
    for sub in ["data", "results", "cache"] {
      fs::create_dir_all(temp.path().join(sub)).unwrap();
    }
    Self { temp }
  }

  fn options(&self) -> CacheOptions {
    CacheOptions::new(self.temp.path().join("results"), self.temp.path().join("cache"))
  }

  fn data_file(&self, name: &str) -> String {
    let path = self.temp.path().join("data").join(name);
    fs::write(&path, name).unwrap();
    path.to_string_lossy().into_owned()
  }

  fn results(&self, sub: &str, content: String) {
    let dir = self.temp.path().join("results").join(sub);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("results.json"), content).unwrap();
  }
}

#[test]
fn manifests_from_several_folders_are_combined() {
  let dirs = Dirs::new();
  let a = dirs.data_file("a.tif");
  let b = dirs.data_file("b.tif");
  dirs.results("one", format!(r#"{{"files": [{{"path": "{}"}}]}}"#, a));
  dirs.results("two", format!(r#"{{"file": [{{"path": "{}"}}]}}"#, b));
  dirs.results("three", "{}".to_string());

  let observer = RecordingObserver::new();
  let report = cache_results(&dirs.options(), &observer).unwrap();

  assert_eq!(report.manifests.len(), 3);
  assert_eq!(report.stats.files_copied, 2);
  assert_eq!(report.sets.len(), 1);
  assert_eq!(observer.count(|e| matches!(e, CacheEvent::ManifestEmpty { .. })), 1);
}

#[test]
fn dry_run_reports_plan_without_writing() {
  let dirs = Dirs::new();
  let a = dirs.data_file("a.tif");
  dirs.results(
    "",
    format!(r#"{{"containers": [{{"name": "c", "metadata": {{"k": 1}}, "files": [{{"path": "{}"}}]}}]}}"#, a),
  );

  let mut options = dirs.options();
  options.dry_run = true;
  let observer = RecordingObserver::new();
  let report = cache_results(&options, &observer).unwrap();

  assert!(report.dry_run);
  assert!(report.listing.is_none());
  assert_eq!(report.sets[0].files, vec![options.cache_dir.join("c").join("a.tif")]);
  assert_eq!(report.sets[0].metadata_path, Some(options.cache_dir.join("c.json")));
  assert_eq!(fs::read_dir(&options.cache_dir).unwrap().count(), 0);
}

#[test]
fn bad_paths_are_reported_together() {
  let dirs = Dirs::new();
  let options = CacheOptions::new(dirs.temp.path().join("nope"), dirs.temp.path().join("also-nope"));

  let err = cache_results(&options, &RecordingObserver::new()).unwrap_err();

  match err {
    CacheError::InvalidPaths(problems) => assert_eq!(problems.len(), 2),
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn empty_map_spec_is_a_configuration_error() {
  let dirs = Dirs::new();
  dirs.results("", "{}".to_string());
  let mut options = dirs.options();
  options.maps = Some("garbage".to_string());

  let err = cache_results(&options, &RecordingObserver::new()).unwrap_err();
  assert!(matches!(err, CacheError::PathMap(_)));
}
