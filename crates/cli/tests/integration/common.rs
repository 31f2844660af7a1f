//! Shared test helpers for CLI integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding source data, a results
/// folder and an empty cache folder.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn empty() -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    fs::create_dir_all(env.cache_path()).unwrap();
    env
  }

  fn dir(&self, name: &str) -> PathBuf {
    let p = self.temp.path().join(name);
    fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Where pipeline step output files live.
  pub fn data_path(&self) -> PathBuf {
    self.dir("data")
  }

  /// Folder the step's results.json files are written to.
  pub fn results_path(&self) -> PathBuf {
    self.dir("results")
  }

  pub fn cache_path(&self) -> PathBuf {
    self.dir("cache")
  }

  /// Writes a data file and returns its absolute path as a string.
  pub fn data_file(&self, name: &str, content: &str) -> String {
    let path = self.data_path().join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
  }

  /// Writes `results.json` into `sub` under the results folder.
  pub fn results_file(&self, sub: &str, content: &str) -> PathBuf {
    let dir = self.results_path().join(sub);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("results.json");
    fs::write(&path, content).unwrap();
    path
  }

  pub fn listing(&self) -> String {
    fs::read_to_string(self.cache_path().join("cached_files_makeflow_list.jx")).unwrap()
  }

  pub fn cache_is_empty(&self) -> bool {
    fs::read_dir(self.cache_path()).unwrap().next().is_none()
  }

  /// Get a Command for the stepcache binary with logging quiet by default.
  pub fn cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("stepcache");
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("STEPCACHE_MAPS");
    cmd
  }
}

pub fn path_arg(path: &Path) -> String {
  path.to_string_lossy().into_owned()
}
