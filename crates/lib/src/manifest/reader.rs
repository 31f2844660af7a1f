use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::consts::RESULTS_FILE_NAME;
use crate::observe::{CacheEvent, CacheObserver};

use super::types::ResultManifest;

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("results path does not exist: {0}")]
  NotFound(PathBuf),

  #[error("failed to search for results files: {message}")]
  Walk { message: String },

  #[error("failed to read results file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse results file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

fn is_results_file(path: &Path) -> bool {
  path.file_name().is_some_and(|n| n == RESULTS_FILE_NAME)
    && path.is_file()
    && path.parent().is_some_and(|p| p.as_os_str().is_empty() || p.is_dir())
}

/// Finds and loads results manifests.
pub struct ManifestReader<'a> {
  observer: &'a dyn CacheObserver,
}

impl<'a> ManifestReader<'a> {
  pub fn new(observer: &'a dyn CacheObserver) -> Self {
    Self { observer }
  }

  /// Finds files named `results.json` under `root`.
  ///
  /// A `max_depth` of 1 searches `root` only, 2 adds its immediate sub-folders,
  /// and so on; 0 behaves like 1. When `root` is a file it is returned if its
  /// name qualifies. Results are ordered by a name-sorted depth-first walk.
  pub fn discover(&self, root: &Path, max_depth: usize) -> Result<Vec<PathBuf>, ManifestError> {
    if !root.exists() {
      return Err(ManifestError::NotFound(root.to_path_buf()));
    }

    if root.is_file() {
      if is_results_file(root) {
        self.observer.event(CacheEvent::ManifestFound {
          path: root.to_path_buf(),
        });
        return Ok(vec![root.to_path_buf()]);
      }
      return Ok(Vec::new());
    }

    let mut found = Vec::new();
    let walker = WalkDir::new(root)
      .min_depth(1)
      .max_depth(max_depth.max(1))
      .follow_links(true)
      .sort_by_file_name();

    for entry in walker {
      let entry = entry.map_err(|e| ManifestError::Walk { message: e.to_string() })?;
      let path = entry.path();
      if is_results_file(path) {
        self.observer.event(CacheEvent::ManifestFound {
          path: path.to_path_buf(),
        });
        found.push(path.to_path_buf());
      }
    }

    Ok(found)
  }

  /// Loads each manifest in turn, concatenating containers and files.
  pub fn load(&self, paths: &[PathBuf]) -> Result<ResultManifest, ManifestError> {
    let mut combined = ResultManifest::default();

    for path in paths {
      let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.clone(),
        source,
      })?;
      let manifest: ResultManifest = serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
        path: path.clone(),
        source,
      })?;

      if manifest.is_empty() {
        self.observer.event(CacheEvent::ManifestEmpty { path: path.clone() });
      }
      combined.extend(manifest);
    }

    Ok(combined)
  }

  /// Discovers manifests under `root` and loads them.
  pub fn read(&self, root: &Path, max_depth: usize) -> Result<(Vec<PathBuf>, ResultManifest), ManifestError> {
    let paths = self.discover(root, max_depth)?;
    let manifest = self.load(&paths)?;
    Ok((paths, manifest))
  }
}
