use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::consts::DEFAULT_SEARCH_DEPTH;
use crate::manifest::ManifestError;
use crate::metadata::{Metadata, MetadataError};
use crate::path_map::PathMapError;

#[derive(Debug, Error)]
pub enum CacheError {
  #[error("{}", .0.join("\n"))]
  InvalidPaths(Vec<String>),

  #[error(transparent)]
  PathMap(#[from] PathMapError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error("found {missing} missing files out of {total}; stopping processing")]
  MissingSources {
    missing: usize,
    total: usize,
    paths: Vec<String>,
  },

  #[error("failed to create cache folder {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to copy {from} to {to}: {source}")]
  Copy {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("'{extension}' handler failed on {path}: {source}")]
  Handler {
    extension: String,
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Metadata(#[from] MetadataError),

  #[error("failed to write cached file list {path}: {source}")]
  WriteListing {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Resolved settings for one caching run.
#[derive(Debug, Clone)]
pub struct CacheOptions {
  /// A `results.json` file or a folder to search for them.
  pub results: PathBuf,
  pub cache_dir: PathBuf,
  /// Comma separated `src:dst` path mappings.
  pub maps: Option<String>,
  pub merge_csv: bool,
  /// Header lines dropped from every merged CSV file after the first.
  pub csv_header_lines: usize,
  pub search_depth: usize,
  /// Plan and verify only; nothing is written.
  pub dry_run: bool,
}

impl CacheOptions {
  pub fn new(results: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
    Self {
      results: results.into(),
      cache_dir: cache_dir.into(),
      maps: None,
      merge_csv: false,
      csv_header_lines: 0,
      search_depth: DEFAULT_SEARCH_DEPTH,
      dry_run: false,
    }
  }
}

/// One file to copy, with its source already mapped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedCopy {
  pub source: PathBuf,
  pub dest: PathBuf,
  pub metadata: Option<Metadata>,
}

/// A container's cache folder and its metadata sidecar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedContainer {
  pub name: String,
  pub dir: PathBuf,
  pub sidecar: PathBuf,
  pub metadata: Option<Metadata>,
}

/// Copies that land in the same folder: one container, or the top-level files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedSet {
  pub container: Option<PlannedContainer>,
  pub dest_dir: PathBuf,
  pub copies: Vec<PlannedCopy>,
}

/// The verified outcome of the collecting phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CopyPlan {
  pub sets: Vec<PlannedSet>,
  pub stats: CacheStats,
}

/// Files cached for one container or for the top-level batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedFileSet {
  pub files: Vec<PathBuf>,
  pub metadata_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
  /// File entries that carried a path.
  pub files_total: usize,
  pub files_copied: usize,
  /// Files that went through an extension handler.
  pub files_handled: usize,
  /// File entries without a path.
  pub entries_skipped: usize,
  /// Containers without a name.
  pub containers_skipped: usize,
  pub metadata_written: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheReport {
  pub manifests: Vec<PathBuf>,
  pub dry_run: bool,
  pub sets: Vec<CachedFileSet>,
  /// Path of the consolidated listing; `None` on a dry run.
  pub listing: Option<PathBuf>,
  pub stats: CacheStats,
}
