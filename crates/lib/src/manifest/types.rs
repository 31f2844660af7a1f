//! Manifest types for stepcache.
//!
//! # Example
//!
//! ```json
//! {
//!   "containers": [
//!     {
//!       "name": "odm",
//!       "metadata": { "data": { "k": 1 } },
//!       "files": [ { "path": "/data/odm/ortho.tif" } ]
//!     }
//!   ],
//!   "files": [ { "path": "/data/plot.csv", "metadata": { "replace": true, "data": {} } } ]
//! }
//! ```
//!
//! `container` and `file` are accepted as singular spellings of the list keys.
//! When both spellings are present the singular one is used and the other ignored.

use serde::{Deserialize, Serialize};

use crate::metadata::Metadata;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawManifest")]
pub struct ResultManifest {
  pub containers: Vec<Container>,
  pub files: Vec<FileEntry>,
}

#[derive(Deserialize)]
struct RawManifest {
  #[serde(default)]
  container: Option<Vec<Container>>,
  #[serde(default)]
  containers: Option<Vec<Container>>,
  #[serde(default)]
  file: Option<Vec<FileEntry>>,
  #[serde(default)]
  files: Option<Vec<FileEntry>>,
}

impl From<RawManifest> for ResultManifest {
  fn from(raw: RawManifest) -> Self {
    Self {
      containers: raw.container.or(raw.containers).unwrap_or_default(),
      files: raw.file.or(raw.files).unwrap_or_default(),
    }
  }
}

impl ResultManifest {
  pub fn is_empty(&self) -> bool {
    self.containers.is_empty() && self.files.is_empty()
  }

  /// Appends another manifest's containers and files after this one's.
  pub fn extend(&mut self, other: ResultManifest) {
    self.containers.extend(other.containers);
    self.files.extend(other.files);
  }

  /// Number of file entries, including those inside containers.
  pub fn file_entry_count(&self) -> usize {
    self.files.len() + self.containers.iter().map(|c| c.files.len()).sum::<usize>()
  }
}

/// A named group of files cached into a folder of the same name.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawContainer")]
pub struct Container {
  pub name: Option<String>,
  pub files: Vec<FileEntry>,
  pub metadata: Option<Metadata>,
}

#[derive(Deserialize)]
struct RawContainer {
  #[serde(default)]
  name: Option<String>,
  #[serde(default)]
  file: Option<Vec<FileEntry>>,
  #[serde(default)]
  files: Option<Vec<FileEntry>>,
  #[serde(default)]
  metadata: Option<Metadata>,
}

impl From<RawContainer> for Container {
  fn from(raw: RawContainer) -> Self {
    Self {
      name: raw.name,
      files: raw.file.or(raw.files).unwrap_or_default(),
      metadata: raw.metadata,
    }
  }
}

impl Container {
  /// The container name, if present and non-empty.
  pub fn name(&self) -> Option<&str> {
    self.name.as_deref().filter(|n| !n.is_empty())
  }
}

/// One file to cache.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
  /// Source path as the producing step saw it; mapped before use.
  #[serde(default)]
  pub path: Option<String>,
  #[serde(default)]
  pub metadata: Option<Metadata>,
}

impl FileEntry {
  pub fn new(path: impl Into<String>) -> Self {
    Self {
      path: Some(path.into()),
      metadata: None,
    }
  }

  pub fn with_metadata(mut self, metadata: Metadata) -> Self {
    self.metadata = Some(metadata);
    self
  }
}
