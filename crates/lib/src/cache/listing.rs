//! The consolidated listing of cached files.
//!
//! The listing is read by the workflow templating engine as a substitution source,
//! so its text layout is fixed: key order, indentation and the absence of a
//! trailing newline all matter. Records are built as ordered key/value lists and
//! rendered by hand instead of going through a generic serializer.
//!
//! ```text
//! {
//!   "FILE_LIST": [
//!   {
//!     "PATH": "/cache/a.tif",
//!     "NAME": "cache/a.tif",
//!     "BASE_IMAGE_NAME": "a"
//!   }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::consts::CACHE_LIST_FILE_NAME;
use crate::path_map::PathMap;

use super::types::{CacheError, CachedFileSet};

pub const KEY_FILE_LIST: &str = "FILE_LIST";
pub const KEY_METADATA: &str = "METADATA";
pub const KEY_METADATA_NAME: &str = "METADATA_NAME";
pub const KEY_BASE_METADATA_NAME: &str = "BASE_METADATA_NAME";
pub const KEY_PATH: &str = "PATH";
pub const KEY_NAME: &str = "NAME";
pub const KEY_BASE_IMAGE_NAME: &str = "BASE_IMAGE_NAME";

/// One `FILE_LIST` entry, fields in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingRecord {
  fields: Vec<(&'static str, String)>,
}

impl ListingRecord {
  pub fn push(&mut self, key: &'static str, value: impl Into<String>) {
    self.fields.push((key, value.into()));
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
  }

  pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
    self.fields.iter().map(|(k, _)| *k)
  }
}

fn display(path: &Path) -> String {
  path.to_string_lossy().into_owned()
}

fn stem(path: &Path) -> String {
  path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

/// One record per cached file, carrying its set's sidecar fields first.
pub fn build_records(sets: &[CachedFileSet], path_map: &PathMap) -> Vec<ListingRecord> {
  let mut records = Vec::new();

  for set in sets {
    for file in &set.files {
      let mut record = ListingRecord::default();
      if let Some(sidecar) = &set.metadata_path {
        let sidecar_str = display(sidecar);
        let sidecar_name = path_map.strip(&sidecar_str);
        record.push(KEY_METADATA, sidecar_str);
        record.push(KEY_METADATA_NAME, sidecar_name);
        record.push(KEY_BASE_METADATA_NAME, stem(sidecar));
      }

      let file_str = display(file);
      let name = path_map.strip(&file_str);
      record.push(KEY_PATH, file_str);
      record.push(KEY_NAME, name);
      record.push(KEY_BASE_IMAGE_NAME, stem(file));

      records.push(record);
    }
  }

  records
}

fn quote(value: &str) -> String {
  Value::String(value.to_string()).to_string()
}

pub fn render(records: &[ListingRecord]) -> String {
  let mut out = format!("{{\n  {}: [", quote(KEY_FILE_LIST));

  for (i, record) in records.iter().enumerate() {
    if i > 0 {
      out.push(',');
    }
    let lines: Vec<String> = record
      .fields
      .iter()
      .map(|(key, value)| format!("{}: {}", quote(key), quote(value)))
      .collect();
    out.push_str("\n  {\n    ");
    out.push_str(&lines.join(",\n    "));
    out.push_str("\n  }");
  }

  out.push_str("\n  ]\n}");
  out
}

/// Writes the listing into `cache_dir`, returning its path and record count.
pub fn write_listing(
  cache_dir: &Path,
  sets: &[CachedFileSet],
  path_map: &PathMap,
) -> Result<(PathBuf, usize), CacheError> {
  let path = cache_dir.join(CACHE_LIST_FILE_NAME);
  let records = build_records(sets, path_map);

  fs::write(&path, render(&records)).map_err(|source| CacheError::WriteListing {
    path: path.clone(),
    source,
  })?;

  Ok((path, records.len()))
}
