//! Metadata fragments and the sidecar files they are saved to.
//!
//! A fragment may wrap its payload in a `data` key; otherwise the whole fragment
//! is the payload. A truthy `replace` key appends the payload to an existing
//! sidecar (joined with a `,`) instead of overwriting it. Existing sidecar content
//! is never parsed, so repeated appends produce a concatenation of JSON values
//! rather than a single document.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::consts::SIDECAR_EXTENSION;
use crate::observe::{CacheEvent, CacheObserver};

#[derive(Debug, Error)]
pub enum MetadataError {
  #[error("failed to serialize metadata for {path}: {source}")]
  Serialize {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to write metadata file {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// An arbitrary metadata fragment from a results manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(pub Value);

/// Loose truthiness used by manifest flags.
fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    Value::String(s) => !s.is_empty(),
    Value::Array(a) => !a.is_empty(),
    Value::Object(o) => !o.is_empty(),
  }
}

impl Metadata {
  pub fn new(value: Value) -> Self {
    Self(value)
  }

  /// The value to persist: `data` when present, otherwise the whole fragment.
  pub fn payload(&self) -> &Value {
    self.0.get("data").unwrap_or(&self.0)
  }

  /// Whether the payload is appended to an existing sidecar.
  pub fn appends(&self) -> bool {
    self.0.get("replace").is_some_and(is_truthy)
  }

  /// A falsy fragment such as `{}` or `null`. File entries carrying one get no sidecar.
  pub fn is_blank(&self) -> bool {
    !is_truthy(&self.0)
  }
}

/// How a sidecar write landed on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SidecarWrite {
  Created,
  Overwrote,
  Appended,
}

impl SidecarWrite {
  pub fn as_str(self) -> &'static str {
    match self {
      SidecarWrite::Created => "created",
      SidecarWrite::Overwrote => "overwrote",
      SidecarWrite::Appended => "appended",
    }
  }
}

/// Sidecar for a cached file: the destination path with a `.json` extension.
pub fn sidecar_for_file(dest: &Path) -> PathBuf {
  dest.with_extension(SIDECAR_EXTENSION)
}

/// Sidecar for a container: `<cache_dir>/<name>.json`, beside the container folder.
pub fn sidecar_for_container(cache_dir: &Path, name: &str) -> PathBuf {
  cache_dir.join(format!("{}.{}", name, SIDECAR_EXTENSION))
}

pub struct MetadataWriter<'a> {
  observer: &'a dyn CacheObserver,
}

impl<'a> MetadataWriter<'a> {
  pub fn new(observer: &'a dyn CacheObserver) -> Self {
    Self { observer }
  }

  /// Writes `metadata` to `sidecar`, overwriting or appending per its `replace` flag.
  pub fn write(&self, sidecar: &Path, metadata: &Metadata) -> Result<SidecarWrite, MetadataError> {
    let content = serde_json::to_string_pretty(metadata.payload()).map_err(|source| MetadataError::Serialize {
      path: sidecar.to_path_buf(),
      source,
    })?;
    let write_err = |source| MetadataError::Write {
      path: sidecar.to_path_buf(),
      source,
    };

    let mode = match (sidecar.exists(), metadata.appends()) {
      (true, true) => {
        let mut file = OpenOptions::new().append(true).open(sidecar).map_err(write_err)?;
        file.write_all(b",").map_err(write_err)?;
        file.write_all(content.as_bytes()).map_err(write_err)?;
        SidecarWrite::Appended
      }
      (exists, _) => {
        fs::write(sidecar, content).map_err(write_err)?;
        if exists {
          SidecarWrite::Overwrote
        } else {
          SidecarWrite::Created
        }
      }
    };

    self.observer.event(CacheEvent::MetadataWritten {
      path: sidecar.to_path_buf(),
      mode,
    });
    Ok(mode)
  }
}
