//! Diagnostic events emitted while reading manifests and caching files.
//!
//! Components never log directly. They report [`CacheEvent`]s to an injected
//! [`CacheObserver`]; the binary uses [`TracingObserver`] and tests use
//! [`RecordingObserver`] to assert on what happened.

use std::cell::RefCell;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::metadata::SidecarWrite;

/// Phases of a caching run, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePhase {
  Collecting,
  Verifying,
  Copying,
  Recording,
  Done,
}

impl CachePhase {
  pub fn as_str(self) -> &'static str {
    match self {
      CachePhase::Collecting => "collecting",
      CachePhase::Verifying => "verifying",
      CachePhase::Copying => "copying",
      CachePhase::Recording => "recording",
      CachePhase::Done => "done",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CacheEvent {
  /// A malformed path-map piece was dropped.
  MapEntryIgnored { entry: String },
  /// A `results.json` file was found during discovery.
  ManifestFound { path: PathBuf },
  /// A manifest carried neither containers nor files.
  ManifestEmpty { path: PathBuf },
  PhaseStarted { phase: CachePhase },
  /// A file entry had no `path` key.
  EntrySkipped { container: Option<String> },
  /// A container had no usable name.
  ContainerSkipped,
  PathMapped { from: String, to: String },
  SourceMissing { path: String },
  FileCopied { source: PathBuf, dest: PathBuf },
  /// A file went through an extension handler instead of a plain copy.
  FileHandled { source: PathBuf, dest: PathBuf, extension: String },
  MetadataWritten { path: PathBuf, mode: SidecarWrite },
  ListingWritten { path: PathBuf, records: usize },
}

/// Receives diagnostic events from the caching components.
pub trait CacheObserver {
  fn event(&self, event: CacheEvent);
}

/// Forwards events to `tracing` with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CacheObserver for TracingObserver {
  fn event(&self, event: CacheEvent) {
    match event {
      CacheEvent::MapEntryIgnored { entry } => warn!(entry = %entry, "invalid path mapping ignored"),
      CacheEvent::ManifestFound { path } => debug!(path = %path.display(), "found results file"),
      CacheEvent::ManifestEmpty { path } => {
        info!(path = %path.display(), "no containers or top-level files in results")
      }
      CacheEvent::PhaseStarted { phase } => debug!(phase = phase.as_str(), "cache phase"),
      CacheEvent::EntrySkipped { container } => {
        debug!(container = container.as_deref().unwrap_or("<top-level>"), "file entry missing 'path', skipping")
      }
      CacheEvent::ContainerSkipped => debug!("container without a name, skipping"),
      CacheEvent::PathMapped { from, to } => info!(from = %from, to = %to, "mapped file path"),
      CacheEvent::SourceMissing { path } => warn!(path = %path, "file is missing and will not be copied"),
      CacheEvent::FileCopied { source, dest } => {
        debug!(source = %source.display(), dest = %dest.display(), "copied file")
      }
      CacheEvent::FileHandled { source, dest, extension } => {
        debug!(source = %source.display(), dest = %dest.display(), extension = %extension, "handled file")
      }
      CacheEvent::MetadataWritten { path, mode } => {
        debug!(path = %path.display(), mode = mode.as_str(), "saved metadata")
      }
      CacheEvent::ListingWritten { path, records } => info!(path = %path.display(), records, "wrote cached file list"),
    }
  }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
  events: RefCell<Vec<CacheEvent>>,
}

impl RecordingObserver {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn events(&self) -> Vec<CacheEvent> {
    self.events.borrow().clone()
  }

  /// Number of recorded events matching `pred`.
  pub fn count(&self, pred: impl Fn(&CacheEvent) -> bool) -> usize {
    self.events.borrow().iter().filter(|e| pred(e)).count()
  }
}

impl CacheObserver for RecordingObserver {
  fn event(&self, event: CacheEvent) {
    self.events.borrow_mut().push(event);
  }
}
