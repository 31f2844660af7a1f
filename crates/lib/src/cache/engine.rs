use std::fs;
use std::path::{Path, PathBuf};

use crate::manifest::{Container, FileEntry, ResultManifest};
use crate::metadata::{MetadataWriter, sidecar_for_container, sidecar_for_file};
use crate::observe::{CacheEvent, CacheObserver, CachePhase};
use crate::path_map::PathMap;

use super::handlers::HandlerTable;
use super::listing::write_listing;
use super::types::{
  CacheError, CacheReport, CacheStats, CachedFileSet, CopyPlan, PlannedContainer, PlannedCopy, PlannedSet,
};

/// Running totals while mapping and checking file entries.
#[derive(Default)]
struct Collector {
  stats: CacheStats,
  missing: Vec<String>,
}

impl Collector {
  fn verify(&self) -> Result<(), CacheError> {
    if self.missing.is_empty() {
      return Ok(());
    }
    Err(CacheError::MissingSources {
      missing: self.missing.len(),
      total: self.stats.files_total,
      paths: self.missing.clone(),
    })
  }
}

/// Extension of `path` with its leading dot, as used for handler lookup.
fn dotted_extension(path: &Path) -> Option<String> {
  path.extension().map(|ext| format!(".{}", ext.to_string_lossy()))
}

/// Copies the files named by a results manifest into a cache folder.
///
/// A run moves through [`CachePhase`]s in order. Every source is mapped and
/// checked before anything is written; a single missing file fails the whole run
/// with [`CacheError::MissingSources`] and leaves the cache folder untouched.
/// Once copying starts there is no rollback.
pub struct CacheEngine<'a> {
  cache_dir: PathBuf,
  path_map: PathMap,
  handlers: HandlerTable,
  observer: &'a dyn CacheObserver,
}

impl<'a> CacheEngine<'a> {
  pub fn new(cache_dir: impl Into<PathBuf>, observer: &'a dyn CacheObserver) -> Self {
    Self {
      cache_dir: cache_dir.into(),
      path_map: PathMap::new(),
      handlers: HandlerTable::new(),
      observer,
    }
  }

  pub fn with_path_map(mut self, path_map: PathMap) -> Self {
    self.path_map = path_map;
    self
  }

  pub fn with_handlers(mut self, handlers: HandlerTable) -> Self {
    self.handlers = handlers;
    self
  }

  pub fn cache_dir(&self) -> &Path {
    &self.cache_dir
  }

  fn phase(&self, phase: CachePhase) {
    self.observer.event(CacheEvent::PhaseStarted { phase });
  }

  fn check_cache_dir(&self) -> Result<(), CacheError> {
    if self.cache_dir.is_dir() {
      return Ok(());
    }
    Err(CacheError::InvalidPaths(vec![format!(
      "Cache folder is invalid: '{}'",
      self.cache_dir.display()
    )]))
  }

  fn collect_into(
    &self,
    entries: &[FileEntry],
    dest_dir: &Path,
    container: Option<&str>,
    acc: &mut Collector,
  ) -> Vec<PlannedCopy> {
    let mut copies = Vec::new();

    for entry in entries {
      let Some(path) = entry.path.as_deref() else {
        acc.stats.entries_skipped += 1;
        self.observer.event(CacheEvent::EntrySkipped {
          container: container.map(str::to_string),
        });
        continue;
      };
      acc.stats.files_total += 1;

      let mapped = self.path_map.map(path);
      if mapped != path {
        self.observer.event(CacheEvent::PathMapped {
          from: path.to_string(),
          to: mapped.clone(),
        });
      }

      let source = PathBuf::from(&mapped);
      let dest = Path::new(path)
        .file_name()
        .or_else(|| source.file_name())
        .map(|name| dest_dir.join(name));
      match dest {
        Some(dest) if source.is_file() => copies.push(PlannedCopy {
          source,
          dest,
          metadata: entry.metadata.clone(),
        }),
        _ => {
          self.observer.event(CacheEvent::SourceMissing { path: path.to_string() });
          acc.missing.push(path.to_string());
        }
      }
    }

    copies
  }

  /// Maps and checks one batch of file entries destined for `dest_dir`.
  ///
  /// Entries without a path are skipped. Fails if any mapped source is not a
  /// regular file.
  pub fn collect(&self, entries: &[FileEntry], dest_dir: &Path) -> Result<Vec<PlannedCopy>, CacheError> {
    let mut acc = Collector::default();
    let copies = self.collect_into(entries, dest_dir, None, &mut acc);
    acc.verify()?;
    Ok(copies)
  }

  fn plan_parts(&self, containers: &[Container], files: &[FileEntry]) -> Result<CopyPlan, CacheError> {
    self.check_cache_dir()?;
    self.phase(CachePhase::Collecting);

    let mut acc = Collector::default();
    let mut sets = Vec::new();

    for container in containers {
      let Some(name) = container.name() else {
        acc.stats.containers_skipped += 1;
        self.observer.event(CacheEvent::ContainerSkipped);
        continue;
      };

      let dir = self.cache_dir.join(name);
      let copies = self.collect_into(&container.files, &dir, Some(name), &mut acc);
      sets.push(PlannedSet {
        container: Some(PlannedContainer {
          name: name.to_string(),
          dir: dir.clone(),
          sidecar: sidecar_for_container(&self.cache_dir, name),
          metadata: container.metadata.clone(),
        }),
        dest_dir: dir,
        copies,
      });
    }

    if !files.is_empty() {
      let copies = self.collect_into(files, &self.cache_dir, None, &mut acc);
      sets.push(PlannedSet {
        container: None,
        dest_dir: self.cache_dir.clone(),
        copies,
      });
    }

    self.phase(CachePhase::Verifying);
    acc.verify()?;

    Ok(CopyPlan { sets, stats: acc.stats })
  }

  /// Collects and verifies the whole manifest without writing anything.
  pub fn plan(&self, manifest: &ResultManifest) -> Result<CopyPlan, CacheError> {
    self.plan_parts(&manifest.containers, &manifest.files)
  }

  /// Copies planned files, routing them through extension handlers where one is
  /// registered, and writes per-file metadata sidecars.
  ///
  /// Returns the distinct destination files in copy order.
  pub fn copy(&self, copies: &[PlannedCopy], stats: &mut CacheStats) -> Result<Vec<PathBuf>, CacheError> {
    let writer = MetadataWriter::new(self.observer);
    let mut copied: Vec<PathBuf> = Vec::new();

    for planned in copies {
      let dest_dir = planned.dest.parent().unwrap_or(self.cache_dir.as_path());
      let handler = dotted_extension(&planned.source).and_then(|ext| self.handlers.get(&ext).map(|h| (ext, h)));

      let dest = match handler {
        Some((extension, handler)) => {
          let dest = handler
            .handle(&planned.source, dest_dir)
            .map_err(|source| CacheError::Handler {
              extension: extension.clone(),
              path: planned.source.clone(),
              source,
            })?;
          stats.files_handled += 1;
          self.observer.event(CacheEvent::FileHandled {
            source: planned.source.clone(),
            dest: dest.clone(),
            extension,
          });
          dest
        }
        None => {
          fs::copy(&planned.source, &planned.dest).map_err(|source| CacheError::Copy {
            from: planned.source.clone(),
            to: planned.dest.clone(),
            source,
          })?;
          stats.files_copied += 1;
          self.observer.event(CacheEvent::FileCopied {
            source: planned.source.clone(),
            dest: planned.dest.clone(),
          });
          planned.dest.clone()
        }
      };

      if let Some(metadata) = planned.metadata.as_ref().filter(|m| !m.is_blank()) {
        writer.write(&sidecar_for_file(&dest), metadata)?;
        stats.metadata_written += 1;
      }

      if !copied.contains(&dest) {
        copied.push(dest);
      }
    }

    Ok(copied)
  }

  fn execute(&self, plan: CopyPlan) -> Result<(Vec<CachedFileSet>, CacheStats), CacheError> {
    self.phase(CachePhase::Copying);

    let writer = MetadataWriter::new(self.observer);
    let mut stats = plan.stats;
    let mut cached = Vec::new();

    for set in plan.sets {
      let mut metadata_path = None;

      if let Some(container) = &set.container {
        fs::create_dir_all(&container.dir).map_err(|source| CacheError::CreateDir {
          path: container.dir.clone(),
          source,
        })?;

        if let Some(metadata) = &container.metadata {
          writer.write(&container.sidecar, metadata)?;
          stats.metadata_written += 1;
          metadata_path = Some(container.sidecar.clone());
        }
      }

      let files = self.copy(&set.copies, &mut stats)?;
      if !files.is_empty() {
        cached.push(CachedFileSet { files, metadata_path });
      }
    }

    Ok((cached, stats))
  }

  /// Caches each named container into a sub-folder of the same name.
  ///
  /// Containers without a name are skipped. A container's metadata is written to
  /// `<cache_dir>/<name>.json`.
  pub fn cache_containers(&self, containers: &[Container]) -> Result<Vec<CachedFileSet>, CacheError> {
    let plan = self.plan_parts(containers, &[])?;
    let (sets, _) = self.execute(plan)?;
    Ok(sets)
  }

  /// Caches loose files into the cache folder itself.
  pub fn cache_files(&self, files: &[FileEntry]) -> Result<Vec<CachedFileSet>, CacheError> {
    let plan = self.plan_parts(&[], files)?;
    let (sets, _) = self.execute(plan)?;
    Ok(sets)
  }

  /// Caches containers, then top-level files, then writes the consolidated listing.
  pub fn run(&self, manifest: &ResultManifest) -> Result<CacheReport, CacheError> {
    let plan = self.plan(manifest)?;
    let (sets, stats) = self.execute(plan)?;

    self.phase(CachePhase::Recording);
    let (listing, records) = write_listing(&self.cache_dir, &sets, &self.path_map)?;
    self.observer.event(CacheEvent::ListingWritten {
      path: listing.clone(),
      records,
    });
    self.phase(CachePhase::Done);

    Ok(CacheReport {
      manifests: Vec::new(),
      dry_run: false,
      sets,
      listing: Some(listing),
      stats,
    })
  }
}
