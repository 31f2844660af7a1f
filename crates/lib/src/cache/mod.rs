//! Caching of pipeline step results.
//!
//! [`cache_results`] is the entry point used by the command line: it validates
//! the options, reads the results manifests and drives a [`CacheEngine`] run.

mod engine;
pub mod handlers;
pub mod listing;
mod types;

use crate::manifest::ManifestReader;
use crate::observe::CacheObserver;
use crate::path_map::PathMap;

pub use engine::CacheEngine;
pub use handlers::{CsvMergeHandler, FileHandler, HandlerTable};
pub use types::*;

fn check_paths(options: &CacheOptions) -> Result<(), CacheError> {
  let mut problems = Vec::new();
  if !options.results.exists() {
    problems.push(format!("Result file is invalid: '{}'", options.results.display()));
  }
  if !options.cache_dir.is_dir() {
    problems.push(format!("Cache folder is invalid: '{}'", options.cache_dir.display()));
  }
  if problems.is_empty() {
    Ok(())
  } else {
    Err(CacheError::InvalidPaths(problems))
  }
}

/// Resolves the path map and handler table described by `options`.
pub fn build_engine<'a>(
  options: &CacheOptions,
  observer: &'a dyn CacheObserver,
) -> Result<CacheEngine<'a>, CacheError> {
  let path_map = match options.maps.as_deref() {
    Some(spec) => PathMap::parse(spec, observer)?,
    None => PathMap::new(),
  };
  let handlers = if options.merge_csv {
    HandlerTable::with_csv_merge(options.csv_header_lines)
  } else {
    HandlerTable::new()
  };

  Ok(
    CacheEngine::new(&options.cache_dir, observer)
      .with_path_map(path_map)
      .with_handlers(handlers),
  )
}

/// Caches everything named by the results manifests found at `options.results`.
///
/// All configuration is validated before anything is read or written. On a dry
/// run the manifests are collected and verified but the cache folder is left
/// alone; the returned report lists where files would go.
pub fn cache_results(options: &CacheOptions, observer: &dyn CacheObserver) -> Result<CacheReport, CacheError> {
  check_paths(options)?;
  let engine = build_engine(options, observer)?;

  let (manifests, manifest) = ManifestReader::new(observer).read(&options.results, options.search_depth)?;

  if options.dry_run {
    let plan = engine.plan(&manifest)?;
    let sets = plan
      .sets
      .iter()
      .filter(|set| !set.copies.is_empty())
      .map(|set| CachedFileSet {
        files: set.copies.iter().fold(Vec::new(), |mut files, c| {
          if !files.contains(&c.dest) {
            files.push(c.dest.clone());
          }
          files
        }),
        metadata_path: set
          .container
          .as_ref()
          .filter(|c| c.metadata.is_some())
          .map(|c| c.sidecar.clone()),
      })
      .collect();
    return Ok(CacheReport {
      manifests,
      dry_run: true,
      sets,
      listing: None,
      stats: plan.stats,
    });
  }

  let mut report = engine.run(&manifest)?;
  report.manifests = manifests;
  Ok(report)
}
