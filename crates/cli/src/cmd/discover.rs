//! Implementation of the `stepcache discover` command.

use std::path::{Path, PathBuf};
use std::slice;

use anyhow::{Context, Result};
use serde::Serialize;

use stepcache_lib::manifest::ManifestReader;
use stepcache_lib::observe::TracingObserver;

use crate::output::{OutputFormat, print_info, print_json, print_warning};

#[derive(Debug, Serialize)]
struct ManifestSummary {
  path: PathBuf,
  containers: usize,
  files: usize,
}

pub fn cmd_discover(root: &Path, search_depth: usize, output: OutputFormat) -> Result<()> {
  let reader = ManifestReader::new(&TracingObserver);
  let paths = reader
    .discover(root, search_depth)
    .with_context(|| format!("Failed to search for results files: {}", root.display()))?;

  let mut summaries = Vec::with_capacity(paths.len());
  for path in paths {
    let manifest = reader.load(slice::from_ref(&path))?;
    summaries.push(ManifestSummary {
      containers: manifest.containers.len(),
      files: manifest.file_entry_count(),
      path,
    });
  }

  if output.is_json() {
    return print_json(&summaries);
  }

  if summaries.is_empty() {
    print_warning(&format!("No results files found in {}", root.display()));
    return Ok(());
  }
  for summary in &summaries {
    print_info(&format!(
      "{} ({} containers, {} files)",
      summary.path.display(),
      summary.containers,
      summary.files
    ));
  }

  Ok(())
}
