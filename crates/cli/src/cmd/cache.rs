//! Implementation of the `stepcache cache` command.
//!
//! Reads the results manifests left by a pipeline step, copies every file they
//! name into the cache folder and writes the file list used by the next step.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use stepcache_lib::cache::{CacheOptions, CacheReport, cache_results};
use stepcache_lib::consts::DEFAULT_SEARCH_DEPTH;
use stepcache_lib::observe::TracingObserver;

use crate::output::{
  OutputFormat, format_elapsed, print_info, print_json, print_stat, print_success, print_warning,
};

#[derive(Debug, Args)]
pub struct CacheArgs {
  /// A results.json file or a folder to search for them
  pub results: PathBuf,

  /// The folder to cache the results into
  pub cache_dir: PathBuf,

  /// Comma separated folder mappings of <source path>:<destination path>
  #[arg(long, env = "STEPCACHE_MAPS")]
  pub maps: Option<String>,

  /// Merge same-name CSV files into one file of the same name
  #[arg(long, alias = "merge_csv")]
  pub merge_csv: bool,

  /// Header lines to drop from each merged CSV file after the first
  #[arg(long, alias = "csv_header_lines", default_value_t = 0)]
  pub csv_header_lines: usize,

  /// Folder depth to search for results files (1 = this folder only)
  #[arg(long, default_value_t = DEFAULT_SEARCH_DEPTH)]
  pub search_depth: usize,

  /// Verify sources and show where files would go without copying
  #[arg(long)]
  pub dry_run: bool,
}

impl From<CacheArgs> for CacheOptions {
  fn from(args: CacheArgs) -> Self {
    CacheOptions {
      results: args.results,
      cache_dir: args.cache_dir,
      maps: args.maps,
      merge_csv: args.merge_csv,
      csv_header_lines: args.csv_header_lines,
      search_depth: args.search_depth,
      dry_run: args.dry_run,
    }
  }
}

fn print_report(report: &CacheReport, start: Instant) {
  let file_count: usize = report.sets.iter().map(|s| s.files.len()).sum();

  println!();
  if report.dry_run {
    print_info("Dry run - no files copied");
  } else {
    print_success("Caching complete!");
  }
  print_stat("Results files", &report.manifests.len().to_string());
  print_stat("File sets", &report.sets.len().to_string());
  print_stat("Files cached", &file_count.to_string());
  print_stat("Metadata files", &report.stats.metadata_written.to_string());
  if let Some(listing) = &report.listing {
    print_stat("File list", &listing.display().to_string());
  }
  print_stat("Duration", &format_elapsed(start.elapsed()));

  if report.dry_run && file_count > 0 {
    println!();
    for file in report.sets.iter().flat_map(|s| s.files.iter()) {
      println!("  {}", file.display());
    }
  }
}

pub fn cmd_cache(args: CacheArgs, output: OutputFormat) -> Result<()> {
  let start = Instant::now();
  let options = CacheOptions::from(args);

  let report = cache_results(&options, &TracingObserver).context("Failed to cache results")?;

  if report.manifests.is_empty() {
    print_warning(&format!("No results files found in {}", options.results.display()));
  }
  if report.stats.entries_skipped > 0 {
    print_warning(&format!(
      "Skipped {} file entries missing the 'path' key",
      report.stats.entries_skipped
    ));
  }

  if output.is_json() {
    print_json(&report)?;
  } else {
    print_report(&report, start);
  }

  Ok(())
}
