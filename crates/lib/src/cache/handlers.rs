//! Per-extension handling of cached files.
//!
//! A file whose extension has a registered [`FileHandler`] is passed to it instead
//! of being copied byte for byte.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::consts::CSV_EXTENSION;

pub trait FileHandler {
  /// Places `source` into `dest_dir`, returning the resulting file.
  fn handle(&self, source: &Path, dest_dir: &Path) -> io::Result<PathBuf>;
}

/// Extension (with its leading dot) to handler. Lookups are case-sensitive.
#[derive(Default)]
pub struct HandlerTable {
  handlers: BTreeMap<String, Box<dyn FileHandler>>,
}

impl fmt::Debug for HandlerTable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.handlers.keys()).finish()
  }
}

impl HandlerTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// A table holding only the CSV merge handler.
  pub fn with_csv_merge(header_lines: usize) -> Self {
    let mut table = Self::new();
    table.register(CSV_EXTENSION, CsvMergeHandler::new(header_lines));
    table
  }

  pub fn register(&mut self, extension: impl Into<String>, handler: impl FileHandler + 'static) {
    self.handlers.insert(extension.into(), Box::new(handler));
  }

  pub fn get(&self, extension: &str) -> Option<&dyn FileHandler> {
    self.handlers.get(extension).map(|h| h.as_ref())
  }
}

/// Merges same-named CSV files into one.
///
/// The first file to arrive is copied as is. Later files are appended line by
/// line with their first `header_lines` lines dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvMergeHandler {
  header_lines: usize,
}

impl CsvMergeHandler {
  pub fn new(header_lines: usize) -> Self {
    Self { header_lines }
  }
}

/// True for an empty file or one whose last byte is `\n`.
fn ends_with_newline(file: &mut fs::File) -> io::Result<bool> {
  if file.metadata()?.len() == 0 {
    return Ok(true);
  }
  let mut last = [0u8; 1];
  file.seek(SeekFrom::End(-1))?;
  file.read_exact(&mut last)?;
  Ok(last[0] == b'\n')
}

impl FileHandler for CsvMergeHandler {
  fn handle(&self, source: &Path, dest_dir: &Path) -> io::Result<PathBuf> {
    let name = source
      .file_name()
      .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "source has no file name"))?;
    let dest = dest_dir.join(name);

    if !dest.exists() {
      fs::copy(source, &dest)?;
      return Ok(dest);
    }

    let content = fs::read_to_string(source)?;
    let mut out = OpenOptions::new().read(true).append(true).open(&dest)?;
    if !ends_with_newline(&mut out)? {
      out.write_all(b"\n")?;
    }
    for line in content.lines().skip(self.header_lines) {
      out.write_all(line.as_bytes())?;
      out.write_all(b"\n")?;
    }

    Ok(dest)
  }
}
