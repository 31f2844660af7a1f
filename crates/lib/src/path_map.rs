//! Leading-folder path rewrites.
//!
//! A path map is built from a comma separated `src:dst` spec given on the command
//! line. Paths named in a results manifest are written from the point of view of
//! the container that produced them; the map rewrites them to where the files
//! actually live on this host.
//!
//! Matching is a literal prefix test followed by a separator boundary check, so a
//! prefix of `/home/foo` matches `/home/foo/x` but never `/home/foobar`. Entries
//! are tried in the order they were given and the first match wins.
//!
//! [`PathMap::strip`] is not an inverse of [`PathMap::map`]: it matches destination
//! prefixes wherever they come from, so a path that already lived under a
//! destination prefix gets stripped too.

use std::path::Path;

use thiserror::Error;

use crate::observe::{CacheEvent, CacheObserver};

#[derive(Debug, Error)]
pub enum PathMapError {
  #[error("path mappings specified but none were valid: '{spec}'")]
  Empty { spec: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMap {
  entries: Vec<(String, String)>,
}

fn is_separator(c: char) -> bool {
  c == '/' || c == '\\'
}

fn trim_separators(s: &str) -> &str {
  s.trim_end_matches(is_separator)
}

/// Returns what follows `prefix` in `path` when `prefix` ends on a folder boundary.
///
/// `Some("")` means an exact match.
fn boundary_remainder<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
  let rest = path.strip_prefix(prefix)?;
  if rest.is_empty() {
    return Some(rest);
  }
  let mut chars = rest.chars();
  match chars.next() {
    Some(c) if is_separator(c) => Some(chars.as_str()),
    _ => None,
  }
}

impl PathMap {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parses a `src:dst[,src:dst...]` spec.
  ///
  /// Trailing separators are trimmed from both sides. Pieces without exactly one
  /// `:` are reported and dropped. A blank spec gives an empty map; a non-blank
  /// spec where nothing survives is an error.
  pub fn parse(spec: &str, observer: &dyn CacheObserver) -> Result<Self, PathMapError> {
    let mut map = PathMap::new();
    if spec.trim().is_empty() {
      return Ok(map);
    }

    for piece in spec.split(',') {
      match piece.split_once(':') {
        Some((src, dst)) if !dst.contains(':') => {
          map.insert(trim_separators(src), trim_separators(dst));
        }
        _ => observer.event(CacheEvent::MapEntryIgnored {
          entry: piece.to_string(),
        }),
      }
    }

    if map.is_empty() {
      return Err(PathMapError::Empty { spec: spec.to_string() });
    }
    Ok(map)
  }

  /// Adds a mapping. A source that is already present keeps its position and
  /// takes the new destination.
  pub fn insert(&mut self, src: impl Into<String>, dst: impl Into<String>) {
    let src = src.into();
    let dst = dst.into();
    match self.entries.iter_mut().find(|(s, _)| *s == src) {
      Some(entry) => entry.1 = dst,
      None => self.entries.push((src, dst)),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
    self.entries.iter().map(|(s, d)| (s.as_str(), d.as_str()))
  }

  /// Rewrites the leading folder of `path` using the first matching source prefix.
  pub fn map(&self, path: &str) -> String {
    for (src, dst) in &self.entries {
      match boundary_remainder(path, src) {
        Some("") if path.len() == src.len() => return path.to_string(),
        Some(rest) => return Path::new(dst).join(rest).to_string_lossy().into_owned(),
        None => {}
      }
    }
    path.to_string()
  }

  /// Removes the first matching destination prefix from `path`.
  ///
  /// An exact match gives an empty string.
  pub fn strip(&self, path: &str) -> String {
    for (_, dst) in &self.entries {
      if let Some(rest) = boundary_remainder(path, dst) {
        return rest.to_string();
      }
    }
    path.to_string()
  }
}
