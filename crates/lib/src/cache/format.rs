//! Text format of the cache file.
//!
//! ```text
//! # header lines (ignored on load)
//!
//! // help text for KEY
//! KEY:KIND=VALUE
//! KEY-ADVANCED:INTERNAL=1
//! ```
//!
//! Entries are written sorted by key. A file produced by [`render`] parses back
//! into the same entries and renders to the same bytes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::types::{CacheEntry, CacheEntryKind, CacheError, is_truthy};

const HEADER: &str = "\
# This is the buildgen cache file for this build directory.
# It holds configuration values that persist across regenerations.
# Change values with `bgen cache set` or edit them here; lines starting with
# '#' are ignored.
#
# Each entry is written as KEY:KIND=VALUE.
";

const ADVANCED_SUFFIX: &str = "-ADVANCED";

/// One parsed `KEY[:KIND]=VALUE` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
  pub key: String,
  pub kind: CacheEntryKind,
  pub value: String,
}

/// Split a definition line into key, kind and value.
///
/// A missing kind yields [`CacheEntryKind::Uninitialized`].
pub fn parse_definition(line: &str) -> Option<Definition> {
  let (lhs, value) = line.split_once('=')?;
  let (key, kind) = match lhs.rsplit_once(':') {
    Some((key, kind)) => (key, kind.trim().parse::<CacheEntryKind>().ok()?),
    None => (lhs, CacheEntryKind::Uninitialized),
  };

  let key = key.trim();
  if key.is_empty() || key.contains(char::is_whitespace) {
    return None;
  }

  Some(Definition {
    key: key.to_string(),
    kind,
    value: value.to_string(),
  })
}

/// Why `key` and `value` cannot be stored as a single cache line, if they cannot.
///
/// Anything accepted here renders to a line that parses back to the same entry.
pub(crate) fn unrepresentable(key: &str, value: &str, kind: CacheEntryKind) -> Option<&'static str> {
  if key.is_empty() || key.contains(char::is_whitespace) {
    return Some("key is empty or contains whitespace");
  }
  if key.contains('=') {
    return Some("key contains '='");
  }
  if key.starts_with('#') || key.starts_with("//") {
    return Some("key would be read back as a comment");
  }
  if kind == CacheEntryKind::Internal && key.ends_with(ADVANCED_SUFFIX) {
    return Some("key would be read back as an advanced marker");
  }
  if value.contains(['\n', '\r']) {
    return Some("value contains a line break");
  }
  None
}

/// Parse the contents of a cache file.
pub fn parse(content: &str, path: &Path) -> Result<BTreeMap<String, CacheEntry>, CacheError> {
  let mut entries = BTreeMap::new();
  let mut advanced = BTreeSet::new();
  let mut help: Vec<&str> = Vec::new();

  for (index, raw) in content.lines().enumerate() {
    let line = raw.trim_end_matches('\r');

    if line.trim().is_empty() || line.starts_with('#') {
      continue;
    }

    if let Some(comment) = line.strip_prefix("//") {
      help.push(comment.strip_prefix(' ').unwrap_or(comment));
      continue;
    }

    let def = parse_definition(line).ok_or_else(|| CacheError::Malformed {
      path: path.to_path_buf(),
      line: index + 1,
      content: line.to_string(),
    })?;

    if def.kind == CacheEntryKind::Internal
      && let Some(base) = def.key.strip_suffix(ADVANCED_SUFFIX)
    {
      if is_truthy(&def.value) {
        advanced.insert(base.to_string());
      }
      help.clear();
      continue;
    }

    let entry = CacheEntry {
      key: def.key.clone(),
      value: def.value,
      kind: def.kind,
      help: help.join("\n"),
      advanced: false,
    };
    help.clear();
    entries.insert(def.key, entry);
  }

  for key in advanced {
    if let Some(entry) = entries.get_mut(&key) {
      entry.advanced = true;
    }
  }

  Ok(entries)
}

/// Render entries (already in key order) to the file format.
pub fn render<'a>(entries: impl IntoIterator<Item = &'a CacheEntry>) -> String {
  let mut out = String::from(HEADER);

  for entry in entries {
    out.push('\n');
    if !entry.help.is_empty() {
      for line in entry.help.lines() {
        out.push_str("// ");
        out.push_str(line);
        out.push('\n');
      }
    }
    out.push_str(&format!("{}:{}={}\n", entry.key, entry.kind, entry.value));
    if entry.advanced {
      out.push_str(&format!(
        "{}{}:{}=1\n",
        entry.key,
        ADVANCED_SUFFIX,
        CacheEntryKind::Internal
      ));
    }
  }

  out
}
