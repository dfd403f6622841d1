use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The type tag stored with every cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheEntryKind {
  Bool,
  Path,
  String,
  /// Engine bookkeeping, hidden from users.
  Internal,
  /// Immutable once set.
  Static,
  /// Set from the command line without a type.
  Uninitialized,
}

impl CacheEntryKind {
  pub const ALL: [CacheEntryKind; 6] = [
    CacheEntryKind::Bool,
    CacheEntryKind::Path,
    CacheEntryKind::String,
    CacheEntryKind::Internal,
    CacheEntryKind::Static,
    CacheEntryKind::Uninitialized,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      CacheEntryKind::Bool => "BOOL",
      CacheEntryKind::Path => "PATH",
      CacheEntryKind::String => "STRING",
      CacheEntryKind::Internal => "INTERNAL",
      CacheEntryKind::Static => "STATIC",
      CacheEntryKind::Uninitialized => "UNINITIALIZED",
    }
  }
}

impl fmt::Display for CacheEntryKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for CacheEntryKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    CacheEntryKind::ALL
      .into_iter()
      .find(|kind| kind.as_str() == s)
      .ok_or_else(|| format!("unknown cache entry kind '{}'", s))
  }
}

/// Textual value handed to [`ConfigCache::add_entry`](super::ConfigCache::add_entry).
///
/// Values are persisted as text; the conversions here fix the spelling used
/// for booleans and paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheValue(pub String);

impl From<&str> for CacheValue {
  fn from(value: &str) -> Self {
    CacheValue(value.to_string())
  }
}

impl From<String> for CacheValue {
  fn from(value: String) -> Self {
    CacheValue(value)
  }
}

impl From<bool> for CacheValue {
  fn from(value: bool) -> Self {
    CacheValue(if value { "ON" } else { "OFF" }.to_string())
  }
}

impl From<&Path> for CacheValue {
  fn from(value: &Path) -> Self {
    CacheValue(value.to_string_lossy().into_owned())
  }
}

impl From<PathBuf> for CacheValue {
  fn from(value: PathBuf) -> Self {
    CacheValue::from(value.as_path())
  }
}

/// A single persisted configuration variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
  pub key: String,
  pub value: String,
  pub kind: CacheEntryKind,
  pub help: String,
  pub advanced: bool,
}

impl CacheEntry {
  pub fn new(key: &str, value: impl Into<CacheValue>, help: &str, kind: CacheEntryKind) -> Self {
    Self {
      key: key.to_string(),
      value: value.into().0,
      kind,
      help: help.to_string(),
      advanced: false,
    }
  }

  /// Interpret the value as a boolean.
  pub fn as_bool(&self) -> bool {
    is_truthy(&self.value)
  }

  /// Interpret the value as a filesystem path.
  pub fn as_path(&self) -> &Path {
    Path::new(&self.value)
  }
}

/// Truthiness of a configuration value.
///
/// `ON`, `YES`, `TRUE`, `Y` and non-zero integers are true. `OFF`, `NO`,
/// `FALSE`, `N`, `IGNORE`, `NOTFOUND`, the empty string and anything ending in
/// `-NOTFOUND` are false, as is any other text.
pub fn is_truthy(value: &str) -> bool {
  let upper = value.trim().to_ascii_uppercase();
  match upper.as_str() {
    "ON" | "YES" | "TRUE" | "Y" => true,
    "" | "OFF" | "NO" | "FALSE" | "N" | "IGNORE" | "NOTFOUND" => false,
    other if other.ends_with("-NOTFOUND") => false,
    other => other.parse::<i64>().map(|n| n != 0).unwrap_or(false),
  }
}

/// Errors from loading, parsing or persisting the cache.
#[derive(Debug, Error)]
pub enum CacheError {
  #[error("failed to read cache file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("malformed cache entry at {path}:{line}: {content}")]
  Malformed { path: PathBuf, line: usize, content: String },

  #[error("failed to write cache file {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("cannot store cache entry '{key}': {reason}")]
  InvalidEntry { key: String, reason: &'static str },

  #[error("invalid cache definition '{0}': expected KEY[:KIND]=VALUE")]
  InvalidDefinition(String),
}
