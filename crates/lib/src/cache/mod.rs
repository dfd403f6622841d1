//! Persistent configuration cache.
//!
//! The cache maps keys to typed values and lives in the build directory as
//! `BuildCache.txt`. It survives regenerations: the engine seeds internal
//! entries (generator name, home directory), users override toolchain
//! defaults, and the generators read both.
//!
//! # Storage Layout
//!
//! ```text
//! {build_dir}/
//! └── BuildCache.txt      # one KEY:KIND=VALUE entry per line
//! ```
//!
//! Saves are atomic (temp file + rename) so a crash mid-write leaves the
//! previous cache intact.

mod format;
mod types;

pub use format::{Definition, parse_definition};
pub use types::{CacheEntry, CacheEntryKind, CacheError, CacheValue, is_truthy};

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::consts::CACHE_FILENAME;
use crate::util::fs::atomic_write;

/// Location of the cache file for a build directory.
pub fn cache_path(build_dir: &Path) -> PathBuf {
  build_dir.join(CACHE_FILENAME)
}

/// In-memory view of a build directory's cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigCache {
  entries: BTreeMap<String, CacheEntry>,
  dirty: bool,
}

impl ConfigCache {
  /// Create an empty cache.
  pub fn new() -> Self {
    Self::default()
  }

  /// Load the cache stored in `build_dir`.
  ///
  /// Returns an empty cache if the file doesn't exist.
  pub fn load(build_dir: &Path) -> Result<Self, CacheError> {
    let path = cache_path(build_dir);

    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no cache file, starting empty");
        return Ok(Self::new());
      }
      Err(source) => return Err(CacheError::Read { path, source }),
    };

    let entries = format::parse(&content, &path)?;
    debug!(path = %path.display(), entries = entries.len(), "cache loaded");

    Ok(Self { entries, dirty: false })
  }

  /// Insert or update an entry.
  ///
  /// An existing STATIC entry keeps its value; the call still succeeds.
  /// Keys and values that could not be written back as one line are rejected
  /// with [`CacheError::InvalidEntry`].
  pub fn add_entry(
    &mut self,
    key: &str,
    value: impl Into<CacheValue>,
    help: &str,
    kind: CacheEntryKind,
  ) -> Result<(), CacheError> {
    let value = value.into().0;
    if let Some(reason) = format::unrepresentable(key, &value, kind) {
      return Err(CacheError::InvalidEntry {
        key: key.to_string(),
        reason,
      });
    }

    match self.entries.get_mut(key) {
      Some(existing) if existing.kind == CacheEntryKind::Static => {
        if existing.value != value {
          debug!(key, "ignoring update of static cache entry");
        }
      }
      Some(existing) => {
        if existing.value != value || existing.kind != kind || existing.help != help {
          existing.value = value;
          existing.kind = kind;
          existing.help = help.to_string();
          self.dirty = true;
        }
      }
      None => {
        self.entries.insert(key.to_string(), CacheEntry::new(key, value, help, kind));
        self.dirty = true;
      }
    }
    Ok(())
  }

  /// Insert an entry only if the key is not present yet.
  ///
  /// Used for defaults that users are expected to override.
  pub fn ensure_entry(
    &mut self,
    key: &str,
    value: impl Into<CacheValue>,
    help: &str,
    kind: CacheEntryKind,
  ) -> Result<(), CacheError> {
    if self.entries.contains_key(key) {
      return Ok(());
    }
    self.add_entry(key, value, help, kind)
  }

  pub fn get(&self, key: &str) -> Option<&CacheEntry> {
    self.entries.get(key)
  }

  /// The textual value of `key`, if present.
  pub fn value(&self, key: &str) -> Option<&str> {
    self.entries.get(key).map(|e| e.value.as_str())
  }

  /// Delete an entry. No-op if absent.
  pub fn remove(&mut self, key: &str) {
    if self.entries.remove(key).is_some() {
      self.dirty = true;
    }
  }

  /// Delete every entry.
  pub fn clear(&mut self) {
    if !self.entries.is_empty() {
      self.entries.clear();
      self.dirty = true;
    }
  }

  /// Mark an entry as advanced (hidden from the default listing).
  ///
  /// Returns `false` if the key does not exist.
  pub fn set_advanced(&mut self, key: &str, advanced: bool) -> bool {
    match self.entries.get_mut(key) {
      Some(entry) => {
        if entry.advanced != advanced {
          entry.advanced = advanced;
          self.dirty = true;
        }
        true
      }
      None => false,
    }
  }

  /// Entries sorted by key.
  pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
    self.entries.values()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Whether there are changes not yet written by [`save`](Self::save).
  pub fn is_dirty(&self) -> bool {
    self.dirty
  }

  /// Serialized form of the cache, exactly as [`save`](Self::save) writes it.
  pub fn render(&self) -> String {
    format::render(self.entries.values())
  }

  /// Write the cache to `build_dir`.
  ///
  /// The write is atomic and is retried once before the error is returned.
  pub fn save(&mut self, build_dir: &Path) -> Result<(), CacheError> {
    let path = cache_path(build_dir);
    let content = self.render();

    if let Err(first) = atomic_write(&path, content.as_bytes()) {
      warn!(path = %path.display(), error = %first, "cache write failed, retrying once");
      atomic_write(&path, content.as_bytes()).map_err(|source| CacheError::Write {
        path: path.clone(),
        source,
      })?;
    }

    debug!(path = %path.display(), entries = self.entries.len(), "cache saved");
    self.dirty = false;
    Ok(())
  }
}
