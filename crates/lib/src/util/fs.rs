//! Atomic file writes.
//!
//! Content goes to a temporary file in the destination directory first and is
//! then renamed over the target, so readers never observe a half-written file.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::trace;

use super::hash::{hash_bytes, hash_file};

/// Write `content` to `path` atomically, creating parent directories as needed.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
  let parent = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };
  fs::create_dir_all(parent)?;

  let mut temp = NamedTempFile::new_in(parent)?;
  temp.write_all(content)?;
  temp.as_file().sync_all()?;
  temp.persist(path).map_err(|e| e.error)?;

  trace!(path = %path.display(), bytes = content.len(), "atomic write");
  Ok(())
}

/// Write `content` to `path` only if it differs from what is already there.
///
/// Returns `true` when the file was (re)written.
pub fn write_if_changed(path: &Path, content: &[u8]) -> io::Result<bool> {
  let hash = hash_bytes(content);
  if let Some(existing) = hash_file(path)?
    && existing == hash
  {
    trace!(path = %path.display(), hash = hash.short(), "content unchanged");
    return Ok(false);
  }

  atomic_write(path, content)?;
  Ok(true)
}
