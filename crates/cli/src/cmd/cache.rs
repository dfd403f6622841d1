//! Implementation of the `bgen cache` commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Subcommand;

use buildgen_lib::cache::{CacheEntry, CacheEntryKind, CacheError, ConfigCache, parse_definition};
use buildgen_lib::session::SessionError;

use super::{apply_definition, load_cache};
use crate::output::{OutputFormat, Status, print_json, status};

#[derive(Subcommand)]
pub enum CacheAction {
  /// List cache entries
  List {
    build_dir: PathBuf,

    /// Include advanced and internal entries
    #[arg(short, long)]
    all: bool,

    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Print one entry
  Get {
    build_dir: PathBuf,
    key: String,

    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Create or update an entry
  Set {
    build_dir: PathBuf,

    #[arg(value_name = "KEY[:KIND]=VALUE")]
    definition: String,
  },

  /// Remove an entry
  Unset { build_dir: PathBuf, key: String },
}

pub fn cmd_cache(action: CacheAction) -> Result<()> {
  match action {
    CacheAction::List { build_dir, all, output } => list(&build_dir, all, output),
    CacheAction::Get { build_dir, key, output } => get(&build_dir, &key, output),
    CacheAction::Set { build_dir, definition } => set(&build_dir, &definition),
    CacheAction::Unset { build_dir, key } => unset(&build_dir, &key),
  }
}

fn visible(entry: &CacheEntry, all: bool) -> bool {
  all || !(entry.advanced || entry.kind == CacheEntryKind::Internal)
}

fn line(entry: &CacheEntry) -> String {
  format!("{}:{}={}", entry.key, entry.kind, entry.value)
}

fn list(build_dir: &Path, all: bool, output: OutputFormat) -> Result<()> {
  let cache = load_cache(build_dir)?;
  let entries: Vec<&CacheEntry> = cache.entries().filter(|e| visible(e, all)).collect();

  if output.is_json() {
    return print_json(&entries);
  }

  if entries.is_empty() {
    status(Status::Note, "No cache entries");
    return Ok(());
  }
  for entry in entries {
    println!("{}", line(entry));
  }
  Ok(())
}

fn get(build_dir: &Path, key: &str, output: OutputFormat) -> Result<()> {
  let cache = load_cache(build_dir)?;
  let entry = cache
    .get(key)
    .ok_or_else(|| anyhow!("No cache entry '{}' in {}", key, build_dir.display()))?;

  if output.is_json() {
    print_json(entry)
  } else {
    println!("{}", entry.value);
    Ok(())
  }
}

fn set(build_dir: &Path, raw: &str) -> Result<()> {
  let definition = parse_definition(raw).ok_or_else(|| CacheError::InvalidDefinition(raw.to_string()))?;
  let mut cache = load_cache(build_dir)?;

  apply_definition(&mut cache, &definition).map_err(SessionError::from)?;
  if !cache.is_dirty() {
    status(Status::Note, &format!("{} unchanged", definition.key));
    return Ok(());
  }
  cache
    .save(build_dir)
    .with_context(|| format!("Failed to update cache in {}", build_dir.display()))?;

  status(Status::Done, &format!("Set {}", line_for(&cache, &definition.key)));
  Ok(())
}

fn line_for(cache: &ConfigCache, key: &str) -> String {
  cache.get(key).map(line).unwrap_or_else(|| key.to_string())
}

fn unset(build_dir: &Path, key: &str) -> Result<()> {
  let mut cache = load_cache(build_dir)?;
  if cache.get(key).is_none() {
    status(Status::Note, &format!("No cache entry '{}'", key));
    return Ok(());
  }

  cache.remove(key);
  cache
    .save(build_dir)
    .with_context(|| format!("Failed to update cache in {}", build_dir.display()))?;
  status(Status::Done, &format!("Removed {}", key));
  Ok(())
}
