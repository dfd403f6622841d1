//! Implementation of the `bgen generate` command.
//!
//! Rebuilds the session a previous `bgen configure` left behind, using only
//! what the cache recorded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail};

use buildgen_lib::cache::ConfigCache;
use buildgen_lib::consts::{
  DEFAULT_PROJECTS_FILENAME, KEY_GENERATOR, KEY_GENERATOR_PLATFORM, KEY_HOME_DIRECTORY, KEY_PROJECTS_FILE,
  KEY_RESOURCE_ROOT,
};
use buildgen_lib::session::{SessionOptions, resource_root_from_env};

use super::{Run, load_cache, run_session};

fn recorded(cache: &ConfigCache, key: &str) -> Option<String> {
  cache.value(key).filter(|v| !v.is_empty()).map(str::to_string)
}

pub fn cmd_generate(build_dir: &Path, timeout: Option<Duration>) -> Result<()> {
  let cache = load_cache(build_dir)?;

  let (Some(generator), Some(home)) = (recorded(&cache, KEY_GENERATOR), recorded(&cache, KEY_HOME_DIRECTORY)) else {
    bail!(
      "{} is not configured (missing {} or {}); run 'bgen configure' first",
      build_dir.display(),
      KEY_GENERATOR,
      KEY_HOME_DIRECTORY
    );
  };

  let projects = recorded(&cache, KEY_PROJECTS_FILE)
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from(DEFAULT_PROJECTS_FILENAME));

  let options = SessionOptions {
    resource_root: recorded(&cache, KEY_RESOURCE_ROOT)
      .map(PathBuf::from)
      .or_else(resource_root_from_env),
    generator_platform: recorded(&cache, KEY_GENERATOR_PLATFORM),
    timeout,
    ..SessionOptions::default()
  };

  run_session(Run {
    generator: &generator,
    source_dir: Path::new(&home),
    build_dir,
    projects: &projects,
    definitions: &[],
    options,
  })
}
