//! Implementation of the `bgen configure` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use buildgen_lib::cache::{CacheError, parse_definition};
use buildgen_lib::consts::DEFAULT_PROJECTS_FILENAME;
use buildgen_lib::session::{SessionOptions, resource_root_from_env};

use super::{Run, run_session};

pub struct ConfigureOptions {
  pub generator: String,
  pub source_dir: PathBuf,
  pub build_dir: PathBuf,
  pub projects: Option<PathBuf>,
  /// Raw `KEY[:KIND]=VALUE` strings.
  pub definitions: Vec<String>,
  pub resource_root: Option<PathBuf>,
  pub platform: Option<String>,
  pub timeout: Option<Duration>,
}

/// Execute the configure command.
///
/// Definitions are validated before anything touches the build directory.
/// The declarations file is recorded in the cache so that `bgen generate`
/// can rerun without arguments.
pub fn cmd_configure(opts: ConfigureOptions) -> Result<()> {
  let definitions = opts
    .definitions
    .iter()
    .map(|raw| parse_definition(raw).ok_or_else(|| CacheError::InvalidDefinition(raw.clone())))
    .collect::<Result<Vec<_>, _>>()?;

  let projects = match opts.projects {
    Some(path) => dunce::canonicalize(&path)
      .with_context(|| format!("Declarations file not found: {}", path.display()))?,
    None => PathBuf::from(DEFAULT_PROJECTS_FILENAME),
  };

  let options = SessionOptions {
    resource_root: opts.resource_root.or_else(resource_root_from_env),
    generator_platform: opts.platform,
    timeout: opts.timeout,
    ..SessionOptions::default()
  };

  run_session(Run {
    generator: &opts.generator,
    source_dir: &opts.source_dir,
    build_dir: &opts.build_dir,
    projects: &projects,
    definitions: &definitions,
    options,
  })
}
