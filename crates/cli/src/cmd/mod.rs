mod cache;
mod configure;
mod generate;
mod info;

pub use cache::{CacheAction, cmd_cache};
pub use configure::{ConfigureOptions, cmd_configure};
pub use generate::cmd_generate;
pub use info::cmd_info;

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::debug;

use buildgen_lib::cache::{CacheEntryKind, CacheError, ConfigCache, Definition};
use buildgen_lib::consts::KEY_PROJECTS_FILE;
use buildgen_lib::decl::load_declarations;
use buildgen_lib::progress::Progress;
use buildgen_lib::session::{ConfigurationSession, SessionError, SessionOptions};

use crate::output::{Status, generation_summary, status};

/// Everything needed to run one configure-and-generate pass.
pub(crate) struct Run<'a> {
  pub generator: &'a str,
  pub source_dir: &'a Path,
  pub build_dir: &'a Path,
  /// Declarations file; resolved against the canonical source directory when relative.
  pub projects: &'a Path,
  pub definitions: &'a [Definition],
  pub options: SessionOptions,
}

/// Initialize a session, apply definitions, register and generate.
pub(crate) fn run_session(run: Run<'_>) -> Result<()> {
  let start = Instant::now();
  let mut options = run.options;
  options.progress = Progress::new(|message, fraction| debug!(fraction, "{}", message));

  let mut session = ConfigurationSession::new(options);
  session
    .initialize(run.generator, run.source_dir, run.build_dir)
    .with_context(|| format!("Failed to configure {}", run.build_dir.display()))?;

  for definition in run.definitions {
    apply_definition(session.cache_mut(), definition).map_err(SessionError::from)?;
  }

  let projects = session.source_dir().join(run.projects);
  let decls = load_declarations(&projects)?;
  let projects = dunce::canonicalize(&projects).unwrap_or(projects);
  session
    .cache_mut()
    .add_entry(KEY_PROJECTS_FILE, projects.as_path(), "Project declarations file.", CacheEntryKind::Internal)
    .map_err(SessionError::from)?;

  session
    .register_projects(&decls)
    .with_context(|| format!("Invalid declarations in {}", projects.display()))?;
  if let Some(graph) = session.graph() {
    for warning in graph.warnings() {
      status(Status::Warning, &warning.to_string());
    }
  }

  let report = session.generate().context("Generation failed")?;
  let generator = session.generator_name().unwrap_or(run.generator).to_string();
  let build_dir = session.build_dir().to_path_buf();
  session.close().context("Failed to close session")?;

  generation_summary(&generator, &build_dir, &report, start.elapsed());
  Ok(())
}

/// Store a `-D` definition. Without an explicit kind an existing entry keeps its kind and help.
pub(crate) fn apply_definition(cache: &mut ConfigCache, definition: &Definition) -> Result<(), CacheError> {
  let (kind, help) = match cache.get(&definition.key) {
    Some(existing) if definition.kind == CacheEntryKind::Uninitialized => (existing.kind, existing.help.clone()),
    Some(existing) => (definition.kind, existing.help.clone()),
    None => (definition.kind, String::new()),
  };
  cache.add_entry(&definition.key, definition.value.as_str(), &help, kind)
}

/// Load the cache of an existing build directory.
pub(crate) fn load_cache(build_dir: &Path) -> Result<ConfigCache> {
  if !build_dir.is_dir() {
    return Err(SessionError::InvalidDirectory {
      role: "build",
      path: build_dir.to_path_buf(),
      reason: "not a directory".to_string(),
    }
    .into());
  }
  let cache = ConfigCache::load(build_dir).map_err(SessionError::from)?;
  Ok(cache)
}
