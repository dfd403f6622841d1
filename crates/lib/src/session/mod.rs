//! Configuration sessions.
//!
//! A [`ConfigurationSession`] drives one configure/generate run and owns
//! everything the run touches: the cache, the selected generator and the
//! build graph.
//!
//! ```text
//! Uninitialized --initialize--> Configured --generate--> Generated
//!                                   |  register_projects     |  generate
//!                                   v                        v
//!                        (any error) Failed (terminal)
//! ```
//!
//! Calling an operation in the wrong state is reported as
//! [`SessionError::InvalidSessionState`] and leaves the state as it was. Every
//! other error moves the session to [`SessionState::Failed`].

mod types;

pub use types::{ErrorClass, SessionError, SessionOptions, SessionState, resource_root_from_env};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, error, info};

use crate::cache::{CacheEntryKind, CacheError, ConfigCache};
use crate::consts::{
  KEY_AR, KEY_BUILD_TYPE, KEY_CONFIGURATION_TYPES, KEY_GENERATOR, KEY_GENERATOR_PLATFORM, KEY_HOME_DIRECTORY,
  KEY_RESOURCE_ROOT, compiler_key, flags_key,
};
use crate::decl::ProjectDecl;
use crate::generator::{
  self, DEFAULT_ARCHIVER, DEFAULT_CONFIGURATIONS, GenerationContext, GenerationReport, Generator, LANGUAGES,
  default_compiler,
};
use crate::graph::{GraphBuilder, GraphModel};

pub struct ConfigurationSession {
  state: SessionState,
  options: SessionOptions,
  started: Instant,
  cache: ConfigCache,
  generator: Option<Box<dyn Generator>>,
  graph: Option<GraphModel>,
  source_dir: PathBuf,
  build_dir: PathBuf,
}

impl ConfigurationSession {
  pub fn new(options: SessionOptions) -> Self {
    Self {
      state: SessionState::Uninitialized,
      options,
      started: Instant::now(),
      cache: ConfigCache::new(),
      generator: None,
      graph: None,
      source_dir: PathBuf::new(),
      build_dir: PathBuf::new(),
    }
  }

  pub fn state(&self) -> SessionState {
    self.state
  }

  pub fn cache(&self) -> &ConfigCache {
    &self.cache
  }

  pub fn cache_mut(&mut self) -> &mut ConfigCache {
    &mut self.cache
  }

  /// The registered graph, once `register_projects` succeeded.
  pub fn graph(&self) -> Option<&GraphModel> {
    self.graph.as_ref()
  }

  pub fn generator_name(&self) -> Option<&'static str> {
    self.generator.as_ref().map(|g| g.name())
  }

  pub fn source_dir(&self) -> &Path {
    &self.source_dir
  }

  pub fn build_dir(&self) -> &Path {
    &self.build_dir
  }

  /// Validate directories, load the cache and select the generator.
  pub fn initialize(&mut self, generator: &str, source_dir: &Path, build_dir: &Path) -> Result<(), SessionError> {
    self.require("initialize", &[SessionState::Uninitialized])?;
    let result = self.try_initialize(generator, source_dir, build_dir);
    self.settle(result, SessionState::Configured)
  }

  fn try_initialize(&mut self, generator: &str, source_dir: &Path, build_dir: &Path) -> Result<(), SessionError> {
    self.check_timeout("initialize")?;

    let source_dir = validate_directory("source", source_dir)?;
    let resource_root = match &self.options.resource_root {
      Some(root) => Some(validate_directory("resource root", root)?),
      None => None,
    };

    fs::create_dir_all(build_dir).map_err(|source| SessionError::Io {
      path: build_dir.to_path_buf(),
      source,
    })?;
    let build_dir = dunce::canonicalize(build_dir).map_err(|source| SessionError::Io {
      path: build_dir.to_path_buf(),
      source,
    })?;

    self.options.progress.report("loading cache", 0.0);
    let mut cache = ConfigCache::load(&build_dir)?;
    let generator = generator::create(generator)?;
    debug!(entries = cache.len(), generator = generator.name(), "cache loaded");

    cache.add_entry(KEY_GENERATOR, generator.name(), "Name of generator.", CacheEntryKind::Internal)?;
    cache.add_entry(
      KEY_HOME_DIRECTORY,
      source_dir.as_path(),
      "Source directory with the top level project declarations.",
      CacheEntryKind::Internal,
    )?;
    cache.add_entry(
      KEY_GENERATOR_PLATFORM,
      self.options.generator_platform.clone().unwrap_or_default(),
      "Name of generator platform.",
      CacheEntryKind::Internal,
    )?;
    if let Some(root) = &resource_root {
      cache.add_entry(
        KEY_RESOURCE_ROOT,
        root.as_path(),
        "Directory of engine resources.",
        CacheEntryKind::Internal,
      )?;
    }
    seed_toolchain(&mut cache)?;
    self.options.progress.report("cache loaded", 1.0);

    info!(
      generator = generator.name(),
      source = %source_dir.display(),
      build = %build_dir.display(),
      "session configured"
    );

    self.cache = cache;
    self.generator = Some(generator);
    self.source_dir = source_dir;
    self.build_dir = build_dir;
    Ok(())
  }

  /// Validate declarations and build the graph. Allowed once per session.
  pub fn register_projects(&mut self, decls: &[ProjectDecl]) -> Result<(), SessionError> {
    self.require("register projects", &[SessionState::Configured])?;
    if self.graph.is_some() {
      return Err(SessionError::InvalidSessionState {
        operation: "register projects twice",
        state: self.state,
      });
    }

    let result = self.try_register(decls);
    self.settle(result, SessionState::Configured)
  }

  fn try_register(&mut self, decls: &[ProjectDecl]) -> Result<(), SessionError> {
    self.check_timeout("register_projects")?;
    self.options.progress.report("building graph", 0.0);
    let graph = GraphBuilder::build(decls)?;
    debug!(targets = graph.target_count(), warnings = graph.warnings().len(), "projects registered");
    self.options.progress.report("graph built", 1.0);
    self.graph = Some(graph);
    Ok(())
  }

  /// Emit the build files and save the cache. May be repeated.
  pub fn generate(&mut self) -> Result<GenerationReport, SessionError> {
    self.require("generate", &[SessionState::Configured, SessionState::Generated])?;
    let result = self.try_generate();
    self.settle(result, SessionState::Generated)
  }

  fn try_generate(&mut self) -> Result<GenerationReport, SessionError> {
    self.check_timeout("generate")?;

    let Some(generator) = self.generator.as_ref() else {
      return Err(SessionError::InvalidSessionState {
        operation: "generate",
        state: self.state,
      });
    };
    let empty = GraphModel::empty();
    let graph = self.graph.as_ref().unwrap_or(&empty);
    let ctx = GenerationContext::from_cache(&self.cache, &self.source_dir, &self.build_dir);

    let report = generator.generate(graph, &ctx, &self.options.progress)?;
    self.cache.save(&self.build_dir)?;
    Ok(report)
  }

  /// Persist the cache now.
  pub fn save_cache(&mut self) -> Result<(), SessionError> {
    self.require("save the cache", &[SessionState::Configured, SessionState::Generated])?;
    let result = self.cache.save(&self.build_dir).map_err(SessionError::from);
    let state = self.state;
    self.settle(result, state)
  }

  /// End the session, saving a dirty cache unless the session failed.
  pub fn close(mut self) -> Result<(), SessionError> {
    match self.state {
      SessionState::Configured | SessionState::Generated if self.cache.is_dirty() => {
        self.cache.save(&self.build_dir)?;
      }
      _ => {}
    }
    debug!(state = %self.state, "session closed");
    Ok(())
  }

  fn require(&self, operation: &'static str, allowed: &[SessionState]) -> Result<(), SessionError> {
    if allowed.contains(&self.state) {
      Ok(())
    } else {
      Err(SessionError::InvalidSessionState {
        operation,
        state: self.state,
      })
    }
  }

  /// Move to `next` on success, to `Failed` on error.
  fn settle<T>(&mut self, result: Result<T, SessionError>, next: SessionState) -> Result<T, SessionError> {
    match result {
      Ok(value) => {
        if self.state != next {
          info!(from = %self.state, to = %next, "session state changed");
        }
        self.state = next;
        Ok(value)
      }
      Err(err) => {
        error!(from = %self.state, "session failed: {}", err);
        self.state = SessionState::Failed;
        Err(err)
      }
    }
  }

  fn check_timeout(&self, phase: &'static str) -> Result<(), SessionError> {
    if let Some(timeout) = self.options.timeout {
      let elapsed = self.started.elapsed();
      if elapsed >= timeout {
        return Err(SessionError::Timeout { phase, elapsed });
      }
    }
    Ok(())
  }
}

/// Check that `path` is an existing, readable directory and canonicalize it.
fn validate_directory(role: &'static str, path: &Path) -> Result<PathBuf, SessionError> {
  let invalid = |reason: String| SessionError::InvalidDirectory {
    role,
    path: path.to_path_buf(),
    reason,
  };

  let metadata = fs::metadata(path).map_err(|e| invalid(e.to_string()))?;
  if !metadata.is_dir() {
    return Err(invalid("not a directory".to_string()));
  }
  fs::read_dir(path).map_err(|e| invalid(format!("not readable: {}", e)))?;
  dunce::canonicalize(path).map_err(|e| invalid(e.to_string()))
}

/// Toolchain defaults. Existing values, including user edits, are kept.
fn seed_toolchain(cache: &mut ConfigCache) -> Result<(), CacheError> {
  for language in LANGUAGES {
    let compiler = compiler_key(language);
    cache.ensure_entry(
      &compiler,
      default_compiler(language),
      &format!("{} compiler.", language),
      CacheEntryKind::Path,
    )?;
    cache.set_advanced(&compiler, true);
    cache.ensure_entry(
      &flags_key(language),
      "",
      &format!("Flags used by the {} compiler during all build types.", language),
      CacheEntryKind::String,
    )?;
  }
  cache.ensure_entry(KEY_AR, DEFAULT_ARCHIVER, "Path to the archiver.", CacheEntryKind::Path)?;
  cache.set_advanced(KEY_AR, true);
  cache.ensure_entry(
    KEY_BUILD_TYPE,
    "",
    "Build type for single-configuration generators (Debug, Release, ...).",
    CacheEntryKind::String,
  )?;
  cache.ensure_entry(
    KEY_CONFIGURATION_TYPES,
    DEFAULT_CONFIGURATIONS,
    "Configurations emitted by multi-configuration generators.",
    CacheEntryKind::String,
  )
}
