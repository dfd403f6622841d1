use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::cache::CacheError;
use crate::consts::RESOURCE_ROOT_ENV;
use crate::generator::GenerateError;
use crate::graph::GraphError;
use crate::progress::Progress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
  Uninitialized,
  Configured,
  Generated,
  /// Terminal: every further operation is rejected.
  Failed,
}

impl fmt::Display for SessionState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      SessionState::Uninitialized => "uninitialized",
      SessionState::Configured => "configured",
      SessionState::Generated => "generated",
      SessionState::Failed => "failed",
    };
    f.write_str(name)
  }
}

/// Caller-supplied settings for a session.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
  /// Directory of engine resources. Validated like the source directory.
  pub resource_root: Option<PathBuf>,
  pub generator_platform: Option<String>,
  /// Budget for the whole session, checked when each phase starts.
  pub timeout: Option<Duration>,
  pub progress: Progress,
}

impl SessionOptions {
  /// Options with the resource root taken from `BGEN_RESOURCE_ROOT`.
  pub fn from_env() -> Self {
    Self {
      resource_root: resource_root_from_env(),
      ..Self::default()
    }
  }
}

pub fn resource_root_from_env() -> Option<PathBuf> {
  std::env::var_os(RESOURCE_ROOT_ENV)
    .filter(|v| !v.is_empty())
    .map(PathBuf::from)
}

/// Broad failure categories, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
  InvalidDirectory,
  Io,
  DuplicateTarget,
  UnknownTargetKind,
  CyclicDependency,
  UnknownGenerator,
  UnsupportedTargetKind,
  InvalidSessionState,
  Timeout,
  UnknownDependency,
  InvalidTargetName,
}

impl ErrorClass {
  /// Process exit code used by the command-line front end.
  pub fn exit_code(&self) -> i32 {
    match self {
      ErrorClass::InvalidDirectory => 2,
      ErrorClass::Io => 3,
      ErrorClass::DuplicateTarget => 4,
      ErrorClass::UnknownTargetKind => 5,
      ErrorClass::CyclicDependency => 6,
      ErrorClass::UnknownGenerator => 7,
      ErrorClass::UnsupportedTargetKind => 8,
      ErrorClass::InvalidSessionState => 9,
      ErrorClass::Timeout => 10,
      ErrorClass::UnknownDependency => 11,
      ErrorClass::InvalidTargetName => 12,
    }
  }
}

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("invalid {role} directory {path}: {reason}")]
  InvalidDirectory {
    role: &'static str,
    path: PathBuf,
    reason: String,
  },

  #[error("failed to prepare {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Cache(#[from] CacheError),

  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error(transparent)]
  Generate(#[from] GenerateError),

  #[error("cannot {operation} while the session is {state}")]
  InvalidSessionState {
    operation: &'static str,
    state: SessionState,
  },

  #[error("timed out before {phase} after {elapsed:?}")]
  Timeout { phase: &'static str, elapsed: Duration },
}

impl SessionError {
  pub fn class(&self) -> ErrorClass {
    match self {
      SessionError::InvalidDirectory { .. } => ErrorClass::InvalidDirectory,
      SessionError::Io { .. } | SessionError::Cache(_) => ErrorClass::Io,
      SessionError::Graph(err) => match err {
        GraphError::DuplicateProject { .. } | GraphError::DuplicateTarget { .. } => ErrorClass::DuplicateTarget,
        GraphError::UnknownTargetKind { .. } => ErrorClass::UnknownTargetKind,
        GraphError::InvalidTargetName { .. } => ErrorClass::InvalidTargetName,
        GraphError::UnknownDependency { .. } => ErrorClass::UnknownDependency,
        GraphError::CyclicDependency { .. } => ErrorClass::CyclicDependency,
      },
      SessionError::Generate(err) => match err {
        GenerateError::UnknownGenerator { .. } => ErrorClass::UnknownGenerator,
        GenerateError::UnsupportedTargetKind { .. } => ErrorClass::UnsupportedTargetKind,
        GenerateError::NameClash { .. } => ErrorClass::DuplicateTarget,
        GenerateError::Write { .. } => ErrorClass::Io,
      },
      SessionError::InvalidSessionState { .. } => ErrorClass::InvalidSessionState,
      SessionError::Timeout { .. } => ErrorClass::Timeout,
    }
  }
}
