//! Project and target declarations.
//!
//! These are the plain data handed over by whatever front end describes the
//! build. Nothing here is validated: [`GraphBuilder`](crate::graph::GraphBuilder)
//! turns a list of declarations into a checked [`GraphModel`](crate::graph::GraphModel).
//!
//! # Example
//!
//! ```json
//! [
//!   {
//!     "name": "Demo",
//!     "languages": ["C", "CXX"],
//!     "targets": [
//!       { "name": "core", "kind": "SHARED_LIBRARY", "sources": ["a.c"] },
//!       { "name": "app", "kind": "EXECUTABLE", "sources": ["main.c"], "dependencies": ["core"] }
//!     ]
//!   }
//! ]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_languages() -> Vec<String> {
  vec!["C".to_string(), "CXX".to_string()]
}

/// A project and the targets it declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDecl {
  pub name: String,
  #[serde(default = "default_languages")]
  pub languages: Vec<String>,
  #[serde(default)]
  pub targets: Vec<TargetDecl>,
}

impl ProjectDecl {
  pub fn new(name: &str, languages: &[&str]) -> Self {
    Self {
      name: name.to_string(),
      languages: languages.iter().map(|l| l.to_string()).collect(),
      targets: Vec::new(),
    }
  }

  pub fn with_target(mut self, target: TargetDecl) -> Self {
    self.targets.push(target);
    self
  }
}

/// A buildable unit as declared by the front end.
///
/// `kind` stays textual so that unknown kinds can be reported with the
/// offending spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDecl {
  pub name: String,
  pub kind: String,
  #[serde(default)]
  pub sources: Vec<PathBuf>,
  #[serde(default)]
  pub properties: BTreeMap<String, String>,
  #[serde(default)]
  pub dependencies: Vec<String>,
}

impl TargetDecl {
  pub fn new(name: &str, kind: &str) -> Self {
    Self {
      name: name.to_string(),
      kind: kind.to_string(),
      sources: Vec::new(),
      properties: BTreeMap::new(),
      dependencies: Vec::new(),
    }
  }

  pub fn with_sources(mut self, sources: &[&str]) -> Self {
    self.sources.extend(sources.iter().map(PathBuf::from));
    self
  }

  pub fn with_property(mut self, name: &str, value: &str) -> Self {
    self.properties.insert(name.to_string(), value.to_string());
    self
  }

  pub fn depends_on(mut self, target: &str) -> Self {
    self.dependencies.push(target.to_string());
    self
  }
}

#[derive(Debug, Error)]
pub enum DeclError {
  #[error("failed to read declarations {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse declarations {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// Read a JSON list of project declarations.
pub fn load_declarations(path: &Path) -> Result<Vec<ProjectDecl>, DeclError> {
  let content = fs::read_to_string(path).map_err(|source| DeclError::Read {
    path: path.to_path_buf(),
    source,
  })?;

  serde_json::from_str(&content).map_err(|source| DeclError::Parse {
    path: path.to_path_buf(),
    source,
  })
}
