use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache::is_truthy;

/// Index of a target in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetId(pub usize);

/// Index of a project in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub usize);

/// The closed set of target kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetKind {
  Executable,
  StaticLibrary,
  SharedLibrary,
  ModuleLibrary,
  /// A prebuilt library known only by its `IMPORTED_LOCATION`.
  UnknownLibrary,
  /// Usage requirements only; nothing is built.
  InterfaceLibrary,
}

impl TargetKind {
  pub const ALL: [TargetKind; 6] = [
    TargetKind::Executable,
    TargetKind::StaticLibrary,
    TargetKind::SharedLibrary,
    TargetKind::ModuleLibrary,
    TargetKind::UnknownLibrary,
    TargetKind::InterfaceLibrary,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      TargetKind::Executable => "EXECUTABLE",
      TargetKind::StaticLibrary => "STATIC_LIBRARY",
      TargetKind::SharedLibrary => "SHARED_LIBRARY",
      TargetKind::ModuleLibrary => "MODULE_LIBRARY",
      TargetKind::UnknownLibrary => "UNKNOWN_LIBRARY",
      TargetKind::InterfaceLibrary => "INTERFACE_LIBRARY",
    }
  }

  /// Whether generators emit compile/link rules for this kind.
  pub fn has_rules(&self) -> bool {
    !matches!(self, TargetKind::UnknownLibrary | TargetKind::InterfaceLibrary)
  }

  /// Whether the produced artifact is linked into dependents.
  ///
  /// Module libraries are loaded at runtime and never linked.
  pub fn is_linkable(&self) -> bool {
    matches!(
      self,
      TargetKind::StaticLibrary | TargetKind::SharedLibrary | TargetKind::UnknownLibrary
    )
  }

  /// Whether this kind forwards its own dependencies to whoever links it.
  pub fn forwards_dependencies(&self) -> bool {
    matches!(self, TargetKind::StaticLibrary | TargetKind::InterfaceLibrary)
  }

  /// Whether objects must be position independent.
  pub fn needs_pic(&self) -> bool {
    matches!(self, TargetKind::SharedLibrary | TargetKind::ModuleLibrary)
  }

  /// Default `(prefix, suffix)` of the produced artifact.
  pub fn artifact_affixes(&self) -> (&'static str, &'static str) {
    match self {
      TargetKind::Executable => ("", ""),
      TargetKind::StaticLibrary => ("lib", ".a"),
      TargetKind::SharedLibrary => ("lib", ".so"),
      TargetKind::ModuleLibrary => ("", ".so"),
      TargetKind::UnknownLibrary | TargetKind::InterfaceLibrary => ("", ""),
    }
  }
}

impl fmt::Display for TargetKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for TargetKind {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    TargetKind::ALL.into_iter().find(|kind| kind.as_str() == s).ok_or(())
  }
}

/// A validated project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
  pub id: ProjectId,
  pub name: String,
  pub languages: Vec<String>,
  /// Targets of this project in declaration order.
  pub targets: Vec<TargetId>,
}

impl Project {
  pub fn enables(&self, language: &str) -> bool {
    self.languages.iter().any(|l| l == language)
  }
}

/// A validated target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
  pub id: TargetId,
  pub project: ProjectId,
  pub name: String,
  pub kind: TargetKind,
  pub sources: Vec<PathBuf>,
  pub properties: BTreeMap<String, String>,
  /// Direct dependencies in declaration order.
  pub dependencies: Vec<TargetId>,
}

impl Target {
  pub fn property(&self, name: &str) -> Option<&str> {
    self.properties.get(name).map(String::as_str)
  }

  /// A `;`-separated list property, empty items dropped.
  pub fn property_list(&self, name: &str) -> Vec<&str> {
    self
      .property(name)
      .map(|v| v.split(';').map(str::trim).filter(|s| !s.is_empty()).collect())
      .unwrap_or_default()
  }

  pub fn excluded_from_all(&self) -> bool {
    self.property("EXCLUDE_FROM_ALL").map(is_truthy).unwrap_or(false)
  }

  /// Base name of the artifact, before prefix and suffix.
  pub fn output_name(&self) -> &str {
    self.property("OUTPUT_NAME").unwrap_or(&self.name)
  }

  /// File name of the produced artifact, e.g. `libcore.so`.
  pub fn artifact_name(&self) -> String {
    let (prefix, suffix) = self.kind.artifact_affixes();
    format!(
      "{}{}{}",
      self.property("PREFIX").unwrap_or(prefix),
      self.output_name(),
      self.property("SUFFIX").unwrap_or(suffix)
    )
  }

  /// Location of a prebuilt library.
  pub fn imported_location(&self) -> Option<&str> {
    self.property("IMPORTED_LOCATION").filter(|s| !s.is_empty())
  }
}

/// An unrecognized property found while building the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyWarning {
  pub target: String,
  pub kind: TargetKind,
  pub property: String,
}

impl fmt::Display for PropertyWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "unknown property '{}' on {} target '{}'",
      self.property, self.kind, self.target
    )
  }
}
