//! Per-target build facts shared by every dialect.
//!
//! A [`TargetPlan`] is everything a generator needs to emit one target: its
//! objects, compile flags per language, the link line and what must be built
//! first. Planning also performs the checks that make a target unemittable, so
//! a generator that plans every target before writing anything never leaves a
//! half-generated tree behind.

use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};

use super::GenerateError;
use super::context::{GenerationContext, configuration_flags};
use crate::graph::{GraphModel, Target, TargetId, TargetKind};

/// Language of a source file from its extension, if it is compiled at all.
pub fn source_language(path: &Path) -> Option<&'static str> {
  match path.extension()?.to_str()? {
    "c" => Some("C"),
    "cc" | "cpp" | "cxx" | "c++" | "C" => Some("CXX"),
    _ => None,
  }
}

/// Whether `target` compiles any source of `language`.
pub fn compiles_language(graph: &GraphModel, target: &Target, language: &str) -> bool {
  graph.project(target.project).enables(language)
    && target.sources.iter().any(|s| source_language(s) == Some(language))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectFile {
  /// Absolute path of the source.
  pub source: PathBuf,
  /// Object path relative to the build directory, `/`-separated.
  pub object: String,
  pub language: &'static str,
}

/// A target that is built by the generated scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTarget {
  pub name: String,
  pub artifact: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkItem {
  Built(BuiltTarget),
  /// Path of a prebuilt library.
  Imported(String),
}

impl LinkItem {
  /// The text that goes on a link line.
  pub fn path(&self) -> &str {
    match self {
      LinkItem::Built(built) => &built.artifact,
      LinkItem::Imported(path) => path,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPlan {
  pub id: TargetId,
  pub name: String,
  pub project: String,
  pub kind: TargetKind,
  /// Artifact path relative to the build directory.
  pub artifact: String,
  /// Directory holding this target's objects.
  pub object_dir: String,
  pub objects: Vec<ObjectFile>,
  /// Full compile flags for each language with objects.
  pub compile_flags: BTreeMap<&'static str, Vec<String>>,
  pub linker_language: String,
  pub link_flags: Vec<String>,
  /// Libraries on the link line, in order. Empty for static libraries.
  pub link_libraries: Vec<LinkItem>,
  /// Built targets that must exist first without being linked.
  pub prerequisites: Vec<BuiltTarget>,
  pub in_all: bool,
}

impl TargetPlan {
  /// Built targets on the link line.
  pub fn linked_targets(&self) -> impl Iterator<Item = &BuiltTarget> {
    self.link_libraries.iter().filter_map(|item| match item {
      LinkItem::Built(built) => Some(built),
      LinkItem::Imported(_) => None,
    })
  }

  /// Languages with at least one object, in sorted order.
  pub fn languages(&self) -> Vec<&'static str> {
    self.compile_flags.keys().copied().collect()
  }

  pub fn objects_of(&self, language: &str) -> impl Iterator<Item = &ObjectFile> {
    self.objects.iter().filter(move |o| o.language == language)
  }

  /// Whether a phony alias named after the target would collide with its artifact.
  pub fn alias_collides(&self) -> bool {
    self.name == self.artifact
  }
}

/// Targets in generation order: projects in declaration order, each
/// project's targets in topological order.
pub fn traversal(graph: &GraphModel) -> Vec<TargetId> {
  graph.projects().iter().flat_map(|p| graph.project_order(p.id)).collect()
}

/// Plan every emitted target in traversal order.
///
/// Interface libraries and imported libraries produce no plan. An unknown
/// library without `IMPORTED_LOCATION` is reported as unsupported.
pub fn plan_targets(
  graph: &GraphModel,
  ctx: &GenerationContext,
  generator: &str,
  configuration: Option<&str>,
) -> Result<Vec<TargetPlan>, GenerateError> {
  let mut plans = Vec::new();
  for id in traversal(graph) {
    let target = graph.target(id);
    match target.kind {
      TargetKind::InterfaceLibrary => continue,
      TargetKind::UnknownLibrary => {
        require_imported(target, generator)?;
        continue;
      }
      _ => plans.push(plan_target(graph, ctx, target, generator, configuration)?),
    }
  }
  Ok(plans)
}

fn require_imported<'a>(target: &'a Target, generator: &str) -> Result<&'a str, GenerateError> {
  target
    .imported_location()
    .ok_or_else(|| GenerateError::UnsupportedTargetKind {
      generator: generator.to_string(),
      target: target.name.clone(),
      kind: target.kind,
    })
}

fn built(target: &Target) -> BuiltTarget {
  BuiltTarget {
    name: target.name.clone(),
    artifact: target.artifact_name(),
  }
}

fn plan_target(
  graph: &GraphModel,
  ctx: &GenerationContext,
  target: &Target,
  generator: &str,
  configuration: Option<&str>,
) -> Result<TargetPlan, GenerateError> {
  let project = graph.project(target.project);
  let object_dir = format!("{}.dir", target.name);

  // A source listed twice is compiled once; distinct sources that still map
  // to the same object get a numbered object name.
  let mut objects: Vec<ObjectFile> = Vec::new();
  let mut seen_sources = HashSet::new();
  let mut used = HashSet::new();
  for source in &target.sources {
    let Some(language) = source_language(source).filter(|l| project.enables(l)) else {
      continue;
    };
    let path = ctx.source_path(source);
    if !seen_sources.insert(path.clone()) {
      continue;
    }
    let stem = object_stem(source, &ctx.source_dir);
    let mut object = format!("{}/{}.o", object_dir, stem);
    let mut n = 1;
    while !used.insert(object.clone()) {
      n += 1;
      object = format!("{}/{}.{}.o", object_dir, stem, n);
    }
    objects.push(ObjectFile {
      source: path,
      object,
      language,
    });
  }

  let dependencies = graph.transitive_dependencies(target.id);

  let mut compile_flags = BTreeMap::new();
  for object in &objects {
    compile_flags
      .entry(object.language)
      .or_insert_with(|| compile_flags_for(graph, ctx, target, &dependencies, object.language, configuration));
  }

  let linker_language = match target.property("LINKER_LANGUAGE") {
    Some(language) if !language.is_empty() => language.to_string(),
    _ => {
      let cxx = objects.iter().any(|o| o.language == "CXX")
        || dependencies
          .iter()
          .map(|id| graph.target(*id))
          .any(|dep| dep.kind.has_rules() && compiles_language(graph, dep, "CXX"));
      let language = if cxx { "CXX" } else { "C" };
      language.to_string()
    }
  };

  let mut link_libraries = Vec::new();
  if target.kind != TargetKind::StaticLibrary {
    for lib in graph.link_closure(target.id) {
      let lib = graph.target(lib);
      link_libraries.push(match lib.kind {
        TargetKind::UnknownLibrary => LinkItem::Imported(require_imported(lib, generator)?.to_string()),
        _ => LinkItem::Built(built(lib)),
      });
    }
  }

  let prerequisites = graph
    .dependencies(target.id)
    .iter()
    .map(|id| graph.target(*id))
    .filter(|dep| dep.kind.has_rules())
    .map(built)
    .filter(|dep| !link_libraries.iter().any(|l| matches!(l, LinkItem::Built(b) if b == dep)))
    .collect();

  Ok(TargetPlan {
    id: target.id,
    name: target.name.clone(),
    project: project.name.clone(),
    kind: target.kind,
    artifact: target.artifact_name(),
    object_dir,
    objects,
    compile_flags,
    linker_language,
    link_flags: link_flags(target),
    link_libraries,
    prerequisites,
    in_all: !target.excluded_from_all(),
  })
}

fn compile_flags_for(
  graph: &GraphModel,
  ctx: &GenerationContext,
  target: &Target,
  dependencies: &[TargetId],
  language: &str,
  configuration: Option<&str>,
) -> Vec<String> {
  let mut flags = ctx.language_flags(language);
  if let Some(configuration) = configuration {
    flags.extend(configuration_flags(configuration).iter().map(|f| f.to_string()));
  }
  if target.kind.needs_pic() {
    flags.push("-fPIC".to_string());
  }

  let deps: Vec<&Target> = dependencies.iter().map(|id| graph.target(*id)).collect();

  let definitions = target
    .property_list("COMPILE_DEFINITIONS")
    .into_iter()
    .chain(deps.iter().flat_map(|d| d.property_list("INTERFACE_COMPILE_DEFINITIONS")));
  for definition in definitions {
    push_unique(&mut flags, format!("-D{}", definition));
  }

  let includes = target
    .property_list("INCLUDE_DIRECTORIES")
    .into_iter()
    .chain(deps.iter().flat_map(|d| d.property_list("INTERFACE_INCLUDE_DIRECTORIES")));
  for include in includes {
    push_unique(&mut flags, format!("-I{}", ctx.source_path(Path::new(include)).display()));
  }

  flags.extend(target.property_list("COMPILE_OPTIONS").into_iter().map(str::to_string));
  flags
}

fn link_flags(target: &Target) -> Vec<String> {
  let mut flags = Vec::new();
  if matches!(target.kind, TargetKind::SharedLibrary | TargetKind::ModuleLibrary) {
    flags.push("-shared".to_string());
  }
  if target.kind == TargetKind::SharedLibrary
    && let Some(soversion) = target.property("SOVERSION").filter(|v| !v.is_empty())
  {
    flags.push(format!("-Wl,-soname,{}.{}", target.artifact_name(), soversion));
  }
  if target.kind != TargetKind::StaticLibrary {
    flags.extend(target.property_list("LINK_OPTIONS").into_iter().map(str::to_string));
  }
  flags
}

fn push_unique(flags: &mut Vec<String>, flag: String) {
  if !flags.contains(&flag) {
    flags.push(flag);
  }
}

/// Object path stem for a source: its path below the source directory, with
/// parent references flattened so objects stay inside the target directory.
/// Absolute sources outside the source directory keep their whole path under
/// `__abs`.
fn object_stem(source: &Path, source_dir: &Path) -> String {
  let (mut parts, relative) = if source.is_absolute() {
    match source.strip_prefix(source_dir) {
      Ok(rel) => (Vec::new(), rel),
      Err(_) => (vec!["__abs".to_string()], source),
    }
  } else {
    (Vec::new(), source)
  };

  parts.extend(relative.components().filter_map(|component| match component {
    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
    Component::ParentDir => Some("__".to_string()),
    Component::Prefix(prefix) => Some(prefix.as_os_str().to_string_lossy().replace([':', '\\', '?'], "")),
    _ => None,
  }));
  parts.retain(|part| !part.is_empty());
  parts.join("/")
}
