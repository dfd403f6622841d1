//! Declaration validation and graph construction.
//!
//! # Algorithm Overview
//!
//! 1. Check target names for characters that are unsafe in file names and
//!    build-script identifiers, then check project and target names for
//!    uniqueness
//! 2. Parse every target kind
//! 3. Resolve dependency names to target ids
//! 4. Detect cycles with a depth-first walk that tracks the active stack
//! 5. Compute the topological order with Kahn's algorithm, always picking the
//!    ready target declared first
//! 6. Check properties against the per-kind allowlist (warnings only)

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::properties;
use super::types::{Project, ProjectId, PropertyWarning, Target, TargetId, TargetKind};
use super::GraphModel;
use crate::decl::ProjectDecl;

/// Errors that can occur while building the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  /// Two projects share a name.
  #[error("duplicate project name '{name}'")]
  DuplicateProject { name: String },

  /// Target names clash. One entry per clashing declaration.
  #[error("duplicate target names: {}", describe_duplicates(.names, .projects))]
  DuplicateTarget { names: Vec<String>, projects: Vec<String> },

  /// A target name cannot be used as a directory or build-script identifier.
  #[error("invalid target name '{target}': {reason}")]
  InvalidTargetName { target: String, reason: &'static str },

  /// A target declared a kind outside the known set.
  #[error("target '{target}' has unknown kind '{kind}'")]
  UnknownTargetKind { target: String, kind: String },

  /// A dependency names a target that was never declared.
  #[error("target '{target}' depends on unknown target '{dependency}'")]
  UnknownDependency { target: String, dependency: String },

  /// The dependency relation contains a cycle.
  #[error("dependency cycle detected: {}", describe_cycle(.cycle))]
  CyclicDependency { cycle: Vec<String> },
}

fn describe_duplicates(names: &[String], projects: &[String]) -> String {
  names
    .iter()
    .zip(projects)
    .map(|(name, project)| format!("{} (in {})", name, project))
    .collect::<Vec<_>>()
    .join(", ")
}

fn describe_cycle(cycle: &[String]) -> String {
  let mut path = cycle.to_vec();
  if let Some(first) = cycle.first() {
    path.push(first.clone());
  }
  path.join(" -> ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
  Unvisited,
  OnStack,
  Done,
}

/// Builds a [`GraphModel`] from declarations.
pub struct GraphBuilder;

impl GraphBuilder {
  /// Validate `decls` and build the graph.
  ///
  /// Nothing outside the returned model is touched.
  pub fn build(decls: &[ProjectDecl]) -> Result<GraphModel, GraphError> {
    for target in decls.iter().flat_map(|p| p.targets.iter()) {
      if let Some(reason) = invalid_target_name(&target.name) {
        return Err(GraphError::InvalidTargetName {
          target: target.name.clone(),
          reason,
        });
      }
    }
    check_unique_names(decls)?;

    let mut projects = Vec::with_capacity(decls.len());
    let mut targets: Vec<Target> = Vec::new();
    let mut by_name = HashMap::new();

    for (p_index, decl) in decls.iter().enumerate() {
      let project_id = ProjectId(p_index);
      let mut project = Project {
        id: project_id,
        name: decl.name.clone(),
        languages: decl.languages.clone(),
        targets: Vec::with_capacity(decl.targets.len()),
      };

      for target_decl in &decl.targets {
        let kind = target_decl
          .kind
          .parse::<TargetKind>()
          .map_err(|_| GraphError::UnknownTargetKind {
            target: target_decl.name.clone(),
            kind: target_decl.kind.clone(),
          })?;

        let id = TargetId(targets.len());
        by_name.insert(target_decl.name.clone(), id);
        project.targets.push(id);
        targets.push(Target {
          id,
          project: project_id,
          name: target_decl.name.clone(),
          kind,
          sources: target_decl.sources.clone(),
          properties: target_decl.properties.clone(),
          dependencies: Vec::new(),
        });
      }

      projects.push(project);
    }

    // Resolve dependency names now that every target has an id.
    let target_decls = decls.iter().flat_map(|p| p.targets.iter());
    for (target, decl) in targets.iter_mut().zip(target_decls) {
      for dep_name in &decl.dependencies {
        let dep = *by_name.get(dep_name).ok_or_else(|| GraphError::UnknownDependency {
          target: decl.name.clone(),
          dependency: dep_name.clone(),
        })?;
        if !target.dependencies.contains(&dep) {
          target.dependencies.push(dep);
        }
      }
    }

    if let Some(cycle) = find_cycle(&targets) {
      return Err(GraphError::CyclicDependency {
        cycle: cycle.iter().map(|id| targets[id.0].name.clone()).collect(),
      });
    }

    let mut graph = DiGraph::with_capacity(targets.len(), 0);
    for target in &targets {
      graph.add_node(target.id);
    }
    for target in &targets {
      for dep in &target.dependencies {
        graph.add_edge(NodeIndex::new(dep.0), NodeIndex::new(target.id.0), ());
      }
    }

    let order = topological_order(&graph, &targets)?;
    let warnings = check_properties(&targets);

    info!(projects = projects.len(), targets = targets.len(), "build graph ready");

    Ok(GraphModel {
      projects,
      targets,
      graph,
      by_name,
      order,
      warnings,
    })
  }
}

/// Target names become directory names, make targets, ninja paths and BFF
/// aliases, so only `[A-Za-z0-9_.+-]` is accepted.
fn invalid_target_name(name: &str) -> Option<&'static str> {
  if name.is_empty() {
    return Some("name is empty");
  }
  if name == "." || name == ".." {
    return Some("name is a relative path component");
  }
  let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '+' | '-');
  if !name.chars().all(allowed) {
    return Some("only letters, digits, '_', '.', '+' and '-' are allowed");
  }
  None
}

fn check_unique_names(decls: &[ProjectDecl]) -> Result<(), GraphError> {
  let mut project_names = HashSet::new();
  for decl in decls {
    if !project_names.insert(decl.name.as_str()) {
      return Err(GraphError::DuplicateProject { name: decl.name.clone() });
    }
  }

  let mut counts: HashMap<&str, usize> = HashMap::new();
  for target in decls.iter().flat_map(|p| p.targets.iter()) {
    *counts.entry(target.name.as_str()).or_default() += 1;
  }

  let mut names = Vec::new();
  let mut projects = Vec::new();
  for decl in decls {
    for target in &decl.targets {
      if counts[target.name.as_str()] > 1 {
        names.push(target.name.clone());
        projects.push(decl.name.clone());
      }
    }
  }

  if names.is_empty() {
    Ok(())
  } else {
    Err(GraphError::DuplicateTarget { names, projects })
  }
}

/// Depth-first search for a back edge into the active stack.
///
/// Returns the cycle starting at the target that was re-entered, following
/// the stack to the target that closed it.
fn find_cycle(targets: &[Target]) -> Option<Vec<TargetId>> {
  let mut marks = vec![Mark::Unvisited; targets.len()];
  let mut stack = Vec::new();

  for target in targets {
    if marks[target.id.0] == Mark::Unvisited
      && let Some(cycle) = visit(target.id, targets, &mut marks, &mut stack)
    {
      return Some(cycle);
    }
  }

  None
}

fn visit(id: TargetId, targets: &[Target], marks: &mut [Mark], stack: &mut Vec<TargetId>) -> Option<Vec<TargetId>> {
  marks[id.0] = Mark::OnStack;
  stack.push(id);

  for &dep in &targets[id.0].dependencies {
    match marks[dep.0] {
      Mark::OnStack => {
        let start = stack.iter().position(|t| *t == dep).unwrap_or(0);
        return Some(stack[start..].to_vec());
      }
      Mark::Unvisited => {
        if let Some(cycle) = visit(dep, targets, marks, stack) {
          return Some(cycle);
        }
      }
      Mark::Done => {}
    }
  }

  stack.pop();
  marks[id.0] = Mark::Done;
  None
}

/// Kahn's algorithm over in-degrees, ready targets taken in declaration order.
fn topological_order(graph: &DiGraph<TargetId, ()>, targets: &[Target]) -> Result<Vec<TargetId>, GraphError> {
  let mut in_degree: Vec<usize> = targets.iter().map(|t| t.dependencies.len()).collect();

  let mut ready: BinaryHeap<Reverse<usize>> = in_degree
    .iter()
    .enumerate()
    .filter(|(_, degree)| **degree == 0)
    .map(|(index, _)| Reverse(index))
    .collect();

  let mut order = Vec::with_capacity(targets.len());
  while let Some(Reverse(index)) = ready.pop() {
    order.push(TargetId(index));

    for dependent in graph.neighbors_directed(NodeIndex::new(index), Direction::Outgoing) {
      let degree = &mut in_degree[dependent.index()];
      *degree = degree.saturating_sub(1);
      if *degree == 0 {
        ready.push(Reverse(dependent.index()));
      }
    }
  }

  if order.len() != targets.len() {
    // Unreachable after find_cycle, kept so a bad graph never yields a partial order.
    let placed: HashSet<TargetId> = order.iter().copied().collect();
    return Err(GraphError::CyclicDependency {
      cycle: targets
        .iter()
        .filter(|t| !placed.contains(&t.id))
        .map(|t| t.name.clone())
        .collect(),
    });
  }

  debug!(order = ?order.iter().map(|id| targets[id.0].name.as_str()).collect::<Vec<_>>(), "topological order");
  Ok(order)
}

fn check_properties(targets: &[Target]) -> Vec<PropertyWarning> {
  let mut warnings = Vec::new();
  for target in targets {
    for property in target.properties.keys() {
      if !properties::is_known(target.kind, property) {
        let warning = PropertyWarning {
          target: target.name.clone(),
          kind: target.kind,
          property: property.clone(),
        };
        warn!("{}", warning);
        warnings.push(warning);
      }
    }
  }
  warnings
}
