//! Validated build graph.
//!
//! [`GraphBuilder`] turns front-end declarations into a [`GraphModel`]: every
//! target name resolved, every kind recognized, the dependency relation proven
//! acyclic, and a deterministic topological order computed once.
//!
//! Edges in the underlying graph point from a dependency to its dependent, the
//! same orientation as the execution DAG: a node's incoming neighbors are what
//! it needs, its outgoing neighbors are what needs it.

mod builder;
mod properties;
mod types;

pub use builder::{GraphBuilder, GraphError};
pub use properties::is_known as is_known_property;
pub use types::{Project, ProjectId, PropertyWarning, Target, TargetId, TargetKind};

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

/// Projects, targets and dependency edges for one session.
#[derive(Debug, Clone)]
pub struct GraphModel {
  projects: Vec<Project>,
  targets: Vec<Target>,
  /// Node `i` holds `TargetId(i)`; nodes are added in declaration order.
  graph: DiGraph<TargetId, ()>,
  by_name: HashMap<String, TargetId>,
  order: Vec<TargetId>,
  warnings: Vec<PropertyWarning>,
}

impl GraphModel {
  /// A graph with no projects.
  pub fn empty() -> Self {
    Self {
      projects: Vec::new(),
      targets: Vec::new(),
      graph: DiGraph::new(),
      by_name: HashMap::new(),
      order: Vec::new(),
      warnings: Vec::new(),
    }
  }

  pub fn projects(&self) -> &[Project] {
    &self.projects
  }

  pub fn project(&self, id: ProjectId) -> &Project {
    &self.projects[id.0]
  }

  /// All targets in declaration order.
  pub fn targets(&self) -> &[Target] {
    &self.targets
  }

  pub fn target(&self, id: TargetId) -> &Target {
    &self.targets[id.0]
  }

  /// Look up a target by name.
  pub fn find(&self, name: &str) -> Option<&Target> {
    self.by_name.get(name).map(|id| self.target(*id))
  }

  pub fn target_count(&self) -> usize {
    self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }

  /// Every target after all of its dependencies; ties keep declaration order.
  pub fn topological_order(&self) -> &[TargetId] {
    &self.order
  }

  /// The topological order restricted to one project.
  pub fn project_order(&self, project: ProjectId) -> Vec<TargetId> {
    self
      .order
      .iter()
      .copied()
      .filter(|id| self.target(*id).project == project)
      .collect()
  }

  /// Direct dependencies in declaration order.
  pub fn dependencies(&self, id: TargetId) -> &[TargetId] {
    &self.target(id).dependencies
  }

  /// Targets that directly depend on `id`, in declaration order.
  pub fn dependents(&self, id: TargetId) -> Vec<TargetId> {
    let mut dependents: Vec<TargetId> = self
      .graph
      .neighbors_directed(NodeIndex::new(id.0), Direction::Outgoing)
      .map(|idx| self.graph[idx])
      .collect();
    dependents.sort();
    dependents
  }

  /// All targets reachable through dependencies, in topological order.
  pub fn transitive_dependencies(&self, id: TargetId) -> Vec<TargetId> {
    let mut reached = HashSet::new();
    let mut pending: Vec<TargetId> = self.dependencies(id).to_vec();
    while let Some(next) = pending.pop() {
      if reached.insert(next) {
        pending.extend(self.dependencies(next));
      }
    }

    self.order.iter().copied().filter(|t| reached.contains(t)).collect()
  }

  /// Libraries linked into `id`, in link-line order.
  ///
  /// Direct dependencies come in declaration order. Static and interface
  /// libraries forward their own dependencies, so those follow the library
  /// that pulled them in. A library reached twice keeps its last position,
  /// which keeps every library ahead of the ones it needs. Only linkable
  /// targets are returned; interface libraries are walked through but not
  /// listed.
  pub fn link_closure(&self, id: TargetId) -> Vec<TargetId> {
    let mut memo = HashMap::new();
    let mut sequence = Vec::new();
    for &dep in self.dependencies(id) {
      sequence.extend_from_slice(self.forwarded_links(dep, &mut memo));
    }
    keep_last(sequence)
  }

  /// The link sequence contributed by `id`, already reduced to last occurrences.
  ///
  /// Reducing each piece first gives the same result as reducing the whole
  /// expansion, so shared libraries below a diamond are expanded once.
  fn forwarded_links<'m>(&self, id: TargetId, memo: &'m mut HashMap<TargetId, Vec<TargetId>>) -> &'m [TargetId] {
    if !memo.contains_key(&id) {
      let target = self.target(id);
      let mut sequence = Vec::new();
      if target.kind.is_linkable() {
        sequence.push(id);
      }
      if target.kind.forwards_dependencies() {
        for &dep in &target.dependencies {
          sequence.extend_from_slice(self.forwarded_links(dep, memo));
        }
      }
      memo.insert(id, keep_last(sequence));
    }
    memo.get(&id).map(Vec::as_slice).unwrap_or_default()
  }

  /// Unknown properties found while building.
  pub fn warnings(&self) -> &[PropertyWarning] {
    &self.warnings
  }
}

/// Drop every repeated target but its last occurrence.
fn keep_last(sequence: Vec<TargetId>) -> Vec<TargetId> {
  let mut seen = HashSet::new();
  let mut kept: Vec<TargetId> = sequence.into_iter().rev().filter(|t| seen.insert(*t)).collect();
  kept.reverse();
  kept
}
