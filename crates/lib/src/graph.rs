//! Dependency graph over the module registry.
//!
//! This module builds a directed graph from registered descriptors and
//! provides the orchestrator's graph-level guarantees:
//! - every named dependency resolves to a registered module
//! - the graph is acyclic (a cycle aborts with a readable chain)
//! - a topological build order, dependencies before dependents
//! - parallel build waves for an orchestrator that compiles concurrently
//!
//! Edges run from dependency to dependent, so a topological sort yields
//! dependencies first.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use thiserror::Error;
use tracing::debug;

use crate::descriptor::Visibility;
use crate::registry::ModuleRegistry;

/// Errors that can occur during graph construction and ordering.
#[derive(Debug, Error)]
pub enum GraphError {
  /// A descriptor names a dependency that is not in the registry.
  #[error("module '{module}' depends on unknown module '{dependency}'")]
  UnresolvedDependency { module: String, dependency: String },

  /// The union of public and private edges contains a cycle.
  #[error("dependency cycle detected: {chain}")]
  CycleDetected { chain: String },
}

/// The module dependency graph.
///
/// Constructed once from a registry and immutable afterwards. Construction
/// fails fatally on an unresolved dependency or a cycle; no partial graph is
/// ever returned.
#[derive(Debug)]
pub struct DependencyGraph {
  /// The underlying graph. Node weights are module names, edge weights the
  /// visibility of the dependency edge.
  graph: DiGraph<String, Visibility>,

  /// Map from module name to node index.
  nodes: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
  /// Build the dependency graph for a registry.
  ///
  /// # Errors
  ///
  /// Returns [`GraphError::UnresolvedDependency`] for the first edge whose
  /// target is not registered, or [`GraphError::CycleDetected`] if the
  /// finished graph contains a cycle.
  pub fn from_registry(registry: &ModuleRegistry) -> Result<Self, GraphError> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    // First pass: one node per registered module, in name order so that
    // orderings derived from node indices are deterministic.
    for module in registry.modules() {
      let idx = graph.add_node(module.name().to_string());
      nodes.insert(module.name().to_string(), idx);
    }

    // Second pass: edges from dependency to dependent.
    for module in registry.modules() {
      let dependent_idx = nodes[module.name()];

      for (dep, visibility) in module.descriptor.dependencies() {
        let Some(&dep_idx) = nodes.get(dep) else {
          return Err(GraphError::UnresolvedDependency {
            module: module.name().to_string(),
            dependency: dep.to_string(),
          });
        };
        graph.add_edge(dep_idx, dependent_idx, visibility);
      }
    }

    debug!(
      modules = graph.node_count(),
      edges = graph.edge_count(),
      "dependency graph built"
    );

    let dag = Self { graph, nodes };
    dag.verify_acyclic()?;

    Ok(dag)
  }

  /// Verify that the graph is acyclic.
  fn verify_acyclic(&self) -> Result<(), GraphError> {
    toposort(&self.graph, None).map_err(|_| self.cycle_error())?;
    Ok(())
  }

  /// Build the cycle diagnostic, rendering the chain as `"A -> B -> A"`.
  fn cycle_error(&self) -> GraphError {
    let chain = match self.find_cycle() {
      Some(mut cycle) => {
        if let Some(first) = cycle.first().cloned() {
          cycle.push(first);
        }
        cycle.join(" -> ")
      }
      None => "<unknown>".to_string(),
    };

    GraphError::CycleDetected { chain }
  }

  /// Find one cycle in the graph, as the list of module names on it.
  fn find_cycle(&self) -> Option<Vec<String>> {
    let mut visited = HashSet::new();
    let mut stack = Vec::new();
    let mut on_stack = HashSet::new();

    for idx in self.graph.node_indices() {
      if !visited.contains(&idx)
        && let Some(cycle) = self.cycle_dfs(idx, &mut visited, &mut stack, &mut on_stack)
      {
        return Some(cycle);
      }
    }

    None
  }

  /// DFS helper for cycle extraction.
  fn cycle_dfs(
    &self,
    idx: NodeIndex,
    visited: &mut HashSet<NodeIndex>,
    stack: &mut Vec<NodeIndex>,
    on_stack: &mut HashSet<NodeIndex>,
  ) -> Option<Vec<String>> {
    visited.insert(idx);
    stack.push(idx);
    on_stack.insert(idx);

    for succ in self.graph.neighbors_directed(idx, Direction::Outgoing) {
      if !visited.contains(&succ) {
        if let Some(cycle) = self.cycle_dfs(succ, visited, stack, on_stack) {
          return Some(cycle);
        }
      } else if on_stack.contains(&succ) {
        // Found a cycle - extract it from the current DFS stack.
        let start = stack.iter().position(|&n| n == succ)?;
        return Some(stack[start..].iter().map(|&n| self.graph[n].clone()).collect());
      }
    }

    stack.pop();
    on_stack.remove(&idx);
    None
  }

  /// Modules in topological order, dependencies before dependents.
  pub fn build_order(&self) -> Result<Vec<String>, GraphError> {
    let sorted = toposort(&self.graph, None).map_err(|_| self.cycle_error())?;
    Ok(sorted.into_iter().map(|idx| self.graph[idx].clone()).collect())
  }

  /// Modules grouped into parallel build waves.
  ///
  /// Each wave contains modules whose dependencies are all in earlier
  /// waves, so every module of a wave may build concurrently. Waves are
  /// sorted by name internally for deterministic output.
  pub fn build_waves(&self) -> Result<Vec<Vec<String>>, GraphError> {
    let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
    for idx in self.graph.node_indices() {
      in_degree.insert(idx, self.graph.neighbors_directed(idx, Direction::Incoming).count());
    }

    let mut remaining: HashSet<NodeIndex> = self.graph.node_indices().collect();
    let mut waves = Vec::new();

    while !remaining.is_empty() {
      let ready: Vec<NodeIndex> = remaining.iter().filter(|&&idx| in_degree[&idx] == 0).copied().collect();

      if ready.is_empty() {
        return Err(self.cycle_error());
      }

      for &idx in &ready {
        remaining.remove(&idx);
        for neighbor in self.graph.neighbors_directed(idx, Direction::Outgoing) {
          if let Some(deg) = in_degree.get_mut(&neighbor) {
            *deg = deg.saturating_sub(1);
          }
        }
      }

      let mut wave: Vec<String> = ready.into_iter().map(|idx| self.graph[idx].clone()).collect();
      wave.sort();
      waves.push(wave);
    }

    Ok(waves)
  }

  /// Direct dependencies of a module, with edge visibility.
  pub fn dependencies_of(&self, name: &str) -> Vec<(String, Visibility)> {
    self.edges_of(name, Direction::Incoming)
  }

  /// Direct dependents of a module, with edge visibility.
  pub fn dependents_of(&self, name: &str) -> Vec<(String, Visibility)> {
    self.edges_of(name, Direction::Outgoing)
  }

  fn edges_of(&self, name: &str, direction: Direction) -> Vec<(String, Visibility)> {
    let Some(&idx) = self.nodes.get(name) else {
      return Vec::new();
    };

    let mut edges: Vec<(String, Visibility)> = self
      .graph
      .edges_directed(idx, direction)
      .map(|edge| {
        let other = match direction {
          Direction::Incoming => edge.source(),
          Direction::Outgoing => edge.target(),
        };
        (self.graph[other].clone(), *edge.weight())
      })
      .collect();

    edges.sort_by(|a, b| a.0.cmp(&b.0));
    edges
  }

  /// Number of modules in the graph.
  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  /// Check whether the graph is empty.
  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }
}
