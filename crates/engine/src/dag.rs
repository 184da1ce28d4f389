//! Dependency graph: identifiers connected by `requirement → target` edges.
//!
//! Rules enforced:
//! 1. Edges are add-only and idempotent.
//! 2. Predecessors keep their declaration order.
//! 3. The graph is only checked for cycles when an ordering is requested.
//!
//! Ties in the topological order are broken by insertion order, so the same
//! sequence of `add_edge` calls always yields the same order.

use std::collections::{HashMap, VecDeque};

use crate::EngineError;

/// Adjacency-list DAG of resource identifiers.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<String>,
    predecessors: HashMap<String, Vec<String>>,
    successors: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id` if absent. Returns `true` when the node is new.
    pub fn add_node(&mut self, id: &str) -> bool {
        if self.predecessors.contains_key(id) {
            return false;
        }
        self.nodes.push(id.to_owned());
        self.predecessors.insert(id.to_owned(), Vec::new());
        self.successors.insert(id.to_owned(), Vec::new());
        true
    }

    /// Insert the edge `from → to`, creating both nodes as needed.
    /// Returns `true` when the edge is new.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        self.add_node(from);
        self.add_node(to);

        let preds = self.predecessors.entry(to.to_owned()).or_default();
        if preds.iter().any(|p| p == from) {
            return false;
        }
        preds.push(from.to_owned());
        self.successors
            .entry(from.to_owned())
            .or_default()
            .push(to.to_owned());
        true
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct requirements of `id`, in declaration order.
    pub fn predecessors(&self, id: &str) -> &[String] {
        self.predecessors.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Direct dependents of `id`, in declaration order.
    pub fn successors(&self, id: &str) -> &[String] {
        self.successors.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every `(requirement, target)` pair.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes.iter().flat_map(move |from| {
            self.successors(from)
                .iter()
                .map(move |to| (from.as_str(), to.as_str()))
        })
    }

    pub fn edge_count(&self) -> usize {
        self.successors.values().map(Vec::len).sum()
    }

    pub fn is_acyclic(&self) -> bool {
        self.topological_order().is_ok()
    }

    /// Identifiers in an order where every requirement precedes its targets.
    ///
    /// # Errors
    /// [`EngineError::CyclicGraph`] if the graph is not acyclic.
    pub fn topological_order(&self) -> Result<Vec<String>, EngineError> {
        // Kahn's algorithm.
        let mut in_degree: HashMap<&str, usize> = self
            .nodes
            .iter()
            .map(|id| (id.as_str(), self.predecessors(id).len()))
            .collect();

        // Seed the queue with nodes that have no incoming edges.
        let mut queue: VecDeque<&str> = self
            .nodes
            .iter()
            .map(String::as_str)
            .filter(|id| in_degree[id] == 0)
            .collect();

        let mut sorted: Vec<String> = Vec::with_capacity(self.nodes.len());

        while let Some(id) = queue.pop_front() {
            sorted.push(id.to_owned());

            for next in self.successors(id) {
                if let Some(deg) = in_degree.get_mut(next.as_str()) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(next);
                    }
                }
            }
        }

        // If we didn't visit every node the graph contains a cycle.
        if sorted.len() != self.nodes.len() {
            return Err(EngineError::CyclicGraph);
        }

        Ok(sorted)
    }
}
