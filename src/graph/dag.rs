// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The service graph: a node/edge store that enforces DAG validity.
//!
//! Nodes are unique string identifiers naming pipeline stages; edges are
//! directed, independent-node -> dependent-node, meaning "output of the
//! independent stage feeds the dependent stage's input". Every mutation must
//! leave the graph with at least one zero-in-degree node and no cycle.
//!
//! # Algorithms
//!
//! Ordering uses **Kahn's algorithm** (repeatedly peel zero-in-degree nodes):
//! - **Time Complexity**: O(V + E)
//! - **Space Complexity**: O(V) for the in-degree map and ready queue
//! - **Cycle Detection**: fewer nodes emitted than exist in the graph
//!
//! Edge insertion is validated by cloning the adjacency map, adding the edge,
//! and attempting a full topological sort on the clone; the mutation commits
//! only on success. That makes every insertion O(V + E), which is acceptable
//! because pipelines have at most a handful of stages.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::errors::GraphError;

/// A directed acyclic graph of pipeline stages.
///
/// Built once at startup (programmatically or via the flow-rule DSL) and
/// treated as immutable while runs are in flight. The adjacency map stores
/// each node's direct successors.
///
/// # Examples
///
/// ```
/// use the_hoagie::graph::ServiceDag;
///
/// let mut dag = ServiceDag::new();
/// dag.add_node("embedding").unwrap();
/// dag.add_node("llm").unwrap();
/// dag.add_edge("embedding", "llm").unwrap();
///
/// assert_eq!(dag.topological_sort().unwrap(), vec!["embedding", "llm"]);
/// assert_eq!(dag.ind_nodes(), vec!["embedding"]);
/// assert_eq!(dag.all_leaves(), vec!["llm"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDag {
    /// node id -> direct successors, in insertion order.
    adjacency: HashMap<String, Vec<String>>,
}

impl ServiceDag {
    /// Create a new, empty graph.
    pub fn new() -> Self {
        Self {
            adjacency: HashMap::new(),
        }
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Whether a node with this id exists.
    pub fn contains_node(&self, id: &str) -> bool {
        self.adjacency.contains_key(id)
    }

    /// Iterator over all node ids, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &String> {
        self.adjacency.keys()
    }

    /// Add a node to the graph.
    ///
    /// Fails with `DuplicateNode` if the id already exists.
    pub fn add_node(&mut self, id: impl Into<String>) -> Result<(), GraphError> {
        let id = id.into();
        if self.adjacency.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.adjacency.insert(id, Vec::new());
        Ok(())
    }

    /// Add a node to the graph, doing nothing if it already exists.
    pub fn add_node_if_absent(&mut self, id: impl Into<String>) {
        self.adjacency.entry(id.into()).or_default();
    }

    /// Remove a node and every edge touching it.
    ///
    /// Fails with `NodeNotFound` if the node does not exist.
    pub fn remove_node(&mut self, id: &str) -> Result<(), GraphError> {
        if self.adjacency.remove(id).is_none() {
            return Err(GraphError::NodeNotFound(id.to_string()));
        }
        for successors in self.adjacency.values_mut() {
            successors.retain(|succ| succ != id);
        }
        Ok(())
    }

    /// Add a directed edge `from -> to`.
    ///
    /// Fails with `NodeNotFound` if either endpoint is missing, and with
    /// `Cycle` / `NoIndependentNodes` if the hypothetical resulting graph
    /// would not be a schedulable DAG. Validation clones the adjacency map,
    /// adds the edge, and attempts a topological sort on the clone; the edge
    /// commits only on success, so a failed call leaves the graph unchanged.
    ///
    /// Adding an edge that already exists is a no-op.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        if !self.adjacency.contains_key(from) {
            return Err(GraphError::NodeNotFound(from.to_string()));
        }
        if !self.adjacency.contains_key(to) {
            return Err(GraphError::NodeNotFound(to.to_string()));
        }
        if self.adjacency[from].iter().any(|succ| succ == to) {
            return Ok(());
        }

        // Trial run on a copy; only commit if the result still sorts.
        let mut candidate = self.adjacency.clone();
        if let Some(successors) = candidate.get_mut(from) {
            successors.push(to.to_string());
        }
        kahn_sort(&candidate)?;

        self.adjacency = candidate;
        Ok(())
    }

    /// Remove the directed edge `from -> to`.
    ///
    /// Fails with `EdgeNotFound` if the edge does not exist.
    pub fn remove_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        let successors = self
            .adjacency
            .get_mut(from)
            .ok_or_else(|| GraphError::EdgeNotFound {
                from: from.to_string(),
                to: to.to_string(),
            })?;
        let position = successors.iter().position(|succ| succ == to).ok_or_else(|| {
            GraphError::EdgeNotFound {
                from: from.to_string(),
                to: to.to_string(),
            }
        })?;
        successors.remove(position);
        Ok(())
    }

    /// Direct predecessors of a node (stages whose output feeds it).
    ///
    /// Fails with `NodeNotFound` if the node does not exist.
    pub fn predecessors(&self, id: &str) -> Result<Vec<String>, GraphError> {
        if !self.adjacency.contains_key(id) {
            return Err(GraphError::NodeNotFound(id.to_string()));
        }
        let mut predecessors: Vec<String> = self
            .adjacency
            .iter()
            .filter(|(_, successors)| successors.iter().any(|succ| succ == id))
            .map(|(node, _)| node.clone())
            .collect();
        predecessors.sort_unstable();
        Ok(predecessors)
    }

    /// Direct successors of a node.
    ///
    /// Fails with `NodeNotFound` if the node does not exist.
    pub fn downstream(&self, id: &str) -> Result<Vec<String>, GraphError> {
        self.adjacency
            .get(id)
            .cloned()
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    /// All transitive successors of a node, restricted to topological order.
    ///
    /// Fails with `NodeNotFound` if the node does not exist.
    pub fn all_downstream(&self, id: &str) -> Result<Vec<String>, GraphError> {
        if !self.adjacency.contains_key(id) {
            return Err(GraphError::NodeNotFound(id.to_string()));
        }

        // Reachability first, then filter the sorted order so the result is a
        // subsequence of `topological_sort()`.
        let mut reachable = HashSet::new();
        let mut frontier = VecDeque::from([id.to_string()]);
        while let Some(node) = frontier.pop_front() {
            if let Some(successors) = self.adjacency.get(&node) {
                for succ in successors {
                    if reachable.insert(succ.clone()) {
                        frontier.push_back(succ.clone());
                    }
                }
            }
        }

        let order = self.topological_sort()?;
        Ok(order
            .into_iter()
            .filter(|node| reachable.contains(node))
            .collect())
    }

    /// Zero-in-degree nodes: the pipeline entry points, sorted by id.
    pub fn ind_nodes(&self) -> Vec<String> {
        let in_degree = in_degrees(&self.adjacency);
        let mut independent: Vec<String> = in_degree
            .into_iter()
            .filter(|(_, degree)| *degree == 0)
            .map(|(node, _)| node)
            .collect();
        independent.sort_unstable();
        independent
    }

    /// Zero-out-degree nodes: the pipeline outputs, sorted by id.
    pub fn all_leaves(&self) -> Vec<String> {
        let mut leaves: Vec<String> = self
            .adjacency
            .iter()
            .filter(|(_, successors)| successors.is_empty())
            .map(|(node, _)| node.clone())
            .collect();
        leaves.sort_unstable();
        leaves
    }

    /// A full topological order of the graph (Kahn's algorithm).
    ///
    /// Fails with `NoIndependentNodes` when a non-empty graph has no
    /// zero-in-degree node, and with `Cycle` when fewer nodes are emitted
    /// than exist in the graph.
    pub fn topological_sort(&self) -> Result<Vec<String>, GraphError> {
        kahn_sort(&self.adjacency)
    }
}

/// In-degree of every node in an adjacency map.
fn in_degrees(adjacency: &HashMap<String, Vec<String>>) -> HashMap<String, usize> {
    let mut in_degree: HashMap<String, usize> =
        adjacency.keys().map(|node| (node.clone(), 0)).collect();
    for successors in adjacency.values() {
        for succ in successors {
            if let Some(degree) = in_degree.get_mut(succ) {
                *degree += 1;
            }
        }
    }
    in_degree
}

/// Kahn's algorithm over an adjacency map.
///
/// Entry points are seeded in sorted order so that ties between independent
/// siblings resolve deterministically.
fn kahn_sort(adjacency: &HashMap<String, Vec<String>>) -> Result<Vec<String>, GraphError> {
    if adjacency.is_empty() {
        return Ok(Vec::new());
    }

    let mut in_degree = in_degrees(adjacency);
    let mut seeds: Vec<String> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(node, _)| node.clone())
        .collect();
    if seeds.is_empty() {
        return Err(GraphError::NoIndependentNodes);
    }
    seeds.sort_unstable();

    let mut queue: VecDeque<String> = seeds.into();
    let mut order = Vec::with_capacity(adjacency.len());
    while let Some(node) = queue.pop_front() {
        if let Some(successors) = adjacency.get(&node) {
            for succ in successors {
                if let Some(degree) = in_degree.get_mut(succ) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(succ.clone());
                    }
                }
            }
        }
        order.push(node);
    }

    if order.len() != adjacency.len() {
        return Err(GraphError::Cycle);
    }
    Ok(order)
}
