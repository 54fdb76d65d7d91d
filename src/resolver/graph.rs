//! Per-beacon capability graph.
//!
//! Vertices are small integer indices: 0 is the synthetic Start vertex and
//! `1..=N` are the beacon's declared nodes in declared order. Decoded
//! descriptors live in a side table indexed the same way, so nothing is keyed
//! by wire bytes.

use std::collections::VecDeque;

use super::filter::CapabilityFilter;
use super::ValidationFailure;
use crate::types::{Beacon, CapabilityNode};

/// Index of the synthetic Start vertex.
pub const START: usize = 0;

/// Outcome of searching for one goal vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalSearch {
    /// Shortest path from Start to the goal, both ends included.
    Reached(Vec<usize>),
    /// No path from Start to the goal.
    Unreachable,
}

/// Directed capability graph rooted at Start.
#[derive(Debug, Clone)]
pub struct CapabilityGraph {
    /// Decoded descriptor per vertex (`None` for Start).
    descriptors: Vec<Option<CapabilityNode>>,
    /// Outgoing edges per vertex, in declaration order.
    adjacency: Vec<Vec<usize>>,
    /// Vertices dropped by the capability filter.
    removed: Vec<bool>,
}

impl CapabilityGraph {
    /// Build the graph from a beacon's declared nodes and edges.
    ///
    /// Fails if a node does not decode or an edge indexes past the declared
    /// nodes.
    pub fn from_beacon<B: Beacon + ?Sized>(beacon: &B) -> Result<Self, ValidationFailure> {
        let mut descriptors = Vec::with_capacity(beacon.nodes().len() + 1);
        descriptors.push(None);
        for (i, encoded) in beacon.nodes().iter().enumerate() {
            let node = CapabilityNode::decode(encoded).map_err(|e| {
                ValidationFailure::UndecodableNode {
                    index: i + 1,
                    reason: e.to_string(),
                }
            })?;
            descriptors.push(Some(node));
        }

        let vertex_count = descriptors.len();
        let mut adjacency = vec![Vec::new(); vertex_count];
        for edge in beacon.edges() {
            if edge.from >= vertex_count || edge.to >= vertex_count {
                return Err(ValidationFailure::EdgeOutOfRange {
                    from: edge.from,
                    to: edge.to,
                    vertices: vertex_count,
                });
            }
            adjacency[edge.from].push(edge.to);
        }

        Ok(Self {
            descriptors,
            adjacency,
            removed: vec![false; vertex_count],
        })
    }

    /// Drop every vertex the filter rejects. Start is always kept.
    pub fn reduce(mut self, filter: &dyn CapabilityFilter) -> Self {
        for (vertex, descriptor) in self.descriptors.iter().enumerate() {
            if let Some(node) = descriptor {
                if !filter.admits(node) {
                    self.removed[vertex] = true;
                }
            }
        }
        self
    }

    /// Number of vertices, Start included.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the graph has only the Start vertex.
    pub fn is_empty(&self) -> bool {
        self.descriptors.len() <= 1
    }

    /// Whether a vertex survived reduction.
    pub fn is_present(&self, vertex: usize) -> bool {
        vertex < self.len() && !self.removed[vertex]
    }

    /// Decoded descriptor of a vertex (`None` for Start or out of range).
    pub fn descriptor(&self, vertex: usize) -> Option<&CapabilityNode> {
        self.descriptors.get(vertex).and_then(|d| d.as_ref())
    }

    /// Target vertices still present, in discovery (declaration) order.
    pub fn goals(&self) -> Vec<usize> {
        (START + 1..self.len())
            .filter(|&v| self.is_present(v))
            .filter(|&v| self.descriptor(v).map_or(false, CapabilityNode::is_target))
            .collect()
    }

    /// Breadth-first predecessor table from Start over present vertices.
    ///
    /// `tree[v]` is the vertex `v` was first reached from; `tree[START]` is
    /// `Some(START)`.
    pub fn shortest_path_tree(&self) -> Vec<Option<usize>> {
        let mut tree = vec![None; self.len()];
        let mut queue = VecDeque::new();

        tree[START] = Some(START);
        queue.push_back(START);

        while let Some(vertex) = queue.pop_front() {
            for &next in &self.adjacency[vertex] {
                if !self.is_present(next) || tree[next].is_some() {
                    continue;
                }
                tree[next] = Some(vertex);
                queue.push_back(next);
            }
        }

        tree
    }

    /// Shortest path from Start to `goal` read off a predecessor table.
    pub fn path_to(&self, tree: &[Option<usize>], goal: usize) -> GoalSearch {
        if goal >= tree.len() || tree[goal].is_none() {
            return GoalSearch::Unreachable;
        }

        let mut path = vec![goal];
        let mut vertex = goal;
        while vertex != START {
            match tree[vertex] {
                Some(previous) => {
                    path.push(previous);
                    vertex = previous;
                }
                None => return GoalSearch::Unreachable,
            }
        }
        path.reverse();
        GoalSearch::Reached(path)
    }

    /// Whether `to` is one of `from`'s outgoing edges.
    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.adjacency.get(from).map_or(false, |out| out.contains(&to))
    }
}
