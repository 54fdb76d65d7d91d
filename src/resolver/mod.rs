//! Capability graph resolution.
//!
//! Decides whether a beacon advertises a sequence of capabilities we can
//! satisfy that ends in a joinable network.
//!
//! ## Algorithm
//!
//! 1. Sanity check: at least 2 nodes, at least 1 edge, supported medium
//! 2. Build the graph: Start plus declared nodes, declared edges
//! 3. Reduce: drop vertices the capability filter rejects
//! 4. Collect goal vertices (target networks) in declaration order
//! 5. For each goal in that order, take the shortest path from Start;
//!    the first reachable goal wins
//!
//! Step 5 is first-match, not shortest-over-all-goals: a later goal with a
//! shorter path does not displace an earlier reachable one.

pub mod filter;
pub mod graph;

use std::fmt;
use std::sync::Arc;

use crate::types::{Beacon, CapabilityNode, MediumType};

pub use filter::{AcceptAll, CapabilityFilter, ConfiguredFilter};
pub use graph::{CapabilityGraph, GoalSearch, START};

/// Minimum declared nodes for a beacon to be considered.
pub const MIN_NODES: usize = 2;

/// Minimum declared edges for a beacon to be considered.
pub const MIN_EDGES: usize = 1;

/// Why a beacon's capability topology was rejected outright.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    /// Fewer than two declared nodes.
    #[error("Beacon declares {0} capability nodes, need at least 2")]
    TooFewNodes(usize),
    /// No declared edges.
    #[error("Beacon declares {0} capability edges, need at least 1")]
    TooFewEdges(usize),
    /// Medium outside the supported set.
    #[error("Unsupported medium: {0}")]
    UnsupportedMedium(MediumType),
    /// Edge refers past the declared nodes.
    #[error("Edge {from}->{to} out of range for {vertices} vertices")]
    EdgeOutOfRange {
        /// Source index.
        from: usize,
        /// Destination index.
        to: usize,
        /// Vertex count, Start included.
        vertices: usize,
    },
    /// Node bytes failed to decode.
    #[error("Capability node {index} does not decode: {reason}")]
    UndecodableNode {
        /// Vertex index of the node.
        index: usize,
        /// Decoder message.
        reason: String,
    },
}

/// Why no join path was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoPathReason {
    /// The beacon failed validation.
    Invalid(ValidationFailure),
    /// No target network survived reduction.
    NoGoals,
    /// Target networks exist but none is reachable from Start.
    Unreachable {
        /// Number of goals tried.
        goals: usize,
    },
}

impl fmt::Display for NoPathReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(failure) => write!(f, "invalid beacon: {}", failure),
            Self::NoGoals => write!(f, "no joinable network advertised"),
            Self::Unreachable { goals } => {
                write!(f, "none of {} joinable networks reachable", goals)
            }
        }
    }
}

/// A satisfiable sequence of capabilities ending in a target network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPath {
    vertices: Vec<usize>,
    steps: Vec<CapabilityNode>,
}

impl JoinPath {
    /// Vertex indices from Start (index 0) to the goal.
    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    /// Decoded capabilities after Start, in traversal order.
    pub fn steps(&self) -> &[CapabilityNode] {
        &self.steps
    }

    /// Number of edges traversed.
    pub fn hops(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }

    /// The network this path joins.
    pub fn target(&self) -> Option<&CapabilityNode> {
        self.steps.last()
    }
}

impl fmt::Display for JoinPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Start")?;
        for step in &self.steps {
            write!(f, " -> {}", step)?;
        }
        Ok(())
    }
}

/// Result of resolving a beacon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A join path exists.
    Path(JoinPath),
    /// No join path.
    NoPath(NoPathReason),
}

impl Resolution {
    /// Whether a path was found.
    pub fn is_path(&self) -> bool {
        matches!(self, Self::Path(_))
    }
}

/// Check the beacon's declared topology before building a graph.
pub fn validate<B: Beacon + ?Sized>(beacon: &B) -> Result<(), ValidationFailure> {
    let nodes = beacon.nodes().len();
    if nodes < MIN_NODES {
        return Err(ValidationFailure::TooFewNodes(nodes));
    }
    let edges = beacon.edges().len();
    if edges < MIN_EDGES {
        return Err(ValidationFailure::TooFewEdges(edges));
    }
    let medium = beacon.medium();
    if !medium.is_supported() {
        return Err(ValidationFailure::UnsupportedMedium(medium));
    }
    Ok(())
}

/// Resolves beacons to join paths under a capability filter.
#[derive(Clone)]
pub struct CapabilityResolver {
    filter: Arc<dyn CapabilityFilter>,
}

impl CapabilityResolver {
    /// Create a resolver with the given capability filter.
    pub fn new(filter: Arc<dyn CapabilityFilter>) -> Self {
        Self { filter }
    }

    /// Create a resolver that accepts every capability.
    pub fn accept_all() -> Self {
        Self::new(Arc::new(AcceptAll))
    }

    /// Find a join path through the beacon's capability graph.
    pub fn resolve<B: Beacon + ?Sized>(&self, beacon: &B) -> Resolution {
        let graph = match validate(beacon).and_then(|()| CapabilityGraph::from_beacon(beacon)) {
            Ok(graph) => graph.reduce(self.filter.as_ref()),
            Err(failure) => {
                tracing::warn!(reason = %failure, "Bad beacon ignored");
                return Resolution::NoPath(NoPathReason::Invalid(failure));
            }
        };

        let goals = graph.goals();
        if goals.is_empty() {
            tracing::debug!("No joinable network in beacon");
            return Resolution::NoPath(NoPathReason::NoGoals);
        }

        let tree = graph.shortest_path_tree();
        let found = goals
            .iter()
            .map(|&goal| graph.path_to(&tree, goal))
            .find_map(|search| match search {
                GoalSearch::Reached(vertices) => Some(vertices),
                GoalSearch::Unreachable => None,
            });

        match found {
            Some(vertices) => {
                let steps = vertices
                    .iter()
                    .filter_map(|&v| graph.descriptor(v).cloned())
                    .collect();
                let path = JoinPath { vertices, steps };
                tracing::info!(path = %path, hops = path.hops(), "Can join");
                Resolution::Path(path)
            }
            None => Resolution::NoPath(NoPathReason::Unreachable { goals: goals.len() }),
        }
    }
}

impl Default for CapabilityResolver {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl fmt::Debug for CapabilityResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityResolver").finish_non_exhaustive()
    }
}
