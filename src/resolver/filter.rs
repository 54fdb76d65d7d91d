//! Capability filters: which declared capabilities this node can satisfy.
//!
//! The resolver drops every vertex whose descriptor the filter rejects before
//! searching, so a path is only found through capabilities we can actually
//! provide.

use std::collections::BTreeSet;

use crate::config::CapabilityConfig;
use crate::types::CapabilityNode;

/// Predicate deciding whether a capability can be satisfied locally.
pub trait CapabilityFilter: Send + Sync {
    /// Return `true` to keep the node in the capability graph.
    fn admits(&self, node: &CapabilityNode) -> bool;
}

/// Keeps every node.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl CapabilityFilter for AcceptAll {
    fn admits(&self, _node: &CapabilityNode) -> bool {
        true
    }
}

/// Filter built from the supported auth providers and joinable networks.
///
/// A `None` list accepts every node of that kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfiguredFilter {
    auth_providers: Option<BTreeSet<String>>,
    networks: Option<BTreeSet<String>>,
}

impl ConfiguredFilter {
    /// Create a filter from explicit allow lists.
    pub fn new<P, N>(auth_providers: Option<P>, networks: Option<N>) -> Self
    where
        P: IntoIterator<Item = String>,
        N: IntoIterator<Item = String>,
    {
        Self {
            auth_providers: auth_providers.map(|p| p.into_iter().collect()),
            networks: networks.map(|n| n.into_iter().collect()),
        }
    }

    /// Create a filter from configuration.
    pub fn from_config(config: &CapabilityConfig) -> Self {
        Self::new(config.auth_providers.clone(), config.networks.clone())
    }

    /// Whether this filter keeps every node.
    pub fn is_accept_all(&self) -> bool {
        self.auth_providers.is_none() && self.networks.is_none()
    }
}

impl CapabilityFilter for ConfiguredFilter {
    fn admits(&self, node: &CapabilityNode) -> bool {
        match node {
            CapabilityNode::AuthProvider { provider } => self
                .auth_providers
                .as_ref()
                .map_or(true, |allowed| allowed.contains(provider)),
            CapabilityNode::Network { network } => self
                .networks
                .as_ref()
                .map_or(true, |allowed| allowed.contains(network)),
        }
    }
}
