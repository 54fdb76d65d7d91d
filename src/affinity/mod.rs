//! Affinity gate: decaying preference per (beacon, interface).
//!
//! The policy only relies on the [`AffinityGate`] contract. Every sighting
//! calls `update`; a joined interface switches networks only when
//! `prefer_over(candidate, incumbent)` says so; `decay` runs on a schedule the
//! policy does not own (see `spawn_decay` with the `runtime` feature).

pub mod decaying;
#[cfg(feature = "runtime")]
pub mod driver;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{BeaconIdentity, Interface};

pub use decaying::{AffinityConfig, DecayingAffinity};
#[cfg(feature = "runtime")]
pub use driver::spawn_decay;

/// A beacon as seen on one interface.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AffinityKey {
    /// Beacon identity.
    pub identity: BeaconIdentity,
    /// Interface it was seen on.
    pub iface: Interface,
}

impl AffinityKey {
    /// Create a new key.
    pub fn new(identity: BeaconIdentity, iface: Interface) -> Self {
        Self { identity, iface }
    }
}

impl fmt::Display for AffinityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.identity, self.iface)
    }
}

/// Preference arbiter between a candidate beacon and the joined incumbent.
///
/// `update`, `prefer_over` and `decay` may be called from any thread and must
/// be mutually exclusive with each other.
pub trait AffinityGate: Send + Sync {
    /// Record a sighting of `identity` on `iface`.
    fn update(&self, identity: &BeaconIdentity, iface: &Interface);

    /// Whether the candidate should displace the incumbent.
    fn prefer_over(&self, candidate: &AffinityKey, incumbent: &AffinityKey) -> bool;

    /// Age every score by one step.
    fn decay(&self);
}
