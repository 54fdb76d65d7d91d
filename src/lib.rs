//! # netjoin-policy
//!
//! Join decision core for a network-join daemon.
//!
//! The policy answers one question:
//!
//! > Given a beacon observed on a local interface, should we **attempt to join**
//! > the network it advertises?
//!
//! ## Core Contract
//!
//! 1. Every sighting feeds the affinity gate, joined or not
//! 2. A joined interface only switches networks if the candidate is preferred
//! 3. A beacon is classified at most once per interface (JOINING or UNJOINABLE)
//! 4. Classification resolves the beacon's capability graph: a join is
//!    attempted only if some target network is reachable from Start through
//!    capabilities we can satisfy
//!
//! ## Architecture
//!
//! ```text
//! Beacon ─→ NetjoinPolicy::decide ─→ AffinityGate (update / prefer_over)
//!                  │
//!                  ├─→ RecordStore (per-interface join state)
//!                  └─→ CapabilityResolver ─→ CapabilityGraph ─→ JoinPath
//! ```
//!
//! ## Concurrency
//!
//! All entry points take `&self`. The record store and the affinity table are
//! guarded by their own `parking_lot` locks, and decisions on one interface
//! never block decisions on another.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod resolver;
pub mod store;
pub mod affinity;
pub mod policy;
pub mod config;
pub mod canonical;

// Re-exports
pub use types::{
    Beacon, BeaconIdentity, Interface, MediumType, NetDescriptor, AuthCapabilities,
    CapabilityNode, CapabilityEdge, EncodedNode, WireError,
    JoinState, BeaconRecord,
};
pub use resolver::{
    CapabilityResolver, CapabilityGraph, JoinPath, Resolution, NoPathReason,
    ValidationFailure, CapabilityFilter, AcceptAll, ConfiguredFilter,
};
pub use store::{RecordStore, InMemoryRecordStore, StoreError};
pub use affinity::{AffinityGate, AffinityKey, AffinityConfig, DecayingAffinity};
#[cfg(feature = "runtime")]
pub use affinity::spawn_decay;
pub use policy::{NetjoinPolicy, Decision};
pub use config::{PolicyConfig, CapabilityConfig, ConfigError};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};
