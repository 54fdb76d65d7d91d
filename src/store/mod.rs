//! Beacon record storage.

pub mod memory;

use crate::types::{BeaconIdentity, BeaconRecord, Interface, JoinState};

/// Trait for beacon record backends.
///
/// Implementations must keep at most one record per interface: `put` evicts
/// whatever the interface held before inserting, atomically with respect to
/// other calls on the same interface.
pub trait RecordStore: Send + Sync {
    /// Error type for lookups on absent records.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Record a classification, evicting any record on the same interface.
    ///
    /// Returns the evicted record, if any.
    fn put(&self, identity: BeaconIdentity, iface: &Interface, state: JoinState) -> Option<BeaconRecord>;

    /// Check whether a record exists for the pair.
    fn contains(&self, identity: &BeaconIdentity, iface: &Interface) -> bool;

    /// Fetch the state recorded for the pair.
    fn state_of(&self, identity: &BeaconIdentity, iface: &Interface) -> Option<JoinState>;

    /// Remove the record for the pair.
    fn remove(&self, identity: &BeaconIdentity, iface: &Interface) -> Result<BeaconRecord, Self::Error>;

    /// Identity of the JOINED record on the interface, if any.
    fn currently_joined(&self, iface: &Interface) -> Option<BeaconIdentity>;

    /// Update the state of an existing record, returning the previous state.
    fn set_state(
        &self,
        identity: &BeaconIdentity,
        iface: &Interface,
        state: JoinState,
    ) -> Result<JoinState, Self::Error>;

    /// Snapshot of all records, ordered by (interface, identity).
    fn records(&self) -> Vec<BeaconRecord>;
}

pub use memory::{InMemoryRecordStore, StoreError};
