//! In-memory record store.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::types::{BeaconIdentity, BeaconRecord, Interface, JoinState};
use super::RecordStore;

/// Error type for in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No record for the pair.
    #[error("No record for beacon {identity} on interface {iface}")]
    NotFound {
        /// Beacon looked up.
        identity: BeaconIdentity,
        /// Interface looked up.
        iface: Interface,
    },
}

impl StoreError {
    fn not_found(identity: &BeaconIdentity, iface: &Interface) -> Self {
        Self::NotFound {
            identity: *identity,
            iface: iface.clone(),
        }
    }
}

/// Per-interface slot. Eviction-on-put means an interface never holds more
/// than one record, so the slot is the whole table for that interface.
type Slot = Arc<Mutex<Option<BeaconRecord>>>;

/// In-memory record store.
///
/// The interface map is behind a `RwLock` that is only written when a new
/// interface first appears; every record operation then locks just its
/// interface's slot, so interfaces never contend with each other.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    slots: RwLock<HashMap<Interface, Slot>>,
}

impl InMemoryRecordStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of records.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| slot.lock().is_some())
            .count()
    }

    /// Check if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, iface: &Interface) -> Option<Slot> {
        self.slots.read().get(iface).cloned()
    }

    fn slot_or_insert(&self, iface: &Interface) -> Slot {
        if let Some(slot) = self.slot(iface) {
            return slot;
        }
        Arc::clone(self.slots.write().entry(iface.clone()).or_default())
    }
}

impl RecordStore for InMemoryRecordStore {
    type Error = StoreError;

    fn put(&self, identity: BeaconIdentity, iface: &Interface, state: JoinState) -> Option<BeaconRecord> {
        let slot = self.slot_or_insert(iface);
        let mut current = slot.lock();

        let evicted = current.replace(BeaconRecord::new(identity, iface.clone(), state));
        match &evicted {
            Some(old) if old.identity == identity => {
                tracing::debug!(beacon = %identity, iface = %iface, state = %state, "Replace beacon");
            }
            Some(old) => {
                tracing::debug!(beacon = %old.identity, iface = %iface, state = %old.state, "Removed beacon");
            }
            None => {}
        }
        evicted
    }

    fn contains(&self, identity: &BeaconIdentity, iface: &Interface) -> bool {
        self.state_of(identity, iface).is_some()
    }

    fn state_of(&self, identity: &BeaconIdentity, iface: &Interface) -> Option<JoinState> {
        let slot = self.slot(iface)?;
        let current = slot.lock();
        current
            .as_ref()
            .filter(|record| record.is_for(identity, iface))
            .map(|record| record.state)
    }

    fn remove(&self, identity: &BeaconIdentity, iface: &Interface) -> Result<BeaconRecord, Self::Error> {
        let slot = self
            .slot(iface)
            .ok_or_else(|| StoreError::not_found(identity, iface))?;
        let mut current = slot.lock();

        match current.as_ref() {
            Some(record) if record.is_for(identity, iface) => {
                current.take().ok_or_else(|| StoreError::not_found(identity, iface))
            }
            _ => Err(StoreError::not_found(identity, iface)),
        }
    }

    fn currently_joined(&self, iface: &Interface) -> Option<BeaconIdentity> {
        let slot = self.slot(iface)?;
        let current = slot.lock();
        current
            .as_ref()
            .filter(|record| record.state == JoinState::Joined)
            .map(|record| record.identity)
    }

    fn set_state(
        &self,
        identity: &BeaconIdentity,
        iface: &Interface,
        state: JoinState,
    ) -> Result<JoinState, Self::Error> {
        let slot = self
            .slot(iface)
            .ok_or_else(|| StoreError::not_found(identity, iface))?;
        let mut current = slot.lock();

        match current.as_mut() {
            Some(record) if record.is_for(identity, iface) => Ok(record.transition(state)),
            _ => Err(StoreError::not_found(identity, iface)),
        }
    }

    fn records(&self) -> Vec<BeaconRecord> {
        let mut records: Vec<BeaconRecord> = self
            .slots
            .read()
            .values()
            .filter_map(|slot| slot.lock().clone())
            .collect();

        // Sort for determinism
        records.sort_by(|a, b| a.iface.cmp(&b.iface).then_with(|| a.identity.cmp(&b.identity)));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn id(n: u8) -> BeaconIdentity {
        BeaconIdentity::from_bytes([n; 32])
    }

    fn wlan() -> Interface {
        Interface::new("wlan0")
    }

    #[test]
    fn test_put_and_contains() {
        let store = InMemoryRecordStore::new();
        assert!(store.put(id(1), &wlan(), JoinState::Joining).is_none());

        assert!(store.contains(&id(1), &wlan()));
        assert!(!store.contains(&id(1), &Interface::new("eth0")));
        assert!(!store.contains(&id(2), &wlan()));
        assert_eq!(store.state_of(&id(1), &wlan()), Some(JoinState::Joining));
    }

    #[test]
    fn test_put_evicts_other_identity_on_interface() {
        let store = InMemoryRecordStore::new();
        store.put(id(1), &wlan(), JoinState::Joined);

        let evicted = store.put(id(2), &wlan(), JoinState::Unjoinable).unwrap();

        assert_eq!(evicted.identity, id(1));
        assert!(!store.contains(&id(1), &wlan()));
        assert!(store.contains(&id(2), &wlan()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_leaves_other_interfaces_alone() {
        let store = InMemoryRecordStore::new();
        store.put(id(1), &wlan(), JoinState::Joining);
        store.put(id(1), &Interface::new("eth0"), JoinState::Joining);

        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_put_same_identity_replaces() {
        let store = InMemoryRecordStore::new();
        store.put(id(1), &wlan(), JoinState::Joining);
        let replaced = store.put(id(1), &wlan(), JoinState::Unjoinable).unwrap();

        assert_eq!(replaced.state, JoinState::Joining);
        assert_eq!(store.state_of(&id(1), &wlan()), Some(JoinState::Unjoinable));
    }

    #[test]
    fn test_remove() {
        let store = InMemoryRecordStore::new();
        store.put(id(1), &wlan(), JoinState::Joining);

        let removed = store.remove(&id(1), &wlan()).unwrap();
        assert_eq!(removed.identity, id(1));
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_absent_is_lookup_error() {
        let store = InMemoryRecordStore::new();
        assert_eq!(
            store.remove(&id(1), &wlan()),
            Err(StoreError::NotFound { identity: id(1), iface: wlan() })
        );

        store.put(id(2), &wlan(), JoinState::Joining);
        assert!(store.remove(&id(1), &wlan()).is_err());
        assert!(store.contains(&id(2), &wlan()));
    }

    #[test]
    fn test_set_state_and_currently_joined() {
        let store = InMemoryRecordStore::new();
        store.put(id(1), &wlan(), JoinState::Joining);
        assert_eq!(store.currently_joined(&wlan()), None);

        let previous = store.set_state(&id(1), &wlan(), JoinState::Joined).unwrap();

        assert_eq!(previous, JoinState::Joining);
        assert_eq!(store.currently_joined(&wlan()), Some(id(1)));
        assert_eq!(store.currently_joined(&Interface::new("eth0")), None);
    }

    #[test]
    fn test_set_state_does_not_create() {
        let store = InMemoryRecordStore::new();
        assert!(store.set_state(&id(1), &wlan(), JoinState::Joined).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_records_sorted() {
        let store = InMemoryRecordStore::new();
        store.put(id(3), &Interface::new("wlan1"), JoinState::Joining);
        store.put(id(1), &Interface::new("eth0"), JoinState::Unjoinable);
        store.put(id(2), &Interface::new("dsrc0"), JoinState::Joining);

        let ifaces: Vec<_> = store.records().into_iter().map(|r| r.iface).collect();
        assert_eq!(
            ifaces,
            vec![Interface::new("dsrc0"), Interface::new("eth0"), Interface::new("wlan1")]
        );
    }

    #[test]
    fn test_concurrent_puts_keep_one_record_per_interface() {
        let store = Arc::new(InMemoryRecordStore::new());

        let handles: Vec<_> = (0..8u8)
            .map(|n| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..100 {
                        store.put(id(n), &wlan(), JoinState::Joining);
                        assert!(store.records().iter().filter(|r| r.iface == wlan()).count() <= 1);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 1);
    }
}
