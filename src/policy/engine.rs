//! Join policy engine.
//!
//! ## Decision Order
//!
//! For every beacon sighting on an interface:
//!
//! 1. Compute the beacon identity
//! 2. Update its affinity (always, whatever the outcome)
//! 3. If the interface is joined to a different beacon, keep the incumbent
//!    unless the affinity gate prefers the candidate
//! 4. Drop beacons already classified on this interface
//! 5. Resolve the capability graph: path → JOINING, no path → UNJOINABLE
//! 6. Record the classification, evicting the interface's previous record
//!
//! Steps 3-6 run under a per-interface guard so two sightings of the same
//! beacon on one interface cannot both be classified. Other interfaces are
//! never blocked.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use super::decision::Decision;
use crate::affinity::{AffinityGate, AffinityKey, DecayingAffinity};
use crate::config::PolicyConfig;
use crate::resolver::{CapabilityResolver, Resolution};
use crate::store::{InMemoryRecordStore, RecordStore};
use crate::types::{Beacon, BeaconIdentity, BeaconRecord, Interface, JoinState};

/// Join policy over a record store and an affinity gate.
///
/// No operation fails across this boundary: outcomes are return values and
/// lookup failures are logged no-ops.
pub struct NetjoinPolicy<S = InMemoryRecordStore, A = DecayingAffinity>
where
    S: RecordStore,
    A: AffinityGate,
{
    store: Arc<S>,
    affinity: Arc<A>,
    resolver: CapabilityResolver,
    guards: Mutex<HashMap<Interface, Arc<Mutex<()>>>>,
}

impl NetjoinPolicy {
    /// Create a policy with in-memory bookkeeping from configuration.
    pub fn from_config(config: &PolicyConfig) -> Self {
        tracing::info!(
            config_fingerprint = %config.fingerprint(),
            auth_providers = ?config.capabilities.auth_providers,
            networks = ?config.capabilities.networks,
            "Policy module initialized"
        );
        Self::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(DecayingAffinity::new(config.affinity.clone())),
            CapabilityResolver::new(config.capability_filter()),
        )
    }

    /// Create a policy with default configuration: accept every capability.
    pub fn with_defaults() -> Self {
        Self::from_config(&PolicyConfig::default())
    }
}

impl Default for NetjoinPolicy {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<S, A> NetjoinPolicy<S, A>
where
    S: RecordStore,
    A: AffinityGate,
{
    /// Create a policy from its collaborators.
    pub fn new(store: Arc<S>, affinity: Arc<A>, resolver: CapabilityResolver) -> Self {
        Self {
            store,
            affinity,
            resolver,
            guards: Mutex::new(HashMap::new()),
        }
    }

    /// Decide whether to join the network advertised by `beacon` on `iface`.
    pub fn decide<B: Beacon + ?Sized>(&self, beacon: &B, iface: &Interface) -> bool {
        self.evaluate(beacon, iface).should_join()
    }

    /// Decide, and report why.
    pub fn evaluate<B: Beacon + ?Sized>(&self, beacon: &B, iface: &Interface) -> Decision {
        let identity = beacon.identity();
        tracing::debug!(beacon = %identity, iface = %iface, descriptor = %beacon.describe(), "Beacon");

        // Irrespective of the decision, the sighting counts toward affinity
        self.affinity.update(&identity, iface);

        let guard = self.interface_guard(iface);
        let _serialized = guard.lock();

        if let Some(incumbent) = self.store.currently_joined(iface) {
            if incumbent != identity {
                let candidate = AffinityKey::new(identity, iface.clone());
                let joined = AffinityKey::new(incumbent, iface.clone());
                if !self.affinity.prefer_over(&candidate, &joined) {
                    tracing::debug!(beacon = %identity, incumbent = %incumbent, iface = %iface, "Incumbent preferred");
                    return Decision::IncumbentPreferred { incumbent };
                }
                // Tearing down the incumbent session is the caller's job
                tracing::info!(beacon = %identity, incumbent = %incumbent, iface = %iface, "Candidate preferred over incumbent");
            }
        }

        if let Some(state) = self.store.state_of(&identity, iface) {
            tracing::debug!(beacon = %identity, iface = %iface, state = %state, "Known beacon dropped");
            return Decision::Duplicate(state);
        }

        let decision = match self.resolver.resolve(beacon) {
            Resolution::Path(path) => {
                tracing::debug!(beacon = %identity, iface = %iface, "Joining");
                Decision::Join(path)
            }
            Resolution::NoPath(reason) => {
                tracing::debug!(beacon = %identity, iface = %iface, reason = %reason, "Unjoinable");
                Decision::Unjoinable(reason)
            }
        };

        let state = if decision.should_join() {
            JoinState::Joining
        } else {
            JoinState::Unjoinable
        };
        self.store.put(identity, iface, state);

        decision
    }

    /// Mark the network advertised by `identity` on `iface` as joined.
    ///
    /// Logs and does nothing if the pair has no record.
    pub fn complete_join(&self, identity: &BeaconIdentity, iface: &Interface) {
        let guard = self.interface_guard(iface);
        let _serialized = guard.lock();

        match self.store.set_state(identity, iface, JoinState::Joined) {
            Ok(previous) => {
                tracing::info!(beacon = %identity, iface = %iface, previous = %previous, "Joined network announced by beacon");
            }
            Err(e) => {
                tracing::error!(error = %e, "Join complete called for unknown beacon");
            }
        }
    }

    /// Whether the pair has been classified.
    pub fn is_known(&self, identity: &BeaconIdentity, iface: &Interface) -> bool {
        self.store.contains(identity, iface)
    }

    /// Drop the record for the pair.
    ///
    /// Logs and does nothing if the pair has no record.
    pub fn forget(&self, identity: &BeaconIdentity, iface: &Interface) {
        let guard = self.interface_guard(iface);
        let _serialized = guard.lock();

        match self.store.remove(identity, iface) {
            Ok(record) => {
                tracing::debug!(beacon = %identity, iface = %iface, state = %record.state, "Forgot beacon");
            }
            Err(e) => {
                tracing::error!(error = %e, "Removing non-existing beacon");
            }
        }
    }

    /// Beacon the interface is joined to, if any.
    pub fn currently_joined(&self, iface: &Interface) -> Option<BeaconIdentity> {
        self.store.currently_joined(iface)
    }

    /// State recorded for the pair.
    pub fn state_of(&self, identity: &BeaconIdentity, iface: &Interface) -> Option<JoinState> {
        self.store.state_of(identity, iface)
    }

    /// Snapshot of every record.
    pub fn records(&self) -> Vec<BeaconRecord> {
        self.store.records()
    }

    /// Get a reference to the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Shared handle to the affinity gate, e.g. for a decay driver.
    pub fn affinity(&self) -> Arc<A> {
        Arc::clone(&self.affinity)
    }

    /// Get the resolver.
    pub fn resolver(&self) -> &CapabilityResolver {
        &self.resolver
    }

    fn interface_guard(&self, iface: &Interface) -> Arc<Mutex<()>> {
        Arc::clone(self.guards.lock().entry(iface.clone()).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affinity::AffinityConfig;
    use crate::types::{CapabilityNode, MediumType, NetDescriptor};
    use std::thread;

    fn joinable(network: &str) -> NetDescriptor {
        NetDescriptor::new(MediumType::Wifi)
            .with_node(CapabilityNode::auth_provider("radius"))
            .with_node(CapabilityNode::network(network))
            .with_edge(0, 1)
            .with_edge(1, 2)
    }

    fn wlan() -> Interface {
        Interface::new("wlan0")
    }

    #[test]
    fn test_evaluate_reports_path() {
        let policy = NetjoinPolicy::with_defaults();
        let decision = policy.evaluate(&joinable("campus"), &wlan());

        let Decision::Join(path) = decision else {
            panic!("expected join, got {:?}", decision);
        };
        assert_eq!(path.target(), Some(&CapabilityNode::network("campus")));
    }

    #[test]
    fn test_duplicate_reports_state() {
        let policy = NetjoinPolicy::with_defaults();
        let beacon = joinable("campus");
        policy.decide(&beacon, &wlan());

        assert_eq!(
            policy.evaluate(&beacon, &wlan()),
            Decision::Duplicate(JoinState::Joining)
        );
    }

    #[test]
    fn test_same_beacon_on_two_interfaces_classified_twice() {
        let policy = NetjoinPolicy::with_defaults();
        let beacon = joinable("campus");

        assert!(policy.decide(&beacon, &wlan()));
        assert!(policy.decide(&beacon, &Interface::new("eth0")));
        assert_eq!(policy.records().len(), 2);
    }

    #[test]
    fn test_joined_incumbent_seen_again_is_duplicate() {
        let policy = NetjoinPolicy::with_defaults();
        let beacon = joinable("campus");
        policy.decide(&beacon, &wlan());
        policy.complete_join(&beacon.identity(), &wlan());

        assert_eq!(
            policy.evaluate(&beacon, &wlan()),
            Decision::Duplicate(JoinState::Joined)
        );
    }

    #[test]
    fn test_preferred_candidate_replaces_incumbent() {
        let config = PolicyConfig {
            affinity: AffinityConfig {
                switch_margin: 0.0,
                ..AffinityConfig::default()
            },
            ..PolicyConfig::default()
        };
        let policy = NetjoinPolicy::from_config(&config);
        let incumbent = joinable("campus");
        let candidate = joinable("guest");

        policy.decide(&incumbent, &wlan());
        policy.complete_join(&incumbent.identity(), &wlan());

        // Equal scores, zero margin: candidate wins
        assert!(policy.decide(&candidate, &wlan()));
        assert!(!policy.is_known(&incumbent.identity(), &wlan()));
        assert_eq!(policy.currently_joined(&wlan()), None);
    }

    #[test]
    fn test_forget_then_reclassify() {
        let policy = NetjoinPolicy::with_defaults();
        let beacon = joinable("campus");
        policy.decide(&beacon, &wlan());

        policy.forget(&beacon.identity(), &wlan());
        assert!(!policy.is_known(&beacon.identity(), &wlan()));
        assert!(policy.decide(&beacon, &wlan()));
    }

    #[test]
    fn test_forget_unknown_is_noop() {
        let policy = NetjoinPolicy::with_defaults();
        let beacon = joinable("campus");
        policy.decide(&beacon, &wlan());

        policy.forget(&joinable("other").identity(), &wlan());
        assert!(policy.is_known(&beacon.identity(), &wlan()));
    }

    #[test]
    fn test_concurrent_sightings_classify_once() {
        let policy = Arc::new(NetjoinPolicy::with_defaults());
        let beacon = joinable("campus");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let policy = Arc::clone(&policy);
                let beacon = beacon.clone();
                thread::spawn(move || policy.decide(&beacon, &wlan()))
            })
            .collect();

        let joins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&joined| joined)
            .count();
        assert_eq!(joins, 1);
    }
}
