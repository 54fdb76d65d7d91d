//! Additive, multiplicatively decaying affinity scores.
//!
//! ## Scoring
//!
//! ```text
//! update:      score = min(score + increment, ceiling)
//! decay:       score = score * decay_factor      (dropped below eviction_floor)
//! prefer_over: candidate - incumbent >= switch_margin
//! ```
//!
//! A beacon never seen scores 0. With the defaults a freshly seen candidate
//! cannot displace an incumbent that is still being heard.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{AffinityGate, AffinityKey};
use crate::types::{BeaconIdentity, Interface};

/// Tuning for [`DecayingAffinity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffinityConfig {
    /// Score added per sighting.
    pub increment: f64,
    /// Score cap.
    pub ceiling: f64,
    /// Multiplier applied by each decay step (0.0-1.0).
    pub decay_factor: f64,
    /// Scores below this are forgotten after decay.
    pub eviction_floor: f64,
    /// Lead a candidate needs over the incumbent to be preferred.
    pub switch_margin: f64,
}

impl Default for AffinityConfig {
    fn default() -> Self {
        Self {
            increment: 1.0,
            ceiling: 10.0,
            decay_factor: 0.5,
            eviction_floor: 0.1,
            switch_margin: 1.0,
        }
    }
}

/// Affinity table guarded by a single mutex.
#[derive(Debug, Default)]
pub struct DecayingAffinity {
    config: AffinityConfig,
    scores: Mutex<HashMap<AffinityKey, f64>>,
}

impl DecayingAffinity {
    /// Create an empty table.
    pub fn new(mut config: AffinityConfig) -> Self {
        config.decay_factor = config.decay_factor.clamp(0.0, 1.0);
        config.increment = config.increment.max(0.0);
        Self {
            config,
            scores: Mutex::new(HashMap::new()),
        }
    }

    /// Get the configuration in force.
    pub fn config(&self) -> &AffinityConfig {
        &self.config
    }

    /// Current score for a key (0 if unknown).
    pub fn score(&self, key: &AffinityKey) -> f64 {
        self.scores.lock().get(key).copied().unwrap_or(0.0)
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.scores.lock().len()
    }

    /// Whether no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.scores.lock().is_empty()
    }
}

impl AffinityGate for DecayingAffinity {
    fn update(&self, identity: &BeaconIdentity, iface: &Interface) {
        let key = AffinityKey::new(*identity, iface.clone());
        let mut scores = self.scores.lock();
        let score = scores.entry(key).or_insert(0.0);
        *score = (*score + self.config.increment).min(self.config.ceiling);
    }

    fn prefer_over(&self, candidate: &AffinityKey, incumbent: &AffinityKey) -> bool {
        let scores = self.scores.lock();
        let candidate_score = scores.get(candidate).copied().unwrap_or(0.0);
        let incumbent_score = scores.get(incumbent).copied().unwrap_or(0.0);
        let preferred = candidate_score - incumbent_score >= self.config.switch_margin;

        tracing::debug!(
            candidate = %candidate,
            candidate_score,
            incumbent = %incumbent,
            incumbent_score,
            preferred,
            "Affinity arbitration"
        );
        preferred
    }

    fn decay(&self) {
        let factor = self.config.decay_factor;
        let floor = self.config.eviction_floor;
        let mut scores = self.scores.lock();
        let before = scores.len();

        scores.retain(|_, score| {
            *score *= factor;
            *score >= floor
        });

        if scores.len() != before {
            tracing::trace!(evicted = before - scores.len(), remaining = scores.len(), "Affinity decayed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn key(n: u8, iface: &str) -> AffinityKey {
        AffinityKey::new(BeaconIdentity::from_bytes([n; 32]), Interface::new(iface))
    }

    fn seen(gate: &DecayingAffinity, k: &AffinityKey, times: usize) {
        for _ in 0..times {
            gate.update(&k.identity, &k.iface);
        }
    }

    #[test]
    fn test_update_accumulates_to_ceiling() {
        let gate = DecayingAffinity::new(AffinityConfig::default());
        let k = key(1, "wlan0");

        seen(&gate, &k, 3);
        assert_eq!(gate.score(&k), 3.0);

        seen(&gate, &k, 50);
        assert_eq!(gate.score(&k), 10.0);
    }

    #[test]
    fn test_scores_are_per_interface() {
        let gate = DecayingAffinity::new(AffinityConfig::default());
        seen(&gate, &key(1, "wlan0"), 2);

        assert_eq!(gate.score(&key(1, "eth0")), 0.0);
    }

    #[test]
    fn test_prefer_over_requires_margin() {
        let gate = DecayingAffinity::new(AffinityConfig::default());
        let incumbent = key(1, "wlan0");
        let candidate = key(2, "wlan0");

        seen(&gate, &incumbent, 3);
        seen(&gate, &candidate, 3);
        assert!(!gate.prefer_over(&candidate, &incumbent));

        seen(&gate, &candidate, 1);
        assert!(gate.prefer_over(&candidate, &incumbent));
    }

    #[test]
    fn test_unknown_incumbent_scores_zero() {
        let gate = DecayingAffinity::new(AffinityConfig::default());
        let candidate = key(2, "wlan0");
        seen(&gate, &candidate, 1);

        assert!(gate.prefer_over(&candidate, &key(1, "wlan0")));
    }

    #[test]
    fn test_decay_halves_and_evicts() {
        let gate = DecayingAffinity::new(AffinityConfig::default());
        let strong = key(1, "wlan0");
        let weak = key(2, "wlan0");
        seen(&gate, &strong, 4);
        seen(&gate, &weak, 1);

        gate.decay();
        assert_eq!(gate.score(&strong), 2.0);
        assert_eq!(gate.score(&weak), 0.5);

        for _ in 0..3 {
            gate.decay();
        }
        // 0.5 -> 0.0625 is below the floor
        assert_eq!(gate.score(&weak), 0.0);
        assert_eq!(gate.len(), 1);
    }

    #[test]
    fn test_decay_factor_clamped() {
        let gate = DecayingAffinity::new(AffinityConfig {
            decay_factor: 3.0,
            ..AffinityConfig::default()
        });
        assert_eq!(gate.config().decay_factor, 1.0);
    }

    #[test]
    fn test_concurrent_update_and_decay() {
        let gate = Arc::new(DecayingAffinity::new(AffinityConfig {
            eviction_floor: 0.0,
            ..AffinityConfig::default()
        }));
        let k = key(1, "wlan0");

        let updater = {
            let gate = Arc::clone(&gate);
            let k = k.clone();
            thread::spawn(move || seen(&gate, &k, 1000))
        };
        let decayer = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                for _ in 0..1000 {
                    gate.decay();
                }
            })
        };
        updater.join().unwrap();
        decayer.join().unwrap();

        let score = gate.score(&k);
        assert!((0.0..=10.0).contains(&score));
    }
}
