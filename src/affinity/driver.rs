//! Periodic decay driver for affinity gates.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::AffinityGate;

/// Run `gate.decay()` every `period` on the current tokio runtime.
///
/// The first decay happens one full period after spawning. Abort the returned
/// handle to stop the driver.
pub fn spawn_decay<G>(gate: Arc<G>, period: Duration) -> JoinHandle<()>
where
    G: AffinityGate + ?Sized + 'static,
{
    let period = period.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            gate.decay();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affinity::{AffinityConfig, AffinityKey, DecayingAffinity};
    use crate::types::{BeaconIdentity, Interface};

    #[tokio::test(start_paused = true)]
    async fn test_driver_decays_on_schedule() {
        let gate = Arc::new(DecayingAffinity::new(AffinityConfig::default()));
        let key = AffinityKey::new(BeaconIdentity::from_bytes([7; 32]), Interface::new("wlan0"));
        for _ in 0..8 {
            gate.update(&key.identity, &key.iface);
        }

        let handle = spawn_decay(Arc::clone(&gate), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(25)).await;

        // Two decays: 8 -> 4 -> 2
        assert_eq!(gate.score(&key), 2.0);
        handle.abort();
    }
}
