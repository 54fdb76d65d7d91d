//! Netjoin Policy Replay Binary
//!
//! Drives the join policy from a stream of JSON-lines events on stdin and
//! writes one JSON outcome per event to stdout. Useful for exercising a
//! configuration against captured beacon traffic.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `NETJOIN_CONFIG`: path to a JSON policy config (default: built-in defaults)
//! - `RUST_LOG`: Log level filter (default: netjoin_policy=info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! Logs go to stderr so stdout stays machine-readable.
//!
//! ## Events
//!
//! ```text
//! {"event":"beacon","iface":"wlan0","beacon":{"medium":"wifi","nodes":[{"kind":"auth_provider","provider":"radius"},{"kind":"network","network":"campus"}],"edges":[{"from":0,"to":1},{"from":1,"to":2}]}}
//! {"event":"join_complete","iface":"wlan0","identity":"<hex>"}
//! {"event":"forget","iface":"wlan0","identity":"<hex>"}
//! {"event":"decay"}
//! ```
//!
//! ## Usage
//!
//! ```bash
//! NETJOIN_CONFIG=netjoin.json cargo run --bin netjoin_replay --features runtime < beacons.jsonl
//! ```

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use netjoin_policy::{
    spawn_decay, AffinityGate, Beacon, BeaconIdentity, CapabilityEdge, CapabilityNode,
    Interface, MediumType, NetDescriptor, NetjoinPolicy, PolicyConfig,
};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "netjoin_policy=info,netjoin_replay=info".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Beacon as written in replay input: nodes in decoded form.
#[derive(Debug, Deserialize)]
struct BeaconInput {
    medium: MediumType,
    #[serde(default)]
    link_address: Option<String>,
    #[serde(default)]
    nodes: Vec<CapabilityNode>,
    #[serde(default)]
    edges: Vec<CapabilityEdge>,
}

impl From<BeaconInput> for NetDescriptor {
    fn from(input: BeaconInput) -> Self {
        let mut descriptor = NetDescriptor::new(input.medium);
        if let Some(address) = input.link_address {
            descriptor = descriptor.with_link_address(address);
        }
        let descriptor = input
            .nodes
            .into_iter()
            .fold(descriptor, |d, node| d.with_node(node));
        input
            .edges
            .into_iter()
            .fold(descriptor, |d, edge| d.with_edge(edge.from, edge.to))
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ReplayEvent {
    Beacon { iface: Interface, beacon: BeaconInput },
    JoinComplete { iface: Interface, identity: BeaconIdentity },
    Forget { iface: Interface, identity: BeaconIdentity },
    Decay,
}

#[derive(Debug, Serialize)]
struct ReplayOutcome {
    line: usize,
    event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    iface: Option<Interface>,
    #[serde(skip_serializing_if = "Option::is_none")]
    identity: Option<BeaconIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    join: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    decision: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    currently_joined: Option<BeaconIdentity>,
}

impl ReplayOutcome {
    fn new(line: usize, event: &'static str) -> Self {
        Self {
            line,
            event,
            iface: None,
            identity: None,
            join: None,
            decision: None,
            detail: None,
            currently_joined: None,
        }
    }
}

fn apply(policy: &NetjoinPolicy, line: usize, event: ReplayEvent) -> ReplayOutcome {
    match event {
        ReplayEvent::Beacon { iface, beacon } => {
            let descriptor = NetDescriptor::from(beacon);
            let decision = policy.evaluate(&descriptor, &iface);
            ReplayOutcome {
                identity: Some(descriptor.identity()),
                join: Some(decision.should_join()),
                decision: Some(decision.label()),
                detail: Some(decision.to_string()),
                currently_joined: policy.currently_joined(&iface),
                iface: Some(iface),
                ..ReplayOutcome::new(line, "beacon")
            }
        }
        ReplayEvent::JoinComplete { iface, identity } => {
            policy.complete_join(&identity, &iface);
            ReplayOutcome {
                identity: Some(identity),
                currently_joined: policy.currently_joined(&iface),
                iface: Some(iface),
                ..ReplayOutcome::new(line, "join_complete")
            }
        }
        ReplayEvent::Forget { iface, identity } => {
            policy.forget(&identity, &iface);
            ReplayOutcome {
                identity: Some(identity),
                currently_joined: policy.currently_joined(&iface),
                iface: Some(iface),
                ..ReplayOutcome::new(line, "forget")
            }
        }
        ReplayEvent::Decay => {
            policy.affinity().decay();
            ReplayOutcome::new(line, "decay")
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = match std::env::var("NETJOIN_CONFIG") {
        Ok(path) if !path.is_empty() => {
            let config = PolicyConfig::from_path(&path)?;
            info!(path = %path, "Configuration loaded");
            config
        }
        _ => {
            info!("NETJOIN_CONFIG not set, using defaults");
            PolicyConfig::default()
        }
    };

    let policy = NetjoinPolicy::from_config(&config);
    let decay = spawn_decay(policy.affinity(), config.decay_interval());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0usize;
    let mut processed = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let event: ReplayEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed event");
                continue;
            }
        };

        let outcome = apply(&policy, line_no, event);
        println!("{}", serde_json::to_string(&outcome)?);
        processed += 1;
    }

    decay.abort();
    info!(
        events = processed,
        records = policy.records().len(),
        "Replay finished"
    );
    Ok(())
}
