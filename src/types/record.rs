//! Join state bookkeeping types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::beacon::{BeaconIdentity, Interface};

/// Where a (beacon, interface) pair stands in the join lifecycle.
///
/// A pair with no record is implicitly absent: never seen, or forgotten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinState {
    /// Decided to attempt a join.
    Joining,
    /// No viable capability path.
    Unjoinable,
    /// Join confirmed complete.
    Joined,
}

impl JoinState {
    /// Parse a join state from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "joining" => Some(Self::Joining),
            "unjoinable" => Some(Self::Unjoinable),
            "joined" => Some(Self::Joined),
            _ => None,
        }
    }
}

impl fmt::Display for JoinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Joining => write!(f, "JOINING"),
            Self::Unjoinable => write!(f, "UNJOINABLE"),
            Self::Joined => write!(f, "JOINED"),
        }
    }
}

/// One row of the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconRecord {
    /// Beacon the record is about.
    pub identity: BeaconIdentity,
    /// Interface the beacon was classified on.
    pub iface: Interface,
    /// Current join state.
    pub state: JoinState,
    /// When the beacon was classified.
    pub recorded_at: DateTime<Utc>,
    /// Last state change.
    pub updated_at: DateTime<Utc>,
}

impl BeaconRecord {
    /// Create a freshly classified record.
    pub fn new(identity: BeaconIdentity, iface: Interface, state: JoinState) -> Self {
        let now = Utc::now();
        Self {
            identity,
            iface,
            state,
            recorded_at: now,
            updated_at: now,
        }
    }

    /// Whether this record is for the given pair.
    pub fn is_for(&self, identity: &BeaconIdentity, iface: &Interface) -> bool {
        self.identity == *identity && self.iface == *iface
    }

    /// Move to a new state, returning the previous one.
    pub fn transition(&mut self, state: JoinState) -> JoinState {
        let previous = self.state;
        self.state = state;
        self.updated_at = Utc::now();
        previous
    }
}
