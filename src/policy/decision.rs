//! Decision outcomes.

use std::fmt;

use crate::resolver::{JoinPath, NoPathReason};
use crate::types::{BeaconIdentity, JoinState};

/// What the policy concluded about one beacon sighting, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Attempt to join along this path. Recorded as JOINING.
    Join(JoinPath),
    /// No viable path. Recorded as UNJOINABLE.
    Unjoinable(NoPathReason),
    /// Already classified on this interface; nothing recorded.
    Duplicate(JoinState),
    /// The interface stays with its joined incumbent; nothing recorded.
    IncumbentPreferred {
        /// Beacon the interface is joined to.
        incumbent: BeaconIdentity,
    },
}

impl Decision {
    /// Whether the caller should start a join.
    pub fn should_join(&self) -> bool {
        matches!(self, Self::Join(_))
    }

    /// State this decision wrote to the store, if it classified the beacon.
    pub fn recorded_state(&self) -> Option<JoinState> {
        match self {
            Self::Join(_) => Some(JoinState::Joining),
            Self::Unjoinable(_) => Some(JoinState::Unjoinable),
            Self::Duplicate(_) | Self::IncumbentPreferred { .. } => None,
        }
    }

    /// Short machine-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::Unjoinable(_) => "unjoinable",
            Self::Duplicate(_) => "duplicate",
            Self::IncumbentPreferred { .. } => "incumbent_preferred",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Join(path) => write!(f, "join via {}", path),
            Self::Unjoinable(reason) => write!(f, "unjoinable: {}", reason),
            Self::Duplicate(state) => write!(f, "duplicate (already {})", state),
            Self::IncumbentPreferred { incumbent } => {
                write!(f, "staying with incumbent {}", incumbent)
            }
        }
    }
}
