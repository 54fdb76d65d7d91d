//! Core types for the join policy.

pub mod beacon;
pub mod record;

pub use beacon::{
    Beacon, BeaconIdentity, Interface, MediumType, NetDescriptor, AuthCapabilities,
    CapabilityNode, CapabilityEdge, EncodedNode, WireError,
};
pub use record::{JoinState, BeaconRecord};
