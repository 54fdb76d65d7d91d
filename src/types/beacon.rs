//! Beacon types: interfaces, identities, capability nodes and the
//! `NetDescriptor` advertised by neighboring nodes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::canonical::to_canonical_bytes;

/// Local network attachment point on which beacons are observed.
///
/// Opaque to the policy: only equality and hashing are used.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Interface(String);

impl Interface {
    /// Create an interface identifier from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the interface name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Interface {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Interface {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Stable identity of a beacon, derived from its content.
///
/// SHA-256 over the canonical serialization of the advertised descriptor.
/// Serializes as a lowercase hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BeaconIdentity([u8; 32]);

impl BeaconIdentity {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Digest arbitrary beacon content into an identity.
    pub fn digest(content: &[u8]) -> Self {
        let digest = Sha256::digest(content);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Parse an identity from its 64-character hex form.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Get the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for BeaconIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for BeaconIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BeaconIdentity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Link-layer technology a beacon was advertised over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediumType {
    /// Not set by the advertiser.
    Unspecified,
    /// Wired Ethernet.
    Ethernet,
    /// 802.11 WiFi.
    Wifi,
    /// Short-range vehicular radio (802.11p).
    Dsrc,
    /// Any other wire value.
    Other(u32),
}

impl MediumType {
    /// Media the policy knows how to join over.
    pub const SUPPORTED: [MediumType; 3] = [Self::Ethernet, Self::Wifi, Self::Dsrc];

    /// Check whether this medium is in the supported set.
    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED.contains(self)
    }
}

impl Default for MediumType {
    fn default() -> Self {
        Self::Unspecified
    }
}

impl fmt::Display for MediumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "unspecified"),
            Self::Ethernet => write!(f, "ethernet"),
            Self::Wifi => write!(f, "wifi"),
            Self::Dsrc => write!(f, "dsrc"),
            Self::Other(code) => write!(f, "other({})", code),
        }
    }
}

/// Error decoding a capability node from its wire form.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The node bytes do not decode to a known descriptor.
    #[error("Malformed capability node: {0}")]
    MalformedNode(#[from] serde_json::Error),
}

/// One step in the path to joining a network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapabilityNode {
    /// Authentication provider that must be satisfied.
    AuthProvider {
        /// Provider name.
        provider: String,
    },
    /// Joinable network. These are the search targets.
    Network {
        /// Network name.
        network: String,
    },
}

impl CapabilityNode {
    /// Create an auth provider node.
    pub fn auth_provider(provider: impl Into<String>) -> Self {
        Self::AuthProvider { provider: provider.into() }
    }

    /// Create a target network node.
    pub fn network(network: impl Into<String>) -> Self {
        Self::Network { network: network.into() }
    }

    /// Whether joining this node means joining a network.
    pub fn is_target(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Encode to the opaque wire form.
    pub fn encode(&self) -> EncodedNode {
        EncodedNode(to_canonical_bytes(self))
    }

    /// Decode from the opaque wire form.
    pub fn decode(encoded: &EncodedNode) -> Result<Self, WireError> {
        Ok(serde_json::from_slice(&encoded.0)?)
    }
}

impl fmt::Display for CapabilityNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthProvider { provider } => write!(f, "auth:{}", provider),
            Self::Network { network } => write!(f, "net:{}", network),
        }
    }
}

/// Capability node in wire form. Serializes as a hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedNode(Vec<u8>);

impl EncodedNode {
    /// Wrap raw wire bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get the raw wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&CapabilityNode> for EncodedNode {
    fn from(node: &CapabilityNode) -> Self {
        node.encode()
    }
}

impl Serialize for EncodedNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for EncodedNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map(Self).map_err(serde::de::Error::custom)
    }
}

/// Directed edge between declared nodes, prerequisite to dependent.
///
/// Index 0 is the synthetic Start vertex; index `i > 0` is the `i`-th
/// declared node (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilityEdge {
    /// Prerequisite vertex index.
    pub from: usize,
    /// Dependent vertex index.
    pub to: usize,
}

impl CapabilityEdge {
    /// Create a new edge.
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

/// What every beacon must expose to the policy.
pub trait Beacon {
    /// Content-derived identity, stable across identical sightings.
    fn identity(&self) -> BeaconIdentity;

    /// Human-readable summary for diagnostics.
    fn describe(&self) -> String;

    /// Declared capability nodes, in order.
    fn nodes(&self) -> &[EncodedNode];

    /// Declared edges, in order.
    fn edges(&self) -> &[CapabilityEdge];

    /// Medium the beacon was advertised over.
    fn medium(&self) -> MediumType;
}

/// Capability topology advertised in a beacon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCapabilities {
    /// Declared nodes.
    #[serde(default)]
    pub nodes: Vec<EncodedNode>,
    /// Declared edges.
    #[serde(default)]
    pub edges: Vec<CapabilityEdge>,
}

/// Network descriptor carried in a beacon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetDescriptor {
    /// Advertised medium.
    pub medium: MediumType,
    /// Link-layer address of the advertiser, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_address: Option<String>,
    /// Capability topology.
    #[serde(default)]
    pub auth_cap: AuthCapabilities,
}

impl NetDescriptor {
    /// Create an empty descriptor for a medium.
    pub fn new(medium: MediumType) -> Self {
        Self {
            medium,
            link_address: None,
            auth_cap: AuthCapabilities::default(),
        }
    }

    /// Set the advertiser's link-layer address.
    pub fn with_link_address(mut self, address: impl Into<String>) -> Self {
        self.link_address = Some(address.into());
        self
    }

    /// Append a capability node.
    pub fn with_node(mut self, node: CapabilityNode) -> Self {
        self.auth_cap.nodes.push(node.encode());
        self
    }

    /// Append a node already in wire form.
    pub fn with_encoded_node(mut self, node: EncodedNode) -> Self {
        self.auth_cap.nodes.push(node);
        self
    }

    /// Append an edge.
    pub fn with_edge(mut self, from: usize, to: usize) -> Self {
        self.auth_cap.edges.push(CapabilityEdge::new(from, to));
        self
    }
}

impl Beacon for NetDescriptor {
    fn identity(&self) -> BeaconIdentity {
        BeaconIdentity::digest(&to_canonical_bytes(self))
    }

    fn describe(&self) -> String {
        let nodes: Vec<String> = self
            .auth_cap
            .nodes
            .iter()
            .map(|n| match CapabilityNode::decode(n) {
                Ok(node) => node.to_string(),
                Err(_) => "?".to_string(),
            })
            .collect();
        let edges: Vec<String> = self
            .auth_cap
            .edges
            .iter()
            .map(|e| format!("{}->{}", e.from, e.to))
            .collect();

        format!(
            "medium={} link={} nodes=[{}] edges=[{}]",
            self.medium,
            self.link_address.as_deref().unwrap_or("-"),
            nodes.join(", "),
            edges.join(", "),
        )
    }

    fn nodes(&self) -> &[EncodedNode] {
        &self.auth_cap.nodes
    }

    fn edges(&self) -> &[CapabilityEdge] {
        &self.auth_cap.edges
    }

    fn medium(&self) -> MediumType {
        self.medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campus() -> NetDescriptor {
        NetDescriptor::new(MediumType::Wifi)
            .with_link_address("02:00:00:00:00:01")
            .with_node(CapabilityNode::auth_provider("radius"))
            .with_node(CapabilityNode::network("campus"))
            .with_edge(0, 1)
            .with_edge(1, 2)
    }

    #[test]
    fn test_identity_stable_across_sightings() {
        assert_eq!(campus().identity(), campus().identity());
    }

    #[test]
    fn test_identity_tracks_content() {
        let other = campus().with_edge(0, 2);
        assert_ne!(campus().identity(), other.identity());
    }

    #[test]
    fn test_identity_hex_roundtrip() {
        let id = campus().identity();
        assert_eq!(id.to_hex().len(), 64);
        assert_eq!(BeaconIdentity::from_hex(&id.to_hex()).unwrap(), id);
        assert!(BeaconIdentity::from_hex("abc").is_err());
    }

    #[test]
    fn test_node_codec() {
        let node = CapabilityNode::network("campus");
        let decoded = CapabilityNode::decode(&node.encode()).unwrap();
        assert_eq!(decoded, node);
        assert!(decoded.is_target());
        assert!(!CapabilityNode::auth_provider("radius").is_target());
    }

    #[test]
    fn test_node_decode_rejects_garbage() {
        let garbage = EncodedNode::from_bytes(vec![0xff, 0x00, 0x13]);
        assert!(matches!(
            CapabilityNode::decode(&garbage),
            Err(WireError::MalformedNode(_))
        ));
    }

    #[test]
    fn test_descriptor_json_roundtrip_keeps_identity() {
        let d = campus();
        let json = serde_json::to_string(&d).unwrap();
        let back: NetDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back.identity(), d.identity());
    }

    #[test]
    fn test_supported_media() {
        assert!(MediumType::Ethernet.is_supported());
        assert!(MediumType::Wifi.is_supported());
        assert!(MediumType::Dsrc.is_supported());
        assert!(!MediumType::Unspecified.is_supported());
        assert!(!MediumType::Other(7).is_supported());
    }

    #[test]
    fn test_describe() {
        let text = campus().describe();
        assert!(text.contains("medium=wifi"));
        assert!(text.contains("auth:radius, net:campus"));
        assert!(text.contains("0->1, 1->2"));
    }
}
