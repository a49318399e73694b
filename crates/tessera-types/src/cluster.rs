//! Cluster directory.
//!
//! The directory is built once at startup and shared read-only between
//! concurrent ceremonies. Node order is significant: it is the order used
//! for keygen party lists and the first node serves identity-bridging
//! calls.

use serde::{Deserialize, Serialize};
use tessera_crypto::ed25519::VerifyingKey;
use tessera_crypto::CryptoError;

/// Cluster configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cluster has no nodes")]
    NoNodes,

    #[error("threshold {threshold} out of range for {nodes} nodes")]
    InvalidThreshold { threshold: usize, nodes: usize },

    #[error("ceremony ttl must be at least one second")]
    InvalidTtl,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("invalid key: {0}")]
    InvalidKey(#[from] CryptoError),
}

/// One signer node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Base URL, e.g. `https://mpc1-test.arthera.net`.
    pub endpoint: String,
    /// Long-lived Ed25519 key identifying the node to its peers.
    #[serde(with = "hex_key")]
    pub verifying_key: VerifyingKey,
}

impl NodeConfig {
    pub fn new(endpoint: impl Into<String>, verifying_key: VerifyingKey) -> Self {
        Self {
            endpoint: endpoint.into(),
            verifying_key,
        }
    }

    /// Parse a node from its endpoint and hex verifying key.
    pub fn from_hex(endpoint: impl Into<String>, verifying_key: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(endpoint, VerifyingKey::from_hex(verifying_key)?))
    }

    /// Absolute URL of `path` on this node.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), path)
    }
}

/// The relay that nodes use to reach each other.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    pub endpoint: String,
    #[serde(with = "hex_key")]
    pub verifying_key: VerifyingKey,
}

/// Immutable description of the signer cluster and protocol constants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClusterConfig {
    relay: RelayConfig,
    nodes: Vec<NodeConfig>,
    threshold: usize,
    ttl_secs: u64,
}

impl ClusterConfig {
    /// Validate and build a directory. Requires `1 <= threshold <= nodes`
    /// and a ttl of at least one second.
    pub fn new(
        relay: RelayConfig,
        nodes: Vec<NodeConfig>,
        threshold: usize,
        ttl_secs: u64,
    ) -> Result<Self, ConfigError> {
        if nodes.is_empty() {
            return Err(ConfigError::NoNodes);
        }
        if threshold == 0 || threshold > nodes.len() {
            return Err(ConfigError::InvalidThreshold {
                threshold,
                nodes: nodes.len(),
            });
        }
        if ttl_secs == 0 {
            return Err(ConfigError::InvalidTtl);
        }
        for node in &nodes {
            if !(node.endpoint.starts_with("http://") || node.endpoint.starts_with("https://")) {
                return Err(ConfigError::InvalidEndpoint(node.endpoint.clone()));
            }
        }
        Ok(Self {
            relay,
            nodes,
            threshold,
            ttl_secs,
        })
    }

    pub fn relay(&self) -> &RelayConfig {
        &self.relay
    }

    pub fn nodes(&self) -> &[NodeConfig] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&NodeConfig> {
        self.nodes.get(index)
    }

    /// Total node count `n`.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}

mod hex_key {
    use serde::{Deserialize, Deserializer, Serializer};
    use tessera_crypto::ed25519::VerifyingKey;

    pub fn serialize<S: Serializer>(key: &VerifyingKey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&key.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<VerifyingKey, D::Error> {
        let s = String::deserialize(deserializer)?;
        VerifyingKey::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
