//! Configuration file management.
//!
//! The file is optional: every section falls back to the public test
//! cluster when it is absent.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tessera_ceremony::CeremonyOptions;
use tessera_crypto::address::Address;
use tessera_crypto::ed25519::VerifyingKey;
use tessera_identity::auth_service::DEFAULT_AUTH_SERVICE;
use tessera_transport::HttpConfig;
use tessera_types::{ClusterConfig, NodeConfig, RelayConfig};

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Signer node directory.
    #[serde(default)]
    pub cluster: ClusterSection,
    /// Standalone authentication service.
    #[serde(default)]
    pub auth_service: AuthServiceSection,
    /// Ceremony aggregation and retries.
    #[serde(default)]
    pub ceremony: CeremonyOptions,
    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpSection,
    /// Static name table used when signing typed data.
    #[serde(default)]
    pub names: BTreeMap<String, Address>,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Cluster configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSection {
    /// Nodes required to sign (t of n).
    #[serde(default = "default_threshold")]
    pub threshold: usize,
    /// Ceremony time-to-live sent to nodes.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    #[serde(default)]
    pub relay: RelaySection,
    #[serde(default = "default_nodes")]
    pub nodes: Vec<NodeSection>,
}

/// Relay endpoint and key. Exactly one of `seed` and `verifying_key` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySection {
    #[serde(default = "default_relay_endpoint")]
    pub endpoint: String,
    /// Hex Ed25519 seed the relay key is derived from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    /// Hex Ed25519 verifying key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_key: Option<String>,
}

/// One signer node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSection {
    pub endpoint: String,
    /// Hex Ed25519 verifying key.
    pub verifying_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthServiceSection {
    #[serde(default = "default_auth_service")]
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSection {
    /// Per-request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_threshold() -> usize {
    3
}

fn default_ttl() -> u64 {
    10
}

fn default_relay_endpoint() -> String {
    "http://localhost:8080".to_string()
}

fn default_relay_seed() -> String {
    "b2012ec2ce6c7b64d58caf81f024a2a7e39ad3cb446973ff3ab363e8593f845d".to_string()
}

fn default_nodes() -> Vec<NodeSection> {
    [
        "0f62495af313faefd1d200c94813c2b5527e5bed44fb151c6826635c0ed49544",
        "6aa40c5bb6dfb020493ca9b170e67ebe7523c63fabd3db5fe9e37f90bd935e4b",
        "19a66701338a0638a0b3dda9ea7fe23074d20bdbf96d2ce7bee736467009c916",
        "8f99bafe90c4f13a530453c4147edf53674530a7a1286a9385e8bc4549b4d86d",
        "f34d2a6acdbd54bae61f3677c68a214d27f9423d5f314b5f930dfc18f20a1698",
    ]
    .iter()
    .enumerate()
    .map(|(i, key)| NodeSection {
        endpoint: format!("https://mpc{}-test.arthera.net", i + 1),
        verifying_key: key.to_string(),
    })
    .collect()
}

fn default_auth_service() -> String {
    DEFAULT_AUTH_SERVICE.to_string()
}

fn default_timeout() -> u64 {
    HttpConfig::default().timeout_secs
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClusterSection {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            ttl_secs: default_ttl(),
            relay: RelaySection::default(),
            nodes: default_nodes(),
        }
    }
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            endpoint: default_relay_endpoint(),
            seed: Some(default_relay_seed()),
            verifying_key: None,
        }
    }
}

impl Default for AuthServiceSection {
    fn default() -> Self {
        Self {
            endpoint: default_auth_service(),
        }
    }
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ClusterSection {
    /// Validate the section and build the node directory.
    pub fn to_cluster_config(&self) -> anyhow::Result<ClusterConfig> {
        let relay_key = match (&self.relay.seed, &self.relay.verifying_key) {
            (Some(seed), None) => VerifyingKey::from_seed_hex(seed).context("relay seed")?,
            (None, Some(key)) => VerifyingKey::from_hex(key).context("relay verifying key")?,
            (Some(_), Some(_)) => bail!("relay: set either seed or verifying_key, not both"),
            (None, None) => bail!("relay: seed or verifying_key is required"),
        };
        let relay = RelayConfig {
            endpoint: self.relay.endpoint.clone(),
            verifying_key: relay_key,
        };
        let nodes = self
            .nodes
            .iter()
            .map(|node| {
                NodeConfig::from_hex(node.endpoint.clone(), &node.verifying_key)
                    .with_context(|| format!("node {}", node.endpoint))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(ClusterConfig::new(
            relay,
            nodes,
            self.threshold,
            self.ttl_secs,
        )?)
    }
}

impl CliConfig {
    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist; the default one falls back to defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => {
                let path = Self::config_path();
                if path.exists() {
                    Self::read(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("TESSERA_CONFIG_DIR") {
            return PathBuf::from(dir).join("config.toml");
        }
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".tessera"))
            .unwrap_or_else(|_| PathBuf::from("/tmp/tessera"))
            .join("config.toml")
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            timeout_secs: self.http.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use tessera_ceremony::ConsistencyPolicy;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.cluster.threshold, 3);
        assert_eq!(config.cluster.ttl_secs, 10);
        assert_eq!(config.cluster.nodes.len(), 5);
        assert_eq!(
            config.cluster.nodes[0].endpoint,
            "https://mpc1-test.arthera.net"
        );
        assert_eq!(config.ceremony.consistency, ConsistencyPolicy::Strict);
        assert_eq!(config.ceremony.quorum_retries, 0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_default_cluster_is_valid() {
        let cluster = CliConfig::default()
            .cluster
            .to_cluster_config()
            .expect("cluster");
        assert_eq!(cluster.node_count(), 5);
        assert_eq!(cluster.threshold(), 3);
        assert_eq!(cluster.relay().endpoint, "http://localhost:8080");
    }

    #[test]
    fn test_config_serialization() {
        let config = CliConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let parsed: CliConfig = toml::from_str(&toml_str).expect("parse");
        assert_eq!(parsed.cluster.nodes.len(), 5);
        assert_eq!(parsed.cluster.relay.seed, config.cluster.relay.seed);
    }

    #[test]
    fn test_partial_file() {
        let config: CliConfig = toml::from_str(
            r#"
            [ceremony]
            consistency = "pick_random"
            quorum_retries = 2

            [names]
            "alice.eth" = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
            "#,
        )
        .expect("parse");
        assert_eq!(config.ceremony.consistency, ConsistencyPolicy::PickRandom);
        assert_eq!(config.ceremony.quorum_retries, 2);
        assert_eq!(config.names.len(), 1);
        assert_eq!(config.cluster.nodes.len(), 5);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut config = CliConfig::default();
        config.cluster.threshold = 6;
        assert!(config.cluster.to_cluster_config().is_err());
        config.cluster.threshold = 0;
        assert!(config.cluster.to_cluster_config().is_err());
    }

    #[test]
    fn test_relay_key_choice() {
        let mut config = CliConfig::default();
        let derived = config.cluster.to_cluster_config().expect("cluster");

        config.cluster.relay.seed = None;
        assert!(config.cluster.to_cluster_config().is_err());

        config.cluster.relay.verifying_key = Some(derived.relay().verifying_key.to_hex());
        let explicit = config.cluster.to_cluster_config().expect("cluster");
        assert_eq!(
            explicit.relay().verifying_key.to_bytes(),
            derived.relay().verifying_key.to_bytes()
        );

        config.cluster.relay.seed = Some(default_relay_seed());
        assert!(config.cluster.to_cluster_config().is_err());
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        assert!(CliConfig::load(Some(Path::new("/nonexistent/tessera.toml"))).is_err());
    }
}
