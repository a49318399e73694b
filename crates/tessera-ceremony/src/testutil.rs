//! Shared fixtures for unit tests.

use std::sync::Arc;

use serde_json::{json, Value};
use tessera_crypto::ed25519::VerifyingKey;
use tessera_transport::mock::{MockTransport, Request};
use tessera_transport::{Result as TransportResult, TransportError};
use tessera_types::{ClusterConfig, NodeConfig, RelayConfig};

/// Uncompressed SEC1 key of secp256k1 private key 1.
pub const GROUP_KEY: &str = "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";

/// A fixed 130-character raw signature.
pub fn raw_signature() -> String {
    format!("{}{}00", "11".repeat(32), "22".repeat(32))
}

/// `n` nodes at `https://node{i}.test` (1-based), each with its own key.
pub fn cluster(n: usize, t: usize) -> ClusterConfig {
    let nodes = (1..=n)
        .map(|i| {
            let seed = [i as u8; 32];
            NodeConfig::new(
                format!("https://node{i}.test"),
                VerifyingKey::from_seed(&seed).expect("seed"),
            )
        })
        .collect();
    let relay = RelayConfig {
        endpoint: "http://localhost:8080".into(),
        verifying_key: VerifyingKey::from_seed(&[0u8; 32]).expect("seed"),
    };
    ClusterConfig::new(relay, nodes, t, 10).expect("cluster")
}

pub fn shared(n: usize, t: usize) -> Arc<ClusterConfig> {
    Arc::new(cluster(n, t))
}

/// A well-behaved node: unknown accounts, tokens for everyone, `GROUP_KEY`
/// from keygen and `raw_signature()` from signgen.
pub fn healthy(request: &Request) -> TransportResult<Value> {
    match request.path() {
        "/v1/get_account" => Ok(json!({ "account_type": "unknown", "public_keys": [] })),
        "/v1/keygen" => Ok(json!({ "public_key": GROUP_KEY })),
        "/v1/signgen" => Ok(json!({ "sign": raw_signature() })),
        path if path.starts_with("/v1/register_") => {
            Ok(json!({ "token": format!("auth@{}", request.origin()) }))
        }
        _ => Err(TransportError::EndpointNotFound {
            url: request.url.clone(),
        }),
    }
}

pub fn healthy_transport() -> Arc<MockTransport> {
    Arc::new(MockTransport::new(healthy))
}
