//! Shared fixtures for unit tests: a five-node cluster emulated in memory
//! that signs with a single secp256k1 key.

use std::sync::Arc;

use k256::ecdsa::SigningKey;
use serde_json::{json, Value};
use tessera_ceremony::{CeremonyOptions, Coordinator, Session};
use tessera_crypto::ed25519::VerifyingKey;
use tessera_transport::mock::{MockTransport, Request};
use tessera_transport::{Result as TransportResult, TransportError};
use tessera_types::{AuthMethod, ClusterConfig, NodeConfig, RelayConfig};

use crate::names::NameResolver;
use crate::signer::ThresholdSigner;

/// The group key the emulated cluster "holds".
pub struct ClusterKey {
    key: SigningKey,
}

impl ClusterKey {
    pub fn new() -> Self {
        Self {
            key: SigningKey::from_slice(&[0x42; 32]).expect("key"),
        }
    }

    pub fn public_hex(&self) -> String {
        hex::encode(self.key.verifying_key().to_encoded_point(false).as_bytes())
    }

    fn sign(&self, message_hex: &str) -> String {
        let digest = hex::decode(message_hex).expect("digest hex");
        let (signature, recid) = self
            .key
            .sign_prehash_recoverable(&digest)
            .expect("sign prehash");
        format!("{}{:02x}", hex::encode(signature.to_bytes()), recid.to_byte())
    }

    /// Node behaviour for an account that does not exist yet.
    pub fn respond(&self, request: &Request) -> TransportResult<Value> {
        match request.path() {
            "/v1/get_account" => Ok(json!({ "account_type": "unknown", "public_keys": [] })),
            "/v1/keygen" => Ok(json!({ "public_key": self.public_hex() })),
            "/v1/signgen" => {
                let body = request.body.as_ref().expect("signgen body");
                let message = body["opts"]["setup"]["message"].as_str().expect("message");
                Ok(json!({ "sign": self.sign(message) }))
            }
            path if path.starts_with("/v1/register_") => Ok(json!({ "token": "node-token" })),
            _ => Err(TransportError::EndpointNotFound {
                url: request.url.clone(),
            }),
        }
    }
}

pub fn cluster() -> Arc<ClusterConfig> {
    let nodes = (1..=5u8)
        .map(|i| {
            NodeConfig::new(
                format!("https://node{i}.test"),
                VerifyingKey::from_seed(&[i; 32]).expect("seed"),
            )
        })
        .collect();
    let relay = RelayConfig {
        endpoint: "http://localhost:8080".into(),
        verifying_key: VerifyingKey::from_seed(&[0u8; 32]).expect("seed"),
    };
    Arc::new(ClusterConfig::new(relay, nodes, 3, 10).expect("cluster"))
}

pub fn transport(key: &ClusterKey) -> Arc<MockTransport> {
    let key = ClusterKey {
        key: key.key.clone(),
    };
    Arc::new(MockTransport::new(move |request| key.respond(request)))
}

pub fn coordinator(transport: Arc<MockTransport>) -> Coordinator {
    Coordinator::new(cluster(), transport, CeremonyOptions::default())
}

/// A signer for a logged-in Google session holding `key`.
pub fn signer(
    key: &ClusterKey,
    resolver: Option<Arc<dyn NameResolver>>,
) -> (ThresholdSigner, Arc<MockTransport>) {
    let transport = transport(key);
    let session =
        Session::new(AuthMethod::Google, "user-1", "id-token", key.public_hex()).expect("session");
    (
        ThresholdSigner::new(coordinator(transport.clone()), session, resolver),
        transport,
    )
}
