//! Integration test crate for the threshold signing client.
//!
//! The library half is a stateful in-memory cluster: nodes issue
//! authorization tokens, remember accounts created by key generation and
//! sign with one secp256k1 key standing in for the shared group key. The
//! first node also answers the OAuth bridging endpoints.
//! Individual nodes can be made to reject credentials, drop off the network
//! or disagree about an account.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p tessera-integration-tests
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use k256::ecdsa::SigningKey;
use serde_json::{json, Value};
use tessera_ceremony::{CeremonyOptions, Coordinator};
use tessera_crypto::ed25519::VerifyingKey;
use tessera_transport::mock::{MockTransport, Request};
use tessera_transport::{Result as TransportResult, TransportError};
use tessera_types::{ClusterConfig, NodeConfig, RelayConfig};

/// Per-node fault injection and account state.
#[derive(Default)]
struct State {
    /// user id -> public key, created by keygen.
    accounts: HashMap<String, String>,
    unauthorized: HashSet<usize>,
    offline: HashSet<usize>,
    /// Canned `get_account` responses for single nodes.
    account_overrides: HashMap<usize, Value>,
    /// Nodes reporting a different key from keygen.
    rogue_keys: HashSet<usize>,
}

/// An emulated signer cluster.
pub struct MockCluster {
    key: SigningKey,
    cluster: Arc<ClusterConfig>,
    state: Mutex<State>,
}

impl MockCluster {
    /// `n` nodes at `https://mpc{i}.test` with threshold `t` and a ttl of 10.
    pub fn new(n: u8, t: usize) -> Arc<Self> {
        let nodes = (1..=n)
            .map(|i| {
                NodeConfig::new(
                    format!("https://mpc{i}.test"),
                    VerifyingKey::from_seed(&[i; 32]).expect("node seed"),
                )
            })
            .collect();
        let relay = RelayConfig {
            endpoint: "http://localhost:8080".to_string(),
            verifying_key: VerifyingKey::from_seed(&[0xaa; 32]).expect("relay seed"),
        };
        Arc::new(Self {
            key: SigningKey::from_slice(&[0x5e; 32]).expect("group key"),
            cluster: Arc::new(ClusterConfig::new(relay, nodes, t, 10).expect("cluster")),
            state: Mutex::new(State::default()),
        })
    }

    pub fn cluster(&self) -> Arc<ClusterConfig> {
        self.cluster.clone()
    }

    /// Uncompressed SEC1 hex of the group key.
    pub fn public_key(&self) -> String {
        hex::encode(self.key.verifying_key().to_encoded_point(false).as_bytes())
    }

    /// A transport routing every request to this cluster.
    pub fn transport(self: &Arc<Self>) -> Arc<MockTransport> {
        let cluster = Arc::clone(self);
        Arc::new(MockTransport::new(move |request| cluster.respond(request)))
    }

    pub fn coordinator(self: &Arc<Self>, options: CeremonyOptions) -> (Coordinator, Arc<MockTransport>) {
        let transport = self.transport();
        (
            Coordinator::new(self.cluster(), transport.clone(), options),
            transport,
        )
    }

    /// Node `index` answers 401 to credential registration.
    pub fn reject_credentials(&self, index: usize) {
        self.state().unauthorized.insert(index);
    }

    /// Node `index` fails every request with a network error.
    pub fn take_offline(&self, index: usize) {
        self.state().offline.insert(index);
    }

    /// Node `index` answers `get_account` with `response`.
    pub fn override_account(&self, index: usize, response: Value) {
        self.state().account_overrides.insert(index, response);
    }

    /// Node `index` reports a different public key from keygen.
    pub fn corrupt_keygen(&self, index: usize) {
        self.state().rogue_keys.insert(index);
    }

    /// Register an existing account without running keygen.
    pub fn seed_account(&self, user_id: &str) {
        let public_key = self.public_key();
        self.state().accounts.insert(user_id.to_string(), public_key);
    }

    pub fn has_account(&self, user_id: &str) -> bool {
        self.state().accounts.contains_key(user_id)
    }

    /// Index of the node at `origin`.
    pub fn node_index(&self, origin: &str) -> Option<usize> {
        self.cluster
            .nodes()
            .iter()
            .position(|node| node.endpoint == origin)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn respond(&self, request: &Request) -> TransportResult<Value> {
        let index = self
            .node_index(request.origin())
            .ok_or_else(|| TransportError::EndpointNotFound {
                url: request.url.clone(),
            })?;
        let state = self.state();
        if state.offline.contains(&index) {
            return Err(TransportError::Network {
                url: request.url.clone(),
                message: "connection refused".to_string(),
            });
        }
        let body = request.body.clone().unwrap_or(Value::Null);

        match request.path() {
            "/v1/get_account" => {
                if let Some(response) = state.account_overrides.get(&index) {
                    return Ok(response.clone());
                }
                let user_id = request.query("uuid").unwrap_or_default();
                Ok(match state.accounts.get(user_id) {
                    Some(key) => json!({ "account_type": "user", "public_keys": [key] }),
                    None => json!({ "account_type": "unknown", "public_keys": [] }),
                })
            }
            path if path.starts_with("/v1/register_") => {
                if state.unauthorized.contains(&index) {
                    return Err(TransportError::Unauthorized {
                        url: request.url.clone(),
                    });
                }
                let user_id = body["uuid"].as_str().unwrap_or_default();
                Ok(json!({ "token": format!("node{index}:{user_id}") }))
            }
            "/v1/keygen" => {
                let token = body["opts"]["setup"]["auth_token"]
                    .as_str()
                    .unwrap_or_default();
                let user_id = token.split_once(':').map(|(_, u)| u).unwrap_or_default();
                let rogue = state.rogue_keys.contains(&index);
                drop(state);
                let public_key = if rogue {
                    hex::encode(
                        SigningKey::from_slice(&[0x77; 32])
                            .expect("rogue key")
                            .verifying_key()
                            .to_encoded_point(false)
                            .as_bytes(),
                    )
                } else {
                    self.public_key()
                };
                if !rogue {
                    self.state()
                        .accounts
                        .insert(user_id.to_string(), public_key.clone());
                }
                Ok(json!({ "public_key": public_key }))
            }
            "/v1/signgen" => {
                let message = body["opts"]["setup"]["message"]
                    .as_str()
                    .unwrap_or_default();
                let digest = hex::decode(message).map_err(|e| TransportError::Decode {
                    url: request.url.clone(),
                    message: e.to_string(),
                })?;
                let (signature, recid) = self
                    .key
                    .sign_prehash_recoverable(&digest)
                    .map_err(|e| TransportError::Decode {
                        url: request.url.clone(),
                        message: e.to_string(),
                    })?;
                Ok(json!({
                    "sign": format!("{}{:02x}", hex::encode(signature.to_bytes()), recid.to_byte())
                }))
            }
            "/v1/get_github_token" => {
                let code = body["code"].as_str().unwrap_or_default();
                Ok(json!({
                    "access_token": format!("gho-{code}"),
                    "user_info": { "id": 4242, "login": "octocat" }
                }))
            }
            "/v1/exchange_code_for_token" => {
                if body["code_verifier"].as_str().unwrap_or_default().is_empty() {
                    return Err(TransportError::Status {
                        url: request.url.clone(),
                        status: 400,
                    });
                }
                let code = body["token"].as_str().unwrap_or_default();
                Ok(json!({ "access_token": format!("tw-{code}") }))
            }
            "/v1/verify_twitter_token" => Ok(json!({
                "id": "777",
                "name": "Tweety",
                "username": "tweety"
            })),
            _ => Err(TransportError::EndpointNotFound {
                url: request.url.clone(),
            }),
        }
    }
}
