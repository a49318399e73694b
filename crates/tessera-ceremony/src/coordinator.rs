//! Keygen and signing ceremonies.
//!
//! A ceremony moves through three steps: every participant authorizes the
//! payload, every participant receives the ceremony request with its own
//! authorization token, and the per-node outputs are aggregated. Each step
//! fans out concurrently and fails as soon as any participant fails.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tessera_identity::{IdentityAdapter, NodeAuthToken};
use tessera_transport::{NodeTransport, NodeTransportExt};
use tessera_types::wire::{
    CeremonyPayload, KeygenOpts, KeygenRequest, KeygenResponse, KeygenSetup, Party,
    SigngenOpts, SigngenRequest, SigngenResponse, SigngenSetup,
};
use tessera_types::{AuthMethod, ClusterConfig, NodeConfig, API_PREFIX, HASH_ALGO};
use tracing::{debug, info, warn};

use crate::consistency::ConsistencyPolicy;
use crate::instance::InstanceId;
use crate::quorum::{keygen_participants, nodes_at, parties, select_signers};
use crate::resolver::AccountResolver;
use crate::session::Session;
use crate::{CeremonyError, Result};

/// Tunables for ceremony aggregation and failure handling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeremonyOptions {
    /// How per-node outputs are reduced.
    #[serde(default)]
    pub consistency: ConsistencyPolicy,
    /// Extra signing attempts, each on a fresh quorum that excludes nodes
    /// which already failed. Zero makes signing all-or-nothing.
    #[serde(default)]
    pub quorum_retries: usize,
}

/// Runs ceremonies against the cluster.
#[derive(Clone)]
pub struct Coordinator {
    cluster: Arc<ClusterConfig>,
    transport: Arc<dyn NodeTransport>,
    adapter: IdentityAdapter,
    resolver: AccountResolver,
    options: CeremonyOptions,
}

impl Coordinator {
    pub fn new(
        cluster: Arc<ClusterConfig>,
        transport: Arc<dyn NodeTransport>,
        options: CeremonyOptions,
    ) -> Self {
        Self {
            adapter: IdentityAdapter::new(transport.clone()),
            resolver: AccountResolver::new(transport.clone(), cluster.clone()),
            cluster,
            transport,
            options,
        }
    }

    pub fn cluster(&self) -> &ClusterConfig {
        &self.cluster
    }

    pub fn options(&self) -> CeremonyOptions {
        self.options
    }

    pub fn resolver(&self) -> &AccountResolver {
        &self.resolver
    }

    /// The user's public key (SEC1 hex).
    ///
    /// Served from `cached` without any network call when it already holds
    /// the key of `user_id`. Otherwise an existing account is looked up, and
    /// only when the cluster has none is a new key generated.
    pub async fn get_public_key(
        &self,
        method: AuthMethod,
        user_id: &str,
        credential: &str,
        cached: Option<&Session>,
    ) -> Result<String> {
        if let Some(session) = cached.filter(|s| s.holds_key_for(user_id)) {
            debug!("Public key served from session");
            return Ok(session.public_key().to_string());
        }

        if let Some(account) = self.resolver.resolve(user_id).await? {
            info!(
                account_type = %account.account_type,
                keys = account.public_keys.len(),
                "Existing account found"
            );
            return ConsistencyPolicy::PickRandom.aggregate("public key", account.public_keys);
        }

        self.keygen(method, user_id, credential).await
    }

    /// Run a key-generation ceremony across every node.
    pub async fn keygen(&self, method: AuthMethod, user_id: &str, credential: &str) -> Result<String> {
        let n = self.cluster.node_count();
        let t = self.cluster.threshold();
        let ttl = self.cluster.ttl_secs();
        if n < 1 || t < 1 || ttl < 1 {
            return Err(CeremonyError::Configuration(
                "node count, threshold and ttl must be greater than 0".to_string(),
            ));
        }

        let participants = nodes_at(&self.cluster, &keygen_participants(&self.cluster));
        let payload = CeremonyPayload::keygen(n, t, ttl);
        let tokens = self
            .adapter
            .authorize(method, user_id, credential, &payload, &participants)
            .await?;

        let instance = InstanceId::generate();
        info!(%instance, participants = n, threshold = t, "Starting keygen ceremony");

        let party_list = parties(&participants);
        let path = format!("{API_PREFIX}/keygen");
        let dispatches = participants.iter().zip(&tokens).map(|(node, token)| {
            let request = KeygenRequest {
                instance: *instance.as_bytes(),
                opts: KeygenOpts {
                    setup: KeygenSetup {
                        t,
                        parties: party_list.clone(),
                        auth_token: token.secret().to_string(),
                    },
                    instance: *instance.as_bytes(),
                    ttl,
                },
            };
            let url = node.url(&path);
            async move {
                debug!(node = %node.endpoint, "Dispatching keygen");
                self.transport
                    .post::<_, KeygenResponse>(&url, &request)
                    .await
                    .map(|r| r.public_key)
                    .map_err(|source| node_failed(node, source))
            }
        });
        let keys = try_join_all(dispatches).await?;

        let public_key = self.options.consistency.aggregate("public key", keys)?;
        info!(%instance, "Keygen ceremony complete");
        Ok(public_key)
    }

    /// Sign a 32-byte digest for `session`, returning the raw
    /// `r || s || flag` hex output.
    pub async fn sign(&self, session: &Session, digest: &[u8; 32]) -> Result<String> {
        if !session.is_authenticated() {
            return Err(CeremonyError::NotAuthenticated);
        }

        let message = hex::encode(digest);
        let mut excluded = HashSet::new();
        let mut retries = 0;
        loop {
            let quorum = {
                let mut rng = rand::thread_rng();
                select_signers(&self.cluster, &excluded, &mut rng)?
            };
            match self.sign_with(session, &message, &quorum).await {
                Ok(signature) => return Ok(signature),
                Err(err) => {
                    let failed = err.failed_node().and_then(|node| self.index_of(node));
                    match failed {
                        Some(index) if retries < self.options.quorum_retries => {
                            warn!(
                                node = err.failed_node().unwrap_or_default(),
                                error = %err,
                                retry = retries + 1,
                                "Signing quorum failed, retrying without node"
                            );
                            excluded.insert(index);
                            retries += 1;
                        }
                        _ => return Err(err),
                    }
                }
            }
        }
    }

    /// One signing attempt on a fixed quorum.
    async fn sign_with(&self, session: &Session, message: &str, quorum: &[usize]) -> Result<String> {
        let n = self.cluster.node_count();
        let t = self.cluster.threshold();
        let ttl = self.cluster.ttl_secs();

        let participants = nodes_at(&self.cluster, quorum);
        let payload = CeremonyPayload::sign(n, t, message, ttl);
        let tokens = self
            .adapter
            .authorize(
                session.auth_method(),
                session.user_id(),
                session.id_token(),
                &payload,
                &participants,
            )
            .await?;

        let instance = InstanceId::generate();
        info!(%instance, participants = participants.len(), threshold = t, "Starting signing ceremony");

        let party_list = parties(&participants);
        let signatures = self
            .dispatch_sign(session, message, instance, &participants, &tokens, &party_list, ttl)
            .await?;

        let signature = self.options.consistency.aggregate("signature", signatures)?;
        info!(%instance, "Signing ceremony complete");
        Ok(signature)
    }

    #[allow(clippy::too_many_arguments)]
    async fn dispatch_sign(
        &self,
        session: &Session,
        message: &str,
        instance: InstanceId,
        participants: &[NodeConfig],
        tokens: &[NodeAuthToken],
        party_list: &[Party],
        ttl: u64,
    ) -> Result<Vec<String>> {
        let path = format!("{API_PREFIX}/signgen");
        let dispatches = participants.iter().zip(tokens).map(|(node, token)| {
            let request = SigngenRequest {
                instance: *instance.as_bytes(),
                opts: SigngenOpts {
                    setup: SigngenSetup {
                        parties: party_list.to_vec(),
                        message: message.to_string(),
                        public_key: session.public_key().to_string(),
                        hash_algo: HASH_ALGO.to_string(),
                        auth_token: token.secret().to_string(),
                    },
                    instance: *instance.as_bytes(),
                    ttl,
                },
            };
            let url = node.url(&path);
            async move {
                debug!(node = %node.endpoint, "Dispatching signgen");
                self.transport
                    .post::<_, SigngenResponse>(&url, &request)
                    .await
                    .map(|r| r.sign)
                    .map_err(|source| node_failed(node, source))
            }
        });
        try_join_all(dispatches).await
    }

    fn index_of(&self, endpoint: &str) -> Option<usize> {
        self.cluster
            .nodes()
            .iter()
            .position(|node| node.endpoint == endpoint)
    }
}

fn node_failed(node: &NodeConfig, source: tessera_transport::TransportError) -> CeremonyError {
    CeremonyError::NodeFailed {
        node: node.endpoint.clone(),
        source,
    }
}
