//! Account resolution.
//!
//! Before generating a key the coordinator asks every node whether it
//! already holds an account for the user. The cluster only counts as
//! agreeing when every node reports the same account type and the same set
//! of public keys.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::try_join_all;
use tessera_transport::{NodeTransport, NodeTransportExt};
use tessera_types::account::AccountResponse;
use tessera_types::{AccountRecord, ClusterConfig, API_PREFIX, UNKNOWN_ACCOUNT};
use tracing::{debug, info};

use crate::{CeremonyError, Result};

/// Cluster-wide account lookup.
#[derive(Clone)]
pub struct AccountResolver {
    transport: Arc<dyn NodeTransport>,
    cluster: Arc<ClusterConfig>,
}

impl AccountResolver {
    pub fn new(transport: Arc<dyn NodeTransport>, cluster: Arc<ClusterConfig>) -> Self {
        Self { transport, cluster }
    }

    /// Look up `user_id` on every node.
    ///
    /// Returns `None` when all nodes report the account as unknown. Any
    /// unreachable node fails the lookup.
    pub async fn resolve(&self, user_id: &str) -> Result<Option<AccountRecord>> {
        let path = format!(
            "{API_PREFIX}/get_account?uuid={}",
            urlencoding::encode(user_id)
        );
        let lookups = self.cluster.nodes().iter().map(|node| {
            let url = node.url(&path);
            async move {
                debug!(node = %node.endpoint, "Looking up account");
                self.transport
                    .get::<AccountResponse>(&url)
                    .await
                    .map_err(|source| CeremonyError::NodeFailed {
                        node: node.endpoint.clone(),
                        source,
                    })
            }
        });
        let responses = try_join_all(lookups).await?;
        let record = reconcile(responses)?;
        info!(found = record.is_some(), "Account lookup complete");
        Ok(record)
    }
}

/// Check that all responses agree and merge them.
pub fn reconcile(responses: Vec<AccountResponse>) -> Result<Option<AccountRecord>> {
    let types: BTreeSet<&str> = responses.iter().map(|r| r.account_type.as_str()).collect();
    let account_type = match types.len() {
        1 => types.into_iter().next().unwrap_or(UNKNOWN_ACCOUNT).to_string(),
        0 => return Err(CeremonyError::InconsistentCluster("no responses".to_string())),
        n => {
            return Err(CeremonyError::InconsistentCluster(format!(
                "nodes returned {n} different account types"
            )))
        }
    };

    let union: BTreeSet<&str> = responses
        .iter()
        .flat_map(|r| r.public_keys.iter().map(String::as_str))
        .collect();
    for response in &responses {
        let own: BTreeSet<&str> = response.public_keys.iter().map(String::as_str).collect();
        if response.public_keys.len() != union.len() || own != union {
            return Err(CeremonyError::InconsistentCluster(
                "nodes returned different public key lists".to_string(),
            ));
        }
    }

    if account_type == UNKNOWN_ACCOUNT {
        return Ok(None);
    }
    if union.is_empty() {
        return Err(CeremonyError::InconsistentCluster(format!(
            "account type {account_type} without public keys"
        )));
    }

    let public_keys = responses
        .into_iter()
        .next()
        .map(|r| r.public_keys)
        .unwrap_or_default();
    Ok(Some(AccountRecord {
        account_type,
        public_keys,
    }))
}
