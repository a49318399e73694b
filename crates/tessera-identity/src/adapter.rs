//! Per-node registration.
//!
//! Before a ceremony every participant must be told, through the provider's
//! registration endpoint, which payload the user is authorizing. Each node
//! verifies the credential independently and answers with a token that only
//! it will accept.

use std::fmt;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use futures::future::try_join_all;
use tessera_transport::{NodeTransport, NodeTransportExt};
use tessera_types::wire::{CeremonyPayload, RegisterRequest, RegisterResponse};
use tessera_types::{AuthMethod, NodeConfig};
use tracing::{debug, info};

use crate::{IdentityError, Result};

/// A node-scoped, single-use authorization token.
#[derive(Clone, PartialEq, Eq)]
pub struct NodeAuthToken {
    /// Endpoint of the node that issued the token.
    pub node: String,
    token: String,
}

impl NodeAuthToken {
    pub fn new(node: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            token: token.into(),
        }
    }

    pub fn secret(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for NodeAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeAuthToken")
            .field("node", &self.node)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Registers a ceremony payload with every participant.
#[derive(Clone)]
pub struct IdentityAdapter {
    transport: Arc<dyn NodeTransport>,
}

impl IdentityAdapter {
    pub fn new(transport: Arc<dyn NodeTransport>) -> Self {
        Self { transport }
    }

    /// Obtain one authorization token per participant, in participant order.
    ///
    /// All registrations run concurrently and the call succeeds only if
    /// every participant accepted; the first failure is returned.
    pub async fn authorize(
        &self,
        method: AuthMethod,
        user_id: &str,
        credential: &str,
        payload: &CeremonyPayload,
        participants: &[NodeConfig],
    ) -> Result<Vec<NodeAuthToken>> {
        if credential.trim().is_empty() {
            return Err(IdentityError::InvalidInput("empty credential".to_string()));
        }
        if participants.is_empty() {
            return Err(IdentityError::InvalidInput("no participants".to_string()));
        }

        let mut payload = payload.clone();
        payload.time = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        let request = RegisterRequest {
            token: credential.to_string(),
            payload,
            uuid: user_id.to_string(),
        };

        let path = method.registration_path();
        info!(
            method = %method,
            participants = participants.len(),
            "Requesting node authorization"
        );

        let registrations = participants.iter().map(|node| {
            let url = node.url(&path);
            let request = &request;
            async move {
                debug!(node = %node.endpoint, "Registering");
                let response: RegisterResponse =
                    self.transport.post(&url, request).await.map_err(|source| {
                        IdentityError::AuthorizationFailed {
                            node: node.endpoint.clone(),
                            source,
                        }
                    })?;
                Ok::<_, IdentityError>(NodeAuthToken::new(node.endpoint.clone(), response.token))
            }
        });

        try_join_all(registrations).await
    }
}
