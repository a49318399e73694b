//! Google login against the standalone auth service.

use std::sync::Arc;

use tessera_transport::{NodeTransport, NodeTransportExt};
use tessera_types::bridge::{GoogleLoginRequest, GoogleLoginResponse};
use tessera_types::API_PREFIX;
use tracing::info;

use crate::{IdentityError, Result};

/// Default auth service of the public test cluster.
pub const DEFAULT_AUTH_SERVICE: &str = "https://mpc-auth-test.arthera.net";

/// Client for the auth service that resolves a Google credential directly
/// to the user's public key.
#[derive(Clone)]
pub struct AuthServiceClient {
    transport: Arc<dyn NodeTransport>,
    endpoint: String,
}

impl AuthServiceClient {
    pub fn new(transport: Arc<dyn NodeTransport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Exchange a Google ID token for the user's public key (hex).
    pub async fn login_with_google_token(
        &self,
        client_id: &str,
        user_id: &str,
        token: &str,
    ) -> Result<String> {
        if token.trim().is_empty() {
            return Err(IdentityError::InvalidInput("empty credential".to_string()));
        }
        let url = format!(
            "{}{API_PREFIX}/login_google_jwt",
            self.endpoint.trim_end_matches('/')
        );
        let response: GoogleLoginResponse = self
            .transport
            .post(
                &url,
                &GoogleLoginRequest {
                    user_id: user_id.to_string(),
                    token: token.to_string(),
                    client_id: client_id.to_string(),
                },
            )
            .await?;
        info!("Auth service login complete");
        Ok(response.public_key)
    }
}
