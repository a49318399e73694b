//! Identity bridging.
//!
//! GitHub and Twitter hand the browser an authorization code rather than a
//! verifiable token. The first node of the cluster holds the provider client
//! secrets and performs the code exchange on the user's behalf.

use std::sync::Arc;

use tessera_transport::{NodeTransport, NodeTransportExt};
use tessera_types::bridge::{
    AccessTokenResponse, GithubCodeRequest, GithubProfile, GithubTokenResponse,
    TwitterCodeRequest, TwitterProfile, TwitterVerifyRequest,
};
use tessera_types::{ClusterConfig, API_PREFIX};
use tracing::{info, warn};

use crate::{IdentityError, Result};

/// Result of a GitHub code exchange.
#[derive(Clone, Debug)]
pub struct GithubLogin {
    pub access_token: String,
    /// `None` when the node's `user_info` was missing or malformed.
    pub profile: Option<GithubProfile>,
}

/// Code and token exchange through the first node.
#[derive(Clone)]
pub struct IdentityBridge {
    transport: Arc<dyn NodeTransport>,
    cluster: Arc<ClusterConfig>,
}

impl IdentityBridge {
    pub fn new(transport: Arc<dyn NodeTransport>, cluster: Arc<ClusterConfig>) -> Self {
        Self { transport, cluster }
    }

    fn url(&self, endpoint: &str) -> Result<String> {
        let node = self.cluster.nodes().first().ok_or(IdentityError::NoNodes)?;
        Ok(node.url(&format!("{API_PREFIX}/{endpoint}")))
    }

    /// Exchange a GitHub authorization code for an access token and profile.
    pub async fn exchange_github_code(&self, code: &str) -> Result<GithubLogin> {
        let url = self.url("get_github_token")?;
        let response: GithubTokenResponse = self
            .transport
            .post(
                &url,
                &GithubCodeRequest {
                    code: code.to_string(),
                },
            )
            .await?;

        let profile = match response.user_info {
            Some(info) => match serde_json::from_value::<GithubProfile>(info) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!(error = %e, "Malformed GitHub user_info, continuing without profile");
                    None
                }
            },
            None => {
                warn!("GitHub exchange returned no user_info");
                None
            }
        };
        info!(has_profile = profile.is_some(), "GitHub code exchanged");

        Ok(GithubLogin {
            access_token: response.access_token,
            profile,
        })
    }

    /// Exchange a Twitter authorization code and PKCE verifier for an
    /// access token.
    pub async fn exchange_twitter_code(&self, code: &str, code_verifier: &str) -> Result<String> {
        let url = self.url("exchange_code_for_token")?;
        let response: AccessTokenResponse = self
            .transport
            .post(
                &url,
                &TwitterCodeRequest {
                    token: code.to_string(),
                    code_verifier: code_verifier.to_string(),
                },
            )
            .await?;
        info!("Twitter code exchanged");
        Ok(response.access_token)
    }

    /// Fetch the Twitter profile behind an access token. Failures degrade to
    /// `None`.
    pub async fn verify_twitter_token(&self, token: &str) -> Result<Option<TwitterProfile>> {
        let url = self.url("verify_twitter_token")?;
        let request = TwitterVerifyRequest {
            token: token.to_string(),
        };
        match self.transport.post::<_, TwitterProfile>(&url, &request).await {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                warn!(error = %e, "Twitter profile unavailable");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tessera_crypto::ed25519::VerifyingKey;
    use tessera_transport::mock::MockTransport;
    use tessera_transport::TransportError;
    use tessera_types::{NodeConfig, RelayConfig};

    use super::*;

    const KEY: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    fn cluster() -> Arc<ClusterConfig> {
        let key = VerifyingKey::from_hex(KEY).expect("key");
        let nodes = (1..=3)
            .map(|i| NodeConfig::new(format!("https://node{i}.test"), key.clone()))
            .collect();
        let relay = RelayConfig {
            endpoint: "http://localhost:8080".into(),
            verifying_key: key,
        };
        Arc::new(ClusterConfig::new(relay, nodes, 2, 10).expect("cluster"))
    }

    #[tokio::test]
    async fn test_github_exchange_uses_first_node() {
        let transport = Arc::new(MockTransport::new(|_| {
            Ok(json!({
                "access_token": "gho_x",
                "user_info": { "id": 42, "login": "octocat" }
            }))
        }));
        let bridge = IdentityBridge::new(transport.clone(), cluster());

        let login = bridge.exchange_github_code("abc").await.expect("exchange");
        assert_eq!(login.access_token, "gho_x");
        assert_eq!(
            login.profile,
            Some(GithubProfile {
                id: 42,
                login: "octocat".into()
            })
        );

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "https://node1.test/v1/get_github_token");
        assert_eq!(calls[0].body, Some(json!({ "code": "abc" })));
    }

    #[tokio::test]
    async fn test_github_malformed_profile_degrades() {
        let transport = Arc::new(MockTransport::new(|_| {
            Ok(json!({ "access_token": "gho_x", "user_info": { "login": 7 } }))
        }));
        let bridge = IdentityBridge::new(transport, cluster());
        let login = bridge.exchange_github_code("abc").await.expect("exchange");
        assert_eq!(login.access_token, "gho_x");
        assert!(login.profile.is_none());
    }

    #[tokio::test]
    async fn test_twitter_exchange_sends_verifier() {
        let transport = Arc::new(MockTransport::new(|_| Ok(json!({ "access_token": "tw" }))));
        let bridge = IdentityBridge::new(transport.clone(), cluster());

        let token = bridge
            .exchange_twitter_code("code", "verifier")
            .await
            .expect("exchange");
        assert_eq!(token, "tw");
        let calls = transport.calls_to("/v1/exchange_code_for_token");
        assert_eq!(
            calls[0].body,
            Some(json!({ "token": "code", "code_verifier": "verifier" }))
        );
    }

    #[tokio::test]
    async fn test_twitter_exchange_failure_propagates() {
        let transport = Arc::new(MockTransport::new(|request| {
            Err(TransportError::Status {
                url: request.url.clone(),
                status: 500,
            })
        }));
        let bridge = IdentityBridge::new(transport, cluster());
        assert!(bridge.exchange_twitter_code("code", "v").await.is_err());
    }

    #[tokio::test]
    async fn test_twitter_profile_degrades_on_failure() {
        let ok = Arc::new(MockTransport::new(|_| {
            Ok(json!({ "id": "1", "name": "Jack", "username": "jack" }))
        }));
        let profile = IdentityBridge::new(ok, cluster())
            .verify_twitter_token("tw")
            .await
            .expect("verify");
        assert_eq!(profile.map(|p| p.username), Some("jack".to_string()));

        let failing = Arc::new(MockTransport::new(|request| {
            Err(TransportError::Unauthorized {
                url: request.url.clone(),
            })
        }));
        let profile = IdentityBridge::new(failing, cluster())
            .verify_twitter_token("tw")
            .await
            .expect("degrades");
        assert!(profile.is_none());
    }
}
