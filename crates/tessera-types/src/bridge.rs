//! Identity-bridging bodies.
//!
//! These endpoints turn provider authorization codes into access tokens and
//! profiles. They are served by the first node of the cluster, except the
//! Google login which goes to the separate auth service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `POST /v1/get_github_token` request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GithubCodeRequest {
    pub code: String,
}

/// `POST /v1/get_github_token` response. `user_info` is kept loose so a
/// malformed profile does not fail the token exchange.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GithubTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub user_info: Option<Value>,
}

/// GitHub user profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubProfile {
    pub id: u64,
    pub login: String,
}

/// `POST /v1/exchange_code_for_token` request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TwitterCodeRequest {
    /// The authorization code.
    pub token: String,
    pub code_verifier: String,
}

/// An access token returned by a code exchange.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// `POST /v1/verify_twitter_token` request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TwitterVerifyRequest {
    pub token: String,
}

/// Twitter user profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitterProfile {
    pub id: String,
    pub name: String,
    pub username: String,
}

/// `POST /v1/login_google_jwt` request to the auth service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoogleLoginRequest {
    pub user_id: String,
    pub token: String,
    pub client_id: String,
}

/// `POST /v1/login_google_jwt` response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoogleLoginResponse {
    pub public_key: String,
}
