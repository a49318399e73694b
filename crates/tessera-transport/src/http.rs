//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::{NodeTransport, Result, TransportError};

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// JSON transport over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    async fn handle_response(url: &str, response: reqwest::Response) -> Result<Value> {
        match response.status() {
            StatusCode::OK => response.json().await.map_err(|e| TransportError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            }),
            StatusCode::UNAUTHORIZED => Err(TransportError::Unauthorized {
                url: url.to_string(),
            }),
            StatusCode::NOT_FOUND => Err(TransportError::EndpointNotFound {
                url: url.to_string(),
            }),
            status => Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }),
        }
    }
}

fn network(url: &str, err: reqwest::Error) -> TransportError {
    TransportError::Network {
        url: url.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl NodeTransport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| network(url, e))?;
        Self::handle_response(url, response).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        debug!(url, "POST");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| network(url, e))?;
        Self::handle_response(url, response).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::NodeTransportExt;

    fn transport() -> HttpTransport {
        HttpTransport::new(&HttpConfig { timeout_secs: 5 }).expect("client")
    }

    #[tokio::test]
    async fn test_get_parses_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/get_account"))
            .and(query_param("uuid", "alice@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "account_type": "unknown",
                "public_keys": []
            })))
            .mount(&server)
            .await;

        let url = format!("{}/v1/get_account?uuid=alice%40example.com", server.uri());
        let body = transport().get_json(&url).await.expect("get");
        assert_eq!(body["account_type"], "unknown");
    }

    #[tokio::test]
    async fn test_post_sends_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/register_google_jwt"))
            .and(body_json(json!({ "token": "cred" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "node" })))
            .expect(1)
            .mount(&server)
            .await;

        #[derive(serde::Deserialize)]
        struct Reply {
            token: String,
        }

        let url = format!("{}/v1/register_google_jwt", server.uri());
        let reply: Reply = transport()
            .post(&url, &json!({ "token": "cred" }))
            .await
            .expect("post");
        assert_eq!(reply.token, "node");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        for (route, status) in [("/unauthorized", 401), ("/missing", 404), ("/busy", 503)] {
            Mock::given(path(route))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;
        }

        let t = transport();
        let err = t
            .post_json(&format!("{}/unauthorized", server.uri()), &json!({}))
            .await
            .expect_err("401");
        assert!(matches!(err, TransportError::Unauthorized { .. }));

        let err = t
            .get_json(&format!("{}/missing", server.uri()))
            .await
            .expect_err("404");
        assert!(matches!(err, TransportError::EndpointNotFound { .. }));

        let err = t
            .get_json(&format!("{}/busy", server.uri()))
            .await
            .expect_err("503");
        assert!(matches!(err, TransportError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/keygen"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = transport()
            .post_json(&format!("{}/v1/keygen", server.uri()), &json!({}))
            .await
            .expect_err("decode");
        assert!(matches!(err, TransportError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_is_network_error() {
        let err = transport()
            .get_json("http://127.0.0.1:1/v1/get_account")
            .await
            .expect_err("network");
        assert!(matches!(err, TransportError::Network { .. }));
    }
}
