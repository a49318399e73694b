//! # tessera-transport
//!
//! JSON-over-HTTP transport to signer nodes and the auth service.
//!
//! Ceremony code talks to nodes through the [`NodeTransport`] trait so that
//! the fan-out logic can be exercised without a network. [`HttpTransport`]
//! is the production implementation.
//!
//! Status handling is uniform across endpoints:
//!
//! ```text
//! 200            -> body parsed as JSON
//! 401            -> TransportError::Unauthorized
//! 404            -> TransportError::EndpointNotFound
//! anything else  -> TransportError::Status
//! ```

pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub use http::{HttpConfig, HttpTransport};

/// Error types for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint rejected the request (HTTP 401).
    #[error("unauthorized access: {url}")]
    Unauthorized { url: String },

    /// The endpoint does not exist (HTTP 404).
    #[error("endpoint not found: {url}")]
    EndpointNotFound { url: String },

    /// Any other non-200 status.
    #[error("status {status} from {url}")]
    Status { url: String, status: u16 },

    /// The request never produced a response.
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The response body was not the expected JSON.
    #[error("decode error for {url}: {message}")]
    Decode { url: String, message: String },

    /// The HTTP client could not be built.
    #[error("client error: {0}")]
    Client(String),
}

impl TransportError {
    /// URL of the failed request, when there was one.
    pub fn url(&self) -> Option<&str> {
        match self {
            TransportError::Unauthorized { url }
            | TransportError::EndpointNotFound { url }
            | TransportError::Status { url, .. }
            | TransportError::Network { url, .. }
            | TransportError::Decode { url, .. } => Some(url.as_str()),
            TransportError::Client(_) => None,
        }
    }
}

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Request/response access to a node.
#[async_trait]
pub trait NodeTransport: Send + Sync {
    /// `GET url`, returning the JSON body of a 200 response.
    async fn get_json(&self, url: &str) -> Result<Value>;

    /// `POST url` with a JSON body, returning the JSON body of a 200 response.
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value>;
}

/// Typed helpers over any [`NodeTransport`].
#[async_trait]
pub trait NodeTransportExt: NodeTransport {
    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let value = self.get_json(url).await?;
        decode(url, value)
    }

    async fn post<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|e| TransportError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let value = self.post_json(url, &body).await?;
        decode(url, value)
    }
}

impl<T: NodeTransport + ?Sized> NodeTransportExt for T {}

fn decode<T: DeserializeOwned>(url: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| TransportError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}
