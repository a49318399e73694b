//! # tessera-identity
//!
//! Turns a federated identity credential into node-scoped authorization.
//!
//! ## Modules
//!
//! - [`adapter`] — Per-node registration for a ceremony payload
//! - [`bridge`] — GitHub and Twitter code/token exchange via the first node
//! - [`auth_service`] — Google credential login against the auth service
//! - [`pkce`] — PKCE verifiers and a write-once/read-once verifier store

pub mod adapter;
pub mod auth_service;
pub mod bridge;
pub mod pkce;

pub use adapter::{IdentityAdapter, NodeAuthToken};
pub use auth_service::AuthServiceClient;
pub use bridge::{GithubLogin, IdentityBridge};
pub use pkce::{PkceChallenge, PkceStore};

use tessera_transport::TransportError;
use tessera_types::UnsupportedMethod;

/// Error types for identity operations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// A node refused or failed the registration request.
    #[error("authorization failed at {node}: {source}")]
    AuthorizationFailed {
        node: String,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    UnsupportedMethod(#[from] UnsupportedMethod),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The directory has no node to route bridging calls to.
    #[error("no nodes available in the cluster")]
    NoNodes,

    /// A PKCE verifier is already stored for this state.
    #[error("verifier already stored for state {0}")]
    VerifierOccupied(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type alias for identity operations.
pub type Result<T> = std::result::Result<T, IdentityError>;
