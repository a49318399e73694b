//! # tessera-ceremony
//!
//! Coordination of key-generation and signing ceremonies across the signer
//! cluster.
//!
//! The nodes run the threshold protocol among themselves; this crate decides
//! who takes part, gets every participant authorized, dispatches the
//! ceremony request and checks that the answers agree.
//!
//! ## Modules
//!
//! - [`instance`] — Random 32-byte ceremony instance identifiers
//! - [`quorum`] — Pure participant selection over the cluster directory
//! - [`consistency`] — Aggregation of per-node outputs
//! - [`resolver`] — Cluster-wide account lookup with agreement checks
//! - [`session`] — The authenticated identity a signing ceremony acts for
//! - [`coordinator`] — Keygen and signing ceremonies
//!
//! ## Ceremony flow
//!
//! ```text
//! select participants -> authorize (register_<provider>_jwt, all-or-nothing)
//!                     -> dispatch (keygen | signgen, one token per node)
//!                     -> aggregate (consistency policy)
//! ```

pub mod consistency;
pub mod coordinator;
pub mod instance;
pub mod quorum;
pub mod resolver;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

pub use consistency::ConsistencyPolicy;
pub use coordinator::{CeremonyOptions, Coordinator};
pub use instance::InstanceId;
pub use resolver::AccountResolver;
pub use session::Session;

use tessera_crypto::CryptoError;
use tessera_identity::IdentityError;
use tessera_transport::TransportError;

/// Error types for ceremony coordination.
#[derive(Debug, thiserror::Error)]
pub enum CeremonyError {
    /// A node failed a ceremony or lookup request.
    #[error("node {node} failed: {source}")]
    NodeFailed {
        node: String,
        #[source]
        source: TransportError,
    },

    /// Authorization of the participant set failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Nodes disagree about the user's account.
    #[error("inconsistent cluster: {0}")]
    InconsistentCluster(String),

    /// Nodes that should agree returned different ceremony outputs.
    #[error("divergent {kind} output from {distinct} distinct values")]
    DivergentOutput { kind: &'static str, distinct: usize },

    /// Not enough healthy nodes remain to form a quorum.
    #[error("quorum failure: need {required}, have {available}")]
    QuorumFailure { required: usize, available: usize },

    /// Cluster parameters or ceremony options are invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Signing requires a logged-in session.
    #[error("not authenticated")]
    NotAuthenticated,

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl CeremonyError {
    /// Endpoint of the node responsible for this failure, if any.
    pub fn failed_node(&self) -> Option<&str> {
        match self {
            CeremonyError::NodeFailed { node, .. } => Some(node.as_str()),
            CeremonyError::Identity(IdentityError::AuthorizationFailed { node, .. }) => {
                Some(node.as_str())
            }
            _ => None,
        }
    }

    /// Underlying transport failure, if any.
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            CeremonyError::NodeFailed { source, .. }
            | CeremonyError::Identity(IdentityError::AuthorizationFailed { source, .. }) => {
                Some(source)
            }
            CeremonyError::Identity(IdentityError::Transport(source)) => Some(source),
            _ => None,
        }
    }

    /// Whether a node answered 401.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.transport_error(), Some(TransportError::Unauthorized { .. }))
    }
}

/// Convenience result type for ceremony coordination.
pub type Result<T> = std::result::Result<T, CeremonyError>;
