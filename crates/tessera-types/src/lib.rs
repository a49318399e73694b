//! # tessera-types
//!
//! Shared domain types used across the Tessera workspace: the cluster
//! directory, authentication methods, account records and the JSON bodies
//! exchanged with signer nodes.
//!
//! ## Modules
//!
//! - [`cluster`] — Immutable cluster directory and its validation
//! - [`auth`] — Closed set of identity providers and their wire codes
//! - [`account`] — Account records discovered from the cluster
//! - [`wire`] — Request and response bodies for node endpoints
//! - [`bridge`] — Identity-bridging bodies (GitHub, Twitter, auth service)

pub mod account;
pub mod auth;
pub mod bridge;
pub mod cluster;
pub mod wire;

/// 32-byte ceremony instance identifier.
pub type InstanceBytes = [u8; 32];

/// Path prefix shared by every node endpoint.
pub const API_PREFIX: &str = "/v1";

/// Hash algorithm tag sent with every signing ceremony.
pub const HASH_ALGO: &str = "hashu32";

/// Account type reported by a node that has never seen the user.
pub const UNKNOWN_ACCOUNT: &str = "unknown";

/// Rank assigned to every ceremony party.
pub const PARTY_RANK: u8 = 0;

pub use account::AccountRecord;
pub use auth::{AuthMethod, UnsupportedMethod};
pub use cluster::{ClusterConfig, ConfigError, NodeConfig, RelayConfig};
