//! Account records.

use serde::{Deserialize, Serialize};

/// `GET /v1/get_account` response from a single node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account_type: String,
    #[serde(default)]
    pub public_keys: Vec<String>,
}

/// An account the whole cluster agrees on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub account_type: String,
    /// Candidate public keys (hex), never empty.
    pub public_keys: Vec<String>,
}
