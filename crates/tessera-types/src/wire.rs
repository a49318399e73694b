//! Ceremony request and response bodies.
//!
//! Node endpoints speak JSON. Instance identifiers travel as lowercase hex
//! both at the top level of a request and inside its `opts`.

use serde::{Deserialize, Serialize};
use serde_with::hex::Hex;
use serde_with::serde_as;

use crate::InstanceBytes;

/// Ceremony parameters shared by registration and dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CeremonySetup {
    Keygen {
        n: usize,
        t: usize,
    },
    Sign {
        n: usize,
        t: usize,
        /// Hex digest without `0x`.
        message: String,
    },
}

/// The payload each node authorizes during registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeremonyPayload {
    pub setup: CeremonySetup,
    /// Ceremony ttl in seconds.
    pub timeout: u64,
    /// Creation time (RFC 3339), stamped when registration starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl CeremonyPayload {
    pub fn keygen(n: usize, t: usize, ttl: u64) -> Self {
        Self {
            setup: CeremonySetup::Keygen { n, t },
            timeout: ttl,
            time: None,
        }
    }

    pub fn sign(n: usize, t: usize, message: impl Into<String>, ttl: u64) -> Self {
        Self {
            setup: CeremonySetup::Sign {
                n,
                t,
                message: message.into(),
            },
            timeout: ttl,
            time: None,
        }
    }
}

/// `POST /v1/register_<provider>_jwt` request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// The user's bearer credential.
    pub token: String,
    pub payload: CeremonyPayload,
    /// The user identifier.
    pub uuid: String,
}

/// `POST /v1/register_<provider>_jwt` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Node-scoped authorization token.
    pub token: String,
}

/// A ceremony participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub rank: u8,
    /// Node verifying key, lowercase hex.
    pub public_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeygenSetup {
    pub t: usize,
    pub parties: Vec<Party>,
    pub auth_token: String,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeygenOpts {
    pub setup: KeygenSetup,
    #[serde_as(as = "Hex")]
    pub instance: InstanceBytes,
    pub ttl: u64,
}

/// `POST /v1/keygen` request.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeygenRequest {
    #[serde_as(as = "Hex")]
    pub instance: InstanceBytes,
    pub opts: KeygenOpts,
}

/// `POST /v1/keygen` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeygenResponse {
    pub public_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigngenSetup {
    pub parties: Vec<Party>,
    /// Hex digest without `0x`.
    pub message: String,
    pub public_key: String,
    pub hash_algo: String,
    pub auth_token: String,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigngenOpts {
    pub setup: SigngenSetup,
    #[serde_as(as = "Hex")]
    pub instance: InstanceBytes,
    pub ttl: u64,
}

/// `POST /v1/signgen` request.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigngenRequest {
    #[serde_as(as = "Hex")]
    pub instance: InstanceBytes,
    pub opts: SigngenOpts,
}

/// `POST /v1/signgen` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigngenResponse {
    /// Raw `r || s || flag` hex.
    pub sign: String,
}
