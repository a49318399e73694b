//! Login sessions.

use std::fmt;

use tessera_crypto::address::{self, Address};
use tessera_types::AuthMethod;
use zeroize::Zeroizing;

use crate::Result;

/// The identity a signing ceremony acts for.
///
/// Created by a successful login and dropped on logout. The wallet address
/// is derived from the public key when the session is created.
#[derive(Clone)]
pub struct Session {
    auth_method: AuthMethod,
    user_id: String,
    id_token: Zeroizing<String>,
    public_key: String,
    wallet_address: Address,
}

impl Session {
    /// Build a session for `public_key` (SEC1 hex, `0x` optional).
    pub fn new(
        auth_method: AuthMethod,
        user_id: impl Into<String>,
        id_token: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Result<Self> {
        let public_key = public_key.into();
        let wallet_address = address::from_public_key_hex(&public_key)?;
        Ok(Self {
            auth_method,
            user_id: user_id.into(),
            id_token: Zeroizing::new(id_token.into()),
            public_key,
            wallet_address,
        })
    }

    pub fn auth_method(&self) -> AuthMethod {
        self.auth_method
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn id_token(&self) -> &str {
        &self.id_token
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn wallet_address(&self) -> Address {
        self.wallet_address
    }

    /// Whether every field a signing ceremony needs is present.
    pub fn is_authenticated(&self) -> bool {
        !self.user_id.is_empty() && !self.id_token.is_empty() && !self.public_key.is_empty()
    }

    /// Whether this session already holds the key of `user_id`.
    pub fn holds_key_for(&self, user_id: &str) -> bool {
        self.user_id == user_id && !self.public_key.is_empty()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("auth_method", &self.auth_method)
            .field("user_id", &self.user_id)
            .field("id_token", &"<redacted>")
            .field("public_key", &self.public_key)
            .field("wallet_address", &self.wallet_address)
            .finish()
    }
}
