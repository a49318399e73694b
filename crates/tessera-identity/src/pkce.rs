//! PKCE (RFC 7636) for the Twitter authorization-code flow.
//!
//! The verifier is generated when the user is sent to the provider, kept
//! under the OAuth `state` value, and consumed exactly once when the code
//! comes back.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::{IdentityError, Result};

/// Challenge method sent to the provider.
pub const CHALLENGE_METHOD: &str = "S256";

/// Twitter's OAuth 2.0 authorization endpoint.
pub const TWITTER_AUTHORIZE_URL: &str = "https://twitter.com/i/oauth2/authorize";

/// A verifier and its S256 challenge.
pub struct PkceChallenge {
    verifier: Zeroizing<String>,
    challenge: String,
}

impl PkceChallenge {
    /// Fresh random verifier (32 bytes, base64url, 43 characters).
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; 32]);
        rand::thread_rng().fill_bytes(&mut bytes[..]);
        Self::from_verifier(URL_SAFE_NO_PAD.encode(&bytes[..]))
    }

    pub fn from_verifier(verifier: impl Into<String>) -> Self {
        let verifier = Zeroizing::new(verifier.into());
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    /// Provider authorization URL carrying this challenge.
    pub fn authorize_url(
        &self,
        base: &str,
        client_id: &str,
        redirect_uri: &str,
        scope: &str,
        state: &str,
    ) -> String {
        format!(
            "{base}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&code_challenge={}&code_challenge_method={CHALLENGE_METHOD}",
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(scope),
            urlencoding::encode(state),
            self.challenge,
        )
    }
}

/// Verifiers awaiting their authorization code, keyed by OAuth state.
#[derive(Default)]
pub struct PkceStore {
    entries: Mutex<HashMap<String, Zeroizing<String>>>,
}

impl PkceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Zeroizing<String>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store the verifier for `state`. Fails if one is already stored.
    pub fn put(&self, state: &str, verifier: &str) -> Result<()> {
        let mut entries = self.entries();
        if entries.contains_key(state) {
            return Err(IdentityError::VerifierOccupied(state.to_string()));
        }
        entries.insert(state.to_string(), Zeroizing::new(verifier.to_string()));
        Ok(())
    }

    /// Remove and return the verifier for `state`.
    pub fn take(&self, state: &str) -> Option<Zeroizing<String>> {
        self.entries().remove(state)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc7636_vector() {
        let pkce = PkceChallenge::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        assert_eq!(pkce.challenge(), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_generated_verifier_shape() {
        let a = PkceChallenge::generate();
        let b = PkceChallenge::generate();
        assert_eq!(a.verifier().len(), 43);
        assert_ne!(a.verifier(), b.verifier());
        assert!(a
            .verifier()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_authorize_url() {
        let pkce = PkceChallenge::from_verifier("v");
        let url = pkce.authorize_url(
            TWITTER_AUTHORIZE_URL,
            "cid",
            "https://app.test/cb",
            "users.read tweet.read",
            "s_twitter",
        );
        assert!(url.starts_with("https://twitter.com/i/oauth2/authorize?response_type=code"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.test%2Fcb"));
        assert!(url.contains("scope=users.read%20tweet.read"));
        assert!(url.contains(&format!("code_challenge={}", pkce.challenge())));
        assert!(url.ends_with("code_challenge_method=S256"));
    }

    #[test]
    fn test_store_write_once_read_once() {
        let store = PkceStore::new();
        store.put("s1", "verifier").expect("put");
        assert!(matches!(
            store.put("s1", "other"),
            Err(IdentityError::VerifierOccupied(_))
        ));
        assert_eq!(store.len(), 1);

        let taken = store.take("s1").expect("present");
        assert_eq!(taken.as_str(), "verifier");
        assert!(store.take("s1").is_none());
        assert!(store.is_empty());
    }
}
