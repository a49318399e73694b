//! Ed25519 verifying keys (RFC 8032).
//!
//! Every signer node and the relay are identified by a long-lived Ed25519
//! key. Nodes list each other's keys as ceremony parties, and the relay
//! authenticates node traffic with them. The client never signs with these
//! keys; it only carries them in ceremony requests.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::encoding::{decode_hex_array, encode_hex};
use crate::{CryptoError, Result};

/// Length of an Ed25519 seed (secret key) in bytes.
pub const SEED_LENGTH: usize = 32;

/// An Ed25519 verification key (public key).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKey {
    inner: ed25519_dalek::VerifyingKey,
}

impl VerifyingKey {
    /// Create a verifying key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let inner = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Parse a verifying key from hex.
    pub fn from_hex(value: &str) -> Result<Self> {
        let bytes: [u8; 32] = decode_hex_array(value)?;
        Self::from_bytes(&bytes)
    }

    /// Derive the verifying key belonging to a 32-byte seed.
    ///
    /// The seed is wiped once the key has been derived.
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        if seed.len() != SEED_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: SEED_LENGTH,
                actual: seed.len(),
            });
        }
        let mut secret = Zeroizing::new([0u8; SEED_LENGTH]);
        secret.copy_from_slice(seed);
        let signing_key = ed25519_dalek::SigningKey::from_bytes(&secret);
        Ok(Self {
            inner: signing_key.verifying_key(),
        })
    }

    /// Derive the verifying key belonging to a hex-encoded seed.
    pub fn from_seed_hex(seed_hex: &str) -> Result<Self> {
        let seed = Zeroizing::new(crate::encoding::decode_hex(seed_hex)?);
        Self::from_seed(&seed)
    }

    /// Get the raw bytes of this verifying key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Lowercase hex, as used in ceremony party lists.
    pub fn to_hex(&self) -> String {
        encode_hex(self.inner.as_bytes())
    }

}
