//! # tessera-crypto
//!
//! Cryptographic encodings used by the threshold signing client.
//!
//! The signer nodes run the threshold math; this crate only deals with the
//! artifacts on either side of a ceremony: the keys nodes report, the digests
//! the client asks them to sign, and the signatures they hand back.
//!
//! ## Modules
//!
//! - [`encoding`] — Hex helpers tolerant of an optional `0x` prefix
//! - [`ed25519`] — Ed25519 verifying keys for nodes and the relay
//! - [`keccak`] — EIP-191 personal-message hashing
//! - [`address`] — EIP-55 account addresses derived from SEC1 public keys
//! - [`signature`] — Raw ceremony output decoding and 65-byte signatures
//! - [`transaction`] — Legacy, EIP-2930 and EIP-1559 transaction serialization
//! - [`typed_data`] — EIP-712 structured data hashing
//!
//! Transaction envelopes and EIP-712 hashing come from the `alloy`
//! crates; this crate adapts them to the shapes the cluster speaks.

pub mod address;
pub mod ed25519;
pub mod encoding;
pub mod keccak;
pub mod signature;
pub mod transaction;
pub mod typed_data;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// A hex string could not be decoded.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// A public key is not a valid curve point.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// An account address is malformed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Raw ceremony output does not follow the `r || s || flag` layout.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// Structured data could not be encoded.
    #[error("typed data error: {0}")]
    TypedData(String),

    /// Invalid input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
