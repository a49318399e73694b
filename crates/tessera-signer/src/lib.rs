//! # tessera-signer
//!
//! The signing surface handed to applications after login.
//!
//! ## Modules
//!
//! - [`login`] — Login flows per provider and the active session
//! - [`signer`] — Message, transaction and typed-data signing
//! - [`names`] — Name resolution for typed-data address fields

pub mod login;
pub mod names;
pub mod signer;

#[cfg(test)]
pub(crate) mod testutil;

pub use login::LoginService;
pub use names::{NameResolver, StaticNameResolver};
pub use signer::ThresholdSigner;

use tessera_ceremony::CeremonyError;
use tessera_crypto::address::Address;
use tessera_crypto::CryptoError;
use tessera_identity::IdentityError;

/// Error types for signing operations.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The transaction names a sender other than the session wallet.
    #[error("transaction from address mismatch (from: {from}, address: {address})")]
    FromMismatch { from: Address, address: Address },

    /// No session is active.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Typed-data signing needs a name resolver.
    #[error("a name resolver is required for typed data signing")]
    NoNameResolver,

    /// A resolver backend failed; unknown names are not errors.
    #[error("name resolution failed for {name}: {message}")]
    NameResolution { name: String, message: String },

    /// Login input is unusable.
    #[error("login error: {0}")]
    Login(String),

    #[error(transparent)]
    Ceremony(#[from] CeremonyError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Result type alias for signing operations.
pub type Result<T> = std::result::Result<T, SignerError>;
