//! Keccak-256 personal-message hashing.

use alloy_primitives::eip191_hash_message;

/// Personal-message digest (EIP-191, version `0x45`):
/// `keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)`.
pub fn hash_message(message: impl AsRef<[u8]>) -> [u8; 32] {
    eip191_hash_message(message).0
}
