//! Hex helpers.
//!
//! Nodes exchange keys, instance ids and digests as bare lowercase hex;
//! EVM tooling prefixes the same values with `0x`. Decoding accepts both.

use crate::{CryptoError, Result};

/// Encode bytes as lowercase hex without a prefix.
pub fn encode_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(bytes)
}

/// Encode bytes as lowercase hex with a `0x` prefix.
pub fn encode_hex_prefixed(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Strip an optional `0x`/`0X` prefix.
pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Decode a hex string, with or without a `0x` prefix.
pub fn decode_hex(value: &str) -> Result<Vec<u8>> {
    let trimmed = strip_hex_prefix(value.trim());
    if trimmed.is_empty() {
        return Err(CryptoError::InvalidHex("empty hex string".to_string()));
    }
    hex::decode(trimmed).map_err(|e| CryptoError::InvalidHex(e.to_string()))
}

/// Decode a hex string into a fixed-size array.
pub fn decode_hex_array<const N: usize>(value: &str) -> Result<[u8; N]> {
    let bytes = decode_hex(value)?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKeyLength {
            expected: N,
            actual,
        })
}
