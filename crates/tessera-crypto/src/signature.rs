//! Signatures produced by a signing ceremony.
//!
//! A ceremony returns a fixed 130-character hex string:
//!
//! ```text
//! chars   0..64   r            (32 bytes)
//! chars  64..128  s            (32 bytes)
//! chars 128..130  recovery flag ("00" -> 0, anything else -> 1)
//! ```

pub use alloy_primitives::Signature;
use alloy_primitives::{B256, U256};

use crate::address::Address;
use crate::encoding::{encode_hex_prefixed, strip_hex_prefix};
use crate::{CryptoError, Result};

/// Length of a raw ceremony signature in hex characters.
pub const RAW_SIGNATURE_HEX_LEN: usize = 130;

/// Decode the raw `r || s || flag` hex string returned by the cluster.
pub fn from_raw_hex(raw: &str) -> Result<Signature> {
    let raw = strip_hex_prefix(raw.trim());
    if raw.len() != RAW_SIGNATURE_HEX_LEN {
        return Err(CryptoError::MalformedSignature(format!(
            "expected {RAW_SIGNATURE_HEX_LEN} hex characters, got {} bytes",
            raw.len()
        )));
    }
    // Checked up front so the fixed offsets below always land on char boundaries.
    if !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CryptoError::MalformedSignature(
            "signature contains non-hex characters".to_string(),
        ));
    }
    let word = |part: &str| -> Result<U256> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(part, &mut out)
            .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
        Ok(U256::from_be_bytes(out))
    };
    let r = word(&raw[0..64])?;
    let s = word(&raw[64..128])?;
    let odd = &raw[128..130] != "00";
    Ok(Signature::new(r, s, odd))
}

/// The joined 65-byte form `r || s || v` (v = 27 or 28) as `0x`-prefixed hex.
pub fn to_hex(signature: &Signature) -> String {
    encode_hex_prefixed(signature.as_bytes())
}

/// Recover the address that produced `signature` over `digest`.
pub fn recover_address(signature: &Signature, digest: &[u8; 32]) -> Result<Address> {
    signature
        .recover_address_from_prehash(&B256::from(*digest))
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))
}
