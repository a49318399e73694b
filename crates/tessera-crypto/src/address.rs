//! Account addresses.
//!
//! An address is the last 20 bytes of the Keccak-256 hash of the
//! uncompressed secp256k1 public key. [`Address`] renders with the EIP-55
//! mixed-case checksum.

pub use alloy_primitives::Address;

use crate::encoding::decode_hex;
use crate::{CryptoError, Result};

/// Derive the address of a SEC1-encoded public key.
///
/// Accepts both the 33-byte compressed and 65-byte uncompressed forms.
pub fn from_public_key(sec1: &[u8]) -> Result<Address> {
    let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(sec1)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
    Ok(Address::from_public_key(&key))
}

/// Derive the address of a hex-encoded public key, as reported by the
/// cluster (`0x` prefix optional).
pub fn from_public_key_hex(public_key: &str) -> Result<Address> {
    from_public_key(&decode_hex(public_key)?)
}

/// Parse an address, enforcing the EIP-55 checksum when the input is
/// mixed-case.
pub fn parse(value: &str) -> Result<Address> {
    let value = value.trim();
    let body = crate::encoding::strip_hex_prefix(value);
    let mixed_case = body.bytes().any(|b| b.is_ascii_lowercase())
        && body.bytes().any(|b| b.is_ascii_uppercase());
    let parsed = if mixed_case {
        Address::parse_checksummed(format!("0x{body}"), None)
            .map_err(|e| CryptoError::InvalidAddress(format!("{value}: {e}")))?
    } else {
        value
            .parse()
            .map_err(|e| CryptoError::InvalidAddress(format!("{value}: {e}")))?
    };
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERATOR_UNCOMPRESSED: &str = "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";
    const GENERATOR_COMPRESSED: &str =
        "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    #[test]
    fn test_address_of_generator() {
        // Private key 1 has the generator as its public key.
        let addr = from_public_key_hex(GENERATOR_UNCOMPRESSED).expect("derive");
        assert_eq!(addr.to_string(), "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf");
    }

    #[test]
    fn test_compressed_and_uncompressed_agree() {
        let a = from_public_key_hex(GENERATOR_UNCOMPRESSED).expect("derive");
        let b = from_public_key_hex(GENERATOR_COMPRESSED).expect("derive");
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_public_key() {
        assert!(matches!(
            from_public_key_hex("04abcd"),
            Err(CryptoError::InvalidPublicKey(_))
        ));
        assert!(matches!(
            from_public_key_hex("zz"),
            Err(CryptoError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_eip55_vectors() {
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let parsed = parse(&expected.to_lowercase()).expect("parse");
            assert_eq!(parsed.to_string(), expected);
            assert_eq!(parse(expected).expect("checksummed"), parsed);
        }
    }

    #[test]
    fn test_bad_checksum_rejected() {
        assert!(parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD").is_err());
        assert!(parse("0x5aaeb6053f3e94c9b9a09f33669435e7ef1bea").is_err());
    }
}
