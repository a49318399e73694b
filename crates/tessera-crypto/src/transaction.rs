//! Transaction serialization.
//!
//! Supports legacy transactions (with EIP-155 replay protection when a chain
//! id is present), EIP-2930 access-list transactions and EIP-1559 fee-market
//! transactions. A [`Transaction`] is the JSON request a caller hands in; it
//! is validated and lowered onto the matching `alloy-consensus` type, which
//! owns the signing payload and the signed envelope encoding.

use alloy_consensus::{SignableTransaction, TxEip1559, TxEip2930, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_eips::eip2930::AccessList;
use alloy_primitives::{Bytes, TxKind, U256};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::signature::Signature;
use crate::{CryptoError, Result};

/// A transaction request.
///
/// Numeric fields accept JSON numbers, decimal strings or `0x` hex strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Envelope type: 0 (legacy), 1 (EIP-2930) or 2 (EIP-1559). Inferred
    /// from the fee fields when absent.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<u8>,
    /// Declared sender. Never serialized into the signed payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Recipient; `None` for contract creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, with = "quantity")]
    pub nonce: u64,
    #[serde(default, with = "quantity")]
    pub gas_limit: u64,
    #[serde(default, with = "quantity::option", skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u128>,
    #[serde(default, with = "quantity::option", skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<u128>,
    #[serde(default, with = "quantity::option", skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<u128>,
    #[serde(default, with = "quantity")]
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
    /// 0 means no replay protection (legacy only).
    #[serde(default, with = "quantity")]
    pub chain_id: u64,
    #[serde(default, skip_serializing_if = "is_empty_access_list")]
    pub access_list: AccessList,
}

fn is_empty_access_list(list: &AccessList) -> bool {
    list.0.is_empty()
}

/// A validated request lowered onto its envelope type.
enum Unsigned {
    Legacy(TxLegacy),
    Eip2930(TxEip2930),
    Eip1559(TxEip1559),
}

impl Unsigned {
    fn encode_for_signing(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Self::Legacy(tx) => tx.encode_for_signing(&mut out),
            Self::Eip2930(tx) => tx.encode_for_signing(&mut out),
            Self::Eip1559(tx) => tx.encode_for_signing(&mut out),
        }
        out
    }

    fn signature_hash(&self) -> [u8; 32] {
        match self {
            Self::Legacy(tx) => tx.signature_hash().0,
            Self::Eip2930(tx) => tx.signature_hash().0,
            Self::Eip1559(tx) => tx.signature_hash().0,
        }
    }

    fn into_envelope(self, signature: Signature) -> TxEnvelope {
        match self {
            Self::Legacy(tx) => tx.into_signed(signature).into(),
            Self::Eip2930(tx) => tx.into_signed(signature).into(),
            Self::Eip1559(tx) => tx.into_signed(signature).into(),
        }
    }
}

impl Transaction {
    /// The envelope type this transaction serializes as.
    pub fn envelope_type(&self) -> Result<u8> {
        let has_1559_fees = self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some();
        let inferred = match self.tx_type {
            Some(t) => t,
            None if has_1559_fees => 2,
            None if !is_empty_access_list(&self.access_list) => 1,
            None => 0,
        };
        match inferred {
            0 | 1 => {
                if has_1559_fees {
                    return Err(CryptoError::InvalidInput(format!(
                        "type {inferred} transaction cannot carry EIP-1559 fee fields"
                    )));
                }
                if inferred == 0 && !is_empty_access_list(&self.access_list) {
                    return Err(CryptoError::InvalidInput(
                        "legacy transaction cannot carry an access list".to_string(),
                    ));
                }
            }
            2 => {
                if let (Some(price), Some(max)) = (self.gas_price, self.max_fee_per_gas) {
                    if price != max {
                        return Err(CryptoError::InvalidInput(
                            "gasPrice conflicts with maxFeePerGas".to_string(),
                        ));
                    }
                }
            }
            other => {
                return Err(CryptoError::InvalidInput(format!(
                    "unsupported transaction type {other}"
                )))
            }
        }
        Ok(inferred)
    }

    fn lower(&self) -> Result<Unsigned> {
        let to = self.to.map_or(TxKind::Create, TxKind::Call);
        let input = self.data.clone();
        Ok(match self.envelope_type()? {
            0 => Unsigned::Legacy(TxLegacy {
                chain_id: (self.chain_id != 0).then_some(self.chain_id),
                nonce: self.nonce,
                gas_price: self.gas_price.unwrap_or_default(),
                gas_limit: self.gas_limit,
                to,
                value: self.value,
                input,
            }),
            1 => Unsigned::Eip2930(TxEip2930 {
                chain_id: self.chain_id,
                nonce: self.nonce,
                gas_price: self.gas_price.unwrap_or_default(),
                gas_limit: self.gas_limit,
                to,
                value: self.value,
                access_list: self.access_list.clone(),
                input,
            }),
            _ => Unsigned::Eip1559(TxEip1559 {
                chain_id: self.chain_id,
                nonce: self.nonce,
                gas_limit: self.gas_limit,
                max_fee_per_gas: self.max_fee_per_gas.or(self.gas_price).unwrap_or_default(),
                max_priority_fee_per_gas: self.max_priority_fee_per_gas.unwrap_or_default(),
                to,
                value: self.value,
                access_list: self.access_list.clone(),
                input,
            }),
        })
    }

    /// Serialize without a signature (the signing payload).
    pub fn serialize_unsigned(&self) -> Result<Vec<u8>> {
        Ok(self.lower()?.encode_for_signing())
    }

    /// Serialize with a signature attached, in EIP-2718 envelope form.
    pub fn serialize_signed(&self, signature: &Signature) -> Result<Vec<u8>> {
        Ok(self.lower()?.into_envelope(*signature).encoded_2718())
    }

    /// Digest the cluster signs: `keccak256(serialize_unsigned())`.
    pub fn signing_hash(&self) -> Result<[u8; 32]> {
        Ok(self.lower()?.signature_hash())
    }
}

/// Quantities: JSON numbers, decimal strings, or `0x` hex strings.
pub(crate) mod quantity {
    use std::fmt::LowerHex;

    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub trait Quantity: Sized + LowerHex {
        fn from_number(value: u64) -> Self;
        fn from_text(text: &str) -> Result<Self, String>;
    }

    macro_rules! primitive_quantity {
        ($($ty:ty),*) => {$(
            impl Quantity for $ty {
                fn from_number(value: u64) -> Self {
                    value.into()
                }

                fn from_text(text: &str) -> Result<Self, String> {
                    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                        Some("") => Ok(0),
                        Some(hex) => <$ty>::from_str_radix(hex, 16)
                            .map_err(|e| format!("bad hex quantity {text}: {e}")),
                        None => text
                            .parse::<$ty>()
                            .map_err(|e| format!("bad decimal quantity {text}: {e}")),
                    }
                }
            }
        )*};
    }

    primitive_quantity!(u64, u128);

    impl Quantity for U256 {
        fn from_number(value: u64) -> Self {
            U256::from(value)
        }

        fn from_text(text: &str) -> Result<Self, String> {
            if text == "0x" || text == "0X" {
                return Ok(U256::ZERO);
            }
            text.parse::<U256>()
                .map_err(|e| format!("bad quantity {text}: {e}"))
        }
    }

    fn parse<T: Quantity>(raw: &serde_json::Value) -> Result<T, String> {
        match raw {
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(T::from_number)
                .ok_or_else(|| format!("quantity must be a non-negative integer: {n}")),
            serde_json::Value::String(s) => T::from_text(s.trim()),
            serde_json::Value::Null => Ok(T::from_number(0)),
            other => Err(format!("unsupported quantity: {other}")),
        }
    }

    pub fn serialize<T: Quantity, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{value:x}"))
    }

    pub fn deserialize<'de, T: Quantity, D: Deserializer<'de>>(deserializer: D) -> Result<T, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        use super::Quantity;

        pub fn serialize<T: Quantity, S: Serializer>(
            value: &Option<T>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, T: Quantity, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<T>, D::Error> {
            let raw = serde_json::Value::deserialize(deserializer)?;
            if raw.is_null() {
                return Ok(None);
            }
            super::parse(&raw).map(Some).map_err(serde::de::Error::custom)
        }
    }
}
