//! EIP-712 structured data hashing.
//!
//! The digest handed to the cluster is
//! `keccak256(0x19 || 0x01 || domainSeparator || hashStruct(primaryType, value))`,
//! computed by `alloy-dyn-abi`. The primary type is the single struct in
//! `types` that no other struct references.

use std::collections::{BTreeMap, BTreeSet};

use alloy_dyn_abi::TypedData;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::address::Address;
use crate::{CryptoError, Result};

/// Name of the implicit domain struct.
pub const DOMAIN_TYPE: &str = "EIP712Domain";

/// A field declaration inside a struct type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl TypedField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
        }
    }
}

/// Struct type declarations, keyed by type name.
pub type Types = BTreeMap<String, Vec<TypedField>>;

/// The EIP-712 domain. Absent fields are left out of the domain type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataDomain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(
        default,
        with = "crate::transaction::quantity::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

/// The unique struct type that no other struct references.
///
/// A caller-supplied `EIP712Domain` entry never counts as a candidate.
pub fn primary_type(types: &Types) -> Result<String> {
    let referenced: BTreeSet<&str> = types
        .values()
        .flatten()
        .map(|f| base_type(&f.field_type))
        .collect();
    let roots: Vec<&str> = types
        .keys()
        .map(String::as_str)
        .filter(|name| *name != DOMAIN_TYPE && !referenced.contains(name))
        .collect();
    match roots.as_slice() {
        [root] => Ok((*root).to_string()),
        [] => Err(CryptoError::TypedData("no primary type found".to_string())),
        many => Err(CryptoError::TypedData(format!(
            "ambiguous primary types: {}",
            many.join(", ")
        ))),
    }
}

/// Struct or atomic name with any array suffixes removed.
fn base_type(field_type: &str) -> &str {
    field_type.split('[').next().unwrap_or(field_type)
}

/// Assemble the typed-data document for `value`.
///
/// The domain struct is always derived from `domain`; an `EIP712Domain`
/// entry in `types` is dropped.
pub fn typed_data(domain: &TypedDataDomain, types: &Types, value: &Value) -> Result<TypedData> {
    let primary = primary_type(types)?;
    let struct_types: BTreeMap<&String, &Vec<TypedField>> = types
        .iter()
        .filter(|(name, _)| name.as_str() != DOMAIN_TYPE)
        .collect();

    let mut domain_json = serde_json::Map::new();
    if let Some(name) = &domain.name {
        domain_json.insert("name".into(), json!(name));
    }
    if let Some(version) = &domain.version {
        domain_json.insert("version".into(), json!(version));
    }
    if let Some(chain_id) = domain.chain_id {
        domain_json.insert("chainId".into(), json!(format!("0x{chain_id:x}")));
    }
    if let Some(contract) = &domain.verifying_contract {
        domain_json.insert("verifyingContract".into(), json!(contract.to_string()));
    }
    if let Some(salt) = &domain.salt {
        domain_json.insert("salt".into(), json!(salt));
    }

    let document = json!({
        "types": struct_types,
        "primaryType": primary,
        "domain": domain_json,
        "message": value,
    });
    serde_json::from_value(document).map_err(|e| CryptoError::TypedData(e.to_string()))
}

/// The digest to sign.
pub fn hash(domain: &TypedDataDomain, types: &Types, value: &Value) -> Result<[u8; 32]> {
    let digest = typed_data(domain, types, value)?
        .eip712_signing_hash()
        .map_err(|e| CryptoError::TypedData(e.to_string()))?;
    Ok(digest.0)
}
