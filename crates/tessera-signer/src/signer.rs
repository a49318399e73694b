//! Threshold-backed signer.
//!
//! Every operation reduces to [`ThresholdSigner::sign_digest`], which runs
//! one signing ceremony over a 32-byte digest and decodes the raw output.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tessera_ceremony::{Coordinator, Session};
use tessera_crypto::address::{self, Address};
use tessera_crypto::encoding::encode_hex_prefixed;
use tessera_crypto::keccak::hash_message;
use tessera_crypto::signature::{self, Signature};
use tessera_crypto::transaction::Transaction;
use tessera_crypto::typed_data::{self, TypedDataDomain, Types};
use tracing::{debug, info};

use crate::names::NameResolver;
use crate::{Result, SignerError};

/// Signs on behalf of a logged-in session.
#[derive(Clone)]
pub struct ThresholdSigner {
    coordinator: Coordinator,
    session: Session,
    resolver: Option<Arc<dyn NameResolver>>,
}

impl ThresholdSigner {
    pub fn new(
        coordinator: Coordinator,
        session: Session,
        resolver: Option<Arc<dyn NameResolver>>,
    ) -> Self {
        Self {
            coordinator,
            session,
            resolver,
        }
    }

    /// The session wallet address.
    pub fn address(&self) -> Address {
        self.session.wallet_address()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Sign an arbitrary 32-byte digest.
    pub async fn sign_digest(&self, digest: &[u8; 32]) -> Result<Signature> {
        let raw = self.coordinator.sign(&self.session, digest).await?;
        Ok(signature::from_raw_hex(&raw)?)
    }

    /// EIP-191 personal-message signature, as 65-byte `r || s || v` hex.
    pub async fn sign_message(&self, message: impl AsRef<[u8]>) -> Result<String> {
        let digest = hash_message(message);
        let signature = self.sign_digest(&digest).await?;
        info!(address = %self.address(), "Message signed");
        Ok(signature::to_hex(&signature))
    }

    /// Sign a transaction and return its signed serialization as hex.
    ///
    /// A declared `from` must match the session wallet; the check happens
    /// before any ceremony is started.
    pub async fn sign_transaction(&self, transaction: &Transaction) -> Result<String> {
        let mut tx = transaction.clone();
        if let Some(from) = tx.from.take() {
            if from != self.address() {
                return Err(SignerError::FromMismatch {
                    from,
                    address: self.address(),
                });
            }
        }

        let digest = tx.signing_hash()?;
        let signature = self.sign_digest(&digest).await?;
        let signed = tx.serialize_signed(&signature)?;
        info!(address = %self.address(), nonce = tx.nonce, "Transaction signed");
        Ok(encode_hex_prefixed(signed))
    }

    /// EIP-712 signature over `value` of the primary type in `types`.
    ///
    /// The domain name and every address field are passed through the name
    /// resolver first; names it does not know are hashed as given.
    pub async fn sign_typed_data(
        &self,
        domain: &TypedDataDomain,
        types: &Types,
        value: &Value,
    ) -> Result<String> {
        let resolver = self.resolver.as_ref().ok_or(SignerError::NoNameResolver)?;

        let mut domain = domain.clone();
        if let Some(name) = &domain.name {
            if let Some(address) = resolver.resolve_name(name).await? {
                domain.name = Some(address.to_string());
            }
        }

        let primary = typed_data::primary_type(types)?;
        let value = resolve_addresses(resolver.as_ref(), types, &primary, value).await?;

        let digest = typed_data::hash(&domain, types, &value)?;
        let signature = self.sign_digest(&digest).await?;
        info!(address = %self.address(), primary_type = %primary, "Typed data signed");
        Ok(signature::to_hex(&signature))
    }
}

/// Copy of `value` with every address-typed field of `type_name` resolved,
/// following nested structs and arrays.
fn resolve_addresses<'a>(
    resolver: &'a dyn NameResolver,
    types: &'a Types,
    type_name: &'a str,
    value: &'a Value,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        let (Some(fields), Some(object)) = (types.get(type_name), value.as_object()) else {
            return Ok(value.clone());
        };

        let mut resolved = object.clone();
        for field in fields {
            if let Some(field_value) = object.get(&field.name) {
                let new_value = resolve_field(resolver, types, &field.field_type, field_value).await?;
                resolved.insert(field.name.clone(), new_value);
            }
        }
        Ok(Value::Object(resolved))
    }
    .boxed()
}

fn resolve_field<'a>(
    resolver: &'a dyn NameResolver,
    types: &'a Types,
    field_type: &'a str,
    value: &'a Value,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        if let Some(inner) = field_type
            .strip_suffix(']')
            .and_then(|t| t.rfind('[').map(|i| &t[..i]))
        {
            let Some(items) = value.as_array() else {
                return Ok(value.clone());
            };
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(resolve_field(resolver, types, inner, item).await?);
            }
            return Ok(Value::Array(out));
        }

        if field_type == "address" {
            return match value.as_str() {
                Some(name) if address::parse(name).is_err() => {
                    match resolver.resolve_name(name).await? {
                        Some(address) => {
                            debug!(name, %address, "Resolved name");
                            Ok(Value::String(address.to_string()))
                        }
                        None => Ok(value.clone()),
                    }
                }
                _ => Ok(value.clone()),
            };
        }

        if types.contains_key(field_type) {
            return resolve_addresses(resolver, types, field_type, value).await;
        }
        Ok(value.clone())
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;
    use serde_json::json;
    use tessera_crypto::typed_data::TypedField;

    use super::*;
    use crate::names::StaticNameResolver;
    use crate::testutil::{signer, ClusterKey};

    #[tokio::test]
    async fn test_sign_digest_recovers_to_wallet() {
        let key = ClusterKey::new();
        let (signer, _) = signer(&key, None);
        let digest = [0x5a; 32];

        let signature = signer.sign_digest(&digest).await.expect("sign");
        assert_eq!(
            signature::recover_address(&signature, &digest).expect("recover"),
            signer.address()
        );
    }

    #[tokio::test]
    async fn test_sign_message() {
        let key = ClusterKey::new();
        let (signer, transport) = signer(&key, None);

        let hex_sig = signer.sign_message("hello").await.expect("sign");
        assert_eq!(hex_sig.len(), 2 + 130);
        let bytes = hex::decode(&hex_sig[2..]).expect("hex");
        assert!(bytes[64] == 27 || bytes[64] == 28);

        let signature = Signature::try_from(bytes.as_slice()).expect("signature");
        assert_eq!(
            signature::recover_address(&signature, &hash_message("hello")).expect("recover"),
            signer.address()
        );
        assert_eq!(transport.calls_to("/v1/signgen").len(), 3);
    }

    #[tokio::test]
    async fn test_from_mismatch_has_no_network_call() {
        let key = ClusterKey::new();
        let (signer, transport) = signer(&key, None);
        let tx = Transaction {
            from: Some(
                "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
                    .parse()
                    .expect("address"),
            ),
            chain_id: 10243,
            ..Default::default()
        };

        let err = signer.sign_transaction(&tx).await.expect_err("mismatch");
        assert!(matches!(err, SignerError::FromMismatch { .. }));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_sign_transaction_with_matching_from() {
        let key = ClusterKey::new();
        let (signer, _) = signer(&key, None);
        let tx = Transaction {
            from: Some(signer.address()),
            to: Some(
                "0x3535353535353535353535353535353535353535"
                    .parse()
                    .expect("address"),
            ),
            nonce: 9,
            gas_price: Some(20_000_000_000),
            gas_limit: 21_000,
            value: U256::from(1_000_000_000_000_000_000u64),
            chain_id: 10243,
            ..Default::default()
        };

        let signed = signer.sign_transaction(&tx).await.expect("sign");
        assert!(signed.starts_with("0xf8"));

        // Signing is deterministic, so the same digest yields the same signature.
        let mut unsigned = tx.clone();
        unsigned.from = None;
        let digest = unsigned.signing_hash().expect("hash");
        let signature = signer.sign_digest(&digest).await.expect("sign digest");
        assert_eq!(
            signature::recover_address(&signature, &digest).expect("recover"),
            signer.address()
        );
        assert_eq!(
            signed,
            encode_hex_prefixed(unsigned.serialize_signed(&signature).expect("serialize"))
        );
    }

    fn mail_types() -> Types {
        let mut types = Types::new();
        types.insert(
            "Person".into(),
            vec![
                TypedField::new("name", "string"),
                TypedField::new("wallet", "address"),
            ],
        );
        types.insert(
            "Mail".into(),
            vec![
                TypedField::new("from", "Person"),
                TypedField::new("to", "Person[]"),
                TypedField::new("contents", "string"),
            ],
        );
        types
    }

    #[tokio::test]
    async fn test_typed_data_requires_resolver() {
        let key = ClusterKey::new();
        let (signer, transport) = signer(&key, None);
        let err = signer
            .sign_typed_data(&TypedDataDomain::default(), &mail_types(), &json!({}))
            .await
            .expect_err("no resolver");
        assert!(matches!(err, SignerError::NoNameResolver));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_typed_data_resolves_names() {
        let bob: Address = "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB"
            .parse()
            .expect("address");
        let resolver: StaticNameResolver = [("bob.eth".to_string(), bob)].into_iter().collect();
        let key = ClusterKey::new();
        let (signer, _) = signer(&key, Some(Arc::new(resolver)));

        let domain = TypedDataDomain {
            name: Some("Ether Mail".into()),
            version: Some("1".into()),
            chain_id: Some(1),
            ..Default::default()
        };
        let named = json!({
            "from": { "name": "Cow", "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826" },
            "to": [{ "name": "Bob", "wallet": "bob.eth" }],
            "contents": "Hello, Bob!"
        });
        let literal = json!({
            "from": { "name": "Cow", "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826" },
            "to": [{ "name": "Bob", "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB" }],
            "contents": "Hello, Bob!"
        });

        let sig = signer
            .sign_typed_data(&domain, &mail_types(), &named)
            .await
            .expect("sign");
        let bytes = hex::decode(&sig[2..]).expect("hex");
        let signature = Signature::try_from(bytes.as_slice()).expect("signature");
        let digest = typed_data::hash(&domain, &mail_types(), &literal).expect("digest");
        assert_eq!(
            signature::recover_address(&signature, &digest).expect("recover"),
            signer.address()
        );
    }
}
