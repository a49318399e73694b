//! Subcommand handlers.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use serde::Deserialize;
use serde_json::{json, Value};
use tessera_ceremony::Coordinator;
use tessera_crypto::transaction::Transaction;
use tessera_crypto::typed_data::{TypedDataDomain, Types};
use tessera_identity::{AuthServiceClient, IdentityBridge};
use tessera_signer::{LoginService, NameResolver, StaticNameResolver, ThresholdSigner};
use tessera_transport::{HttpTransport, NodeTransport};
use tessera_types::{AuthMethod, ClusterConfig};

use crate::config::CliConfig;
use crate::Credentials;

/// Shared state for one invocation.
pub struct Context {
    pub config: CliConfig,
    pub cluster: Arc<ClusterConfig>,
    transport: Arc<dyn NodeTransport>,
}

/// Typed data as produced by wallets: `primaryType` is accepted but the
/// primary type is always inferred from `types`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypedDataFile {
    #[serde(default)]
    domain: TypedDataDomain,
    types: Types,
    #[serde(default)]
    #[allow(dead_code)]
    primary_type: Option<String>,
    message: Value,
}

impl Context {
    pub fn new(config: CliConfig) -> anyhow::Result<Self> {
        let cluster = Arc::new(config.cluster.to_cluster_config()?);
        let transport: Arc<dyn NodeTransport> = Arc::new(HttpTransport::new(&config.http_config())?);
        Ok(Self {
            config,
            cluster,
            transport,
        })
    }

    fn coordinator(&self) -> Coordinator {
        Coordinator::new(
            self.cluster.clone(),
            self.transport.clone(),
            self.config.ceremony,
        )
    }

    fn names(&self) -> Arc<dyn NameResolver> {
        Arc::new(
            self.config
                .names
                .iter()
                .map(|(name, address)| (name.clone(), *address))
                .collect::<StaticNameResolver>(),
        )
    }

    async fn login(&self, credentials: &Credentials) -> anyhow::Result<LoginService> {
        let mut service = LoginService::new(self.coordinator()).with_auth_service(
            AuthServiceClient::new(self.transport.clone(), &self.config.auth_service.endpoint),
        );
        match (&credentials.method, &credentials.client_id) {
            (AuthMethod::Google, Some(client_id)) => {
                service
                    .login_with_google_auth_service(
                        client_id,
                        &credentials.token,
                        &credentials.user_id,
                    )
                    .await?;
            }
            (method, _) => {
                service
                    .login(*method, &credentials.user_id, &credentials.token)
                    .await?;
            }
        }
        Ok(service)
    }

    async fn signer(&self, credentials: &Credentials) -> anyhow::Result<ThresholdSigner> {
        let service = self.login(credentials).await?;
        Ok(service.signer(Some(self.names()))?)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn address(context: &Context, credentials: &Credentials) -> anyhow::Result<()> {
    let service = context.login(credentials).await?;
    let session = service.session().context("login produced no session")?;
    print_json(&json!({
        "address": session.wallet_address(),
        "public_key": session.public_key(),
    }))
}

pub async fn sign_message(
    context: &Context,
    credentials: &Credentials,
    message: &str,
) -> anyhow::Result<()> {
    let signer = context.signer(credentials).await?;
    println!("{}", signer.sign_message(message).await?);
    Ok(())
}

pub async fn sign_tx(context: &Context, credentials: &Credentials, file: &Path) -> anyhow::Result<()> {
    let transaction: Transaction = read_json(file)?;
    let signer = context.signer(credentials).await?;
    println!("{}", signer.sign_transaction(&transaction).await?);
    Ok(())
}

pub async fn sign_typed_data(
    context: &Context,
    credentials: &Credentials,
    file: &Path,
) -> anyhow::Result<()> {
    let typed: TypedDataFile = read_json(file)?;
    let signer = context.signer(credentials).await?;
    let signature = signer
        .sign_typed_data(&typed.domain, &typed.types, &typed.message)
        .await?;
    println!("{signature}");
    Ok(())
}

pub async fn github_exchange(context: &Context, code: &str) -> anyhow::Result<()> {
    let bridge = IdentityBridge::new(context.transport.clone(), context.cluster.clone());
    let login = bridge.exchange_github_code(code).await?;
    print_json(&json!({
        "access_token": login.access_token,
        "profile": login.profile,
    }))
}

pub async fn twitter_exchange(context: &Context, code: &str, verifier: &str) -> anyhow::Result<()> {
    let bridge = IdentityBridge::new(context.transport.clone(), context.cluster.clone());
    let token = bridge.exchange_twitter_code(code, verifier).await?;
    let profile = bridge.verify_twitter_token(&token).await?;
    print_json(&json!({
        "access_token": token,
        "profile": profile,
    }))
}
