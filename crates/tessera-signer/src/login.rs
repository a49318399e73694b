//! Login flows.
//!
//! Each provider ends the same way: a user identifier and a bearer
//! credential are turned into the user's public key by the coordinator, and
//! the resulting [`Session`] becomes the active one. Logging out drops the
//! session; nothing is cleared on the cluster.

use std::sync::Arc;

use tessera_ceremony::{Coordinator, Session};
use tessera_crypto::address::Address;
use tessera_identity::{AuthServiceClient, GithubLogin};
use tessera_types::bridge::TwitterProfile;
use tessera_types::AuthMethod;
use tracing::info;

use crate::names::NameResolver;
use crate::signer::ThresholdSigner;
use crate::{Result, SignerError};

/// Owns the active session.
pub struct LoginService {
    coordinator: Coordinator,
    auth_service: Option<AuthServiceClient>,
    session: Option<Session>,
}

impl LoginService {
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator,
            auth_service: None,
            session: None,
        }
    }

    /// Also allow Google logins through the standalone auth service.
    pub fn with_auth_service(mut self, auth_service: AuthServiceClient) -> Self {
        self.auth_service = Some(auth_service);
        self
    }

    /// Log in with any provider.
    pub async fn login(
        &mut self,
        method: AuthMethod,
        user_id: &str,
        credential: &str,
    ) -> Result<&Session> {
        if user_id.is_empty() {
            return Err(SignerError::Login("empty user id".to_string()));
        }
        let public_key = self
            .coordinator
            .get_public_key(method, user_id, credential, self.session.as_ref())
            .await?;
        let session = Session::new(method, user_id, credential, public_key)?;
        info!(
            method = %method,
            address = %session.wallet_address(),
            "Logged in"
        );
        Ok(self.session.insert(session))
    }

    /// `sub` is the subject claim of the Google ID token.
    pub async fn login_with_google(&mut self, token: &str, sub: &str) -> Result<&Session> {
        self.login(AuthMethod::Google, sub, token).await
    }

    pub async fn login_with_microsoft(&mut self, token: &str, id: &str) -> Result<&Session> {
        self.login(AuthMethod::Microsoft, id, token).await
    }

    /// Log in with the result of a GitHub code exchange.
    pub async fn login_with_github(&mut self, github: &GithubLogin) -> Result<&Session> {
        let profile = github
            .profile
            .as_ref()
            .ok_or_else(|| SignerError::Login("GitHub profile unavailable".to_string()))?;
        let user_id = profile.id.to_string();
        self.login(AuthMethod::Github, &user_id, &github.access_token)
            .await
    }

    pub async fn login_with_twitter(
        &mut self,
        token: &str,
        profile: &TwitterProfile,
    ) -> Result<&Session> {
        self.login(AuthMethod::Twitter, &profile.id, token).await
    }

    /// Google login resolved by the auth service instead of the cluster.
    pub async fn login_with_google_auth_service(
        &mut self,
        client_id: &str,
        token: &str,
        sub: &str,
    ) -> Result<&Session> {
        let auth_service = self
            .auth_service
            .as_ref()
            .ok_or_else(|| SignerError::Login("no auth service configured".to_string()))?;
        let public_key = auth_service
            .login_with_google_token(client_id, sub, token)
            .await?;
        let session = Session::new(AuthMethod::Google, sub, token, public_key)?;
        info!(address = %session.wallet_address(), "Logged in through auth service");
        Ok(self.session.insert(session))
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn address(&self) -> Option<Address> {
        self.session.as_ref().map(Session::wallet_address)
    }

    /// A signer for the active session.
    pub fn signer(&self, resolver: Option<Arc<dyn NameResolver>>) -> Result<ThresholdSigner> {
        let session = self.session.clone().ok_or(SignerError::NotAuthenticated)?;
        Ok(ThresholdSigner::new(
            self.coordinator.clone(),
            session,
            resolver,
        ))
    }

    pub fn logout(&mut self) {
        if self.session.take().is_some() {
            info!("Logged out");
        }
    }
}
