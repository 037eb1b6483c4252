// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use jsonwebtoken::DecodingKey;

use crate::auth::{AuthError, IdentityClient};
use crate::config::Config;
use crate::crypto::CredentialCipher;
use crate::storage::{Backend, RestClient, StoreError};

/// How bearer tokens are verified and where login/signup go.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Identity provider; `None` disables login and signup.
    pub identity: Option<IdentityClient>,
    /// HS256 key for local verification. Without it tokens are checked
    /// remotely through the identity provider.
    pub jwt_key: Option<DecodingKey>,
}

impl AuthConfig {
    pub fn new(identity: Option<IdentityClient>, jwt_secret: Option<&str>) -> Self {
        Self {
            identity,
            jwt_key: jwt_secret.map(|secret| DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    pub fn enabled(&self) -> bool {
        self.identity.is_some()
    }

    /// The identity provider, or `AuthDisabled` when none is configured.
    pub fn identity(&self) -> Result<&IdentityClient, AuthError> {
        self.identity.as_ref().ok_or(AuthError::AuthDisabled)
    }
}

/// Startup failure while wiring the shared state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("store client: {0}")]
    Store(#[from] StoreError),
    #[error("cipher: {0}")]
    Cipher(#[from] crate::crypto::CipherError),
    #[error("identity client: {0}")]
    Identity(#[from] crate::auth::IdentityError),
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Backend>,
    pub cipher: Arc<CredentialCipher>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(store: impl Into<Backend>, cipher: CredentialCipher) -> Self {
        Self {
            store: Arc::new(store.into()),
            cipher: Arc::new(cipher),
            auth: AuthConfig::default(),
        }
    }

    /// Set the authentication configuration.
    pub fn with_auth_config(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Build the production state: REST store, provisioned cipher and the
    /// identity provider when one is configured.
    pub fn from_config(config: &Config) -> Result<Self, StateError> {
        let store = RestClient::new(&config.supabase_url, config.service_role_key.clone())?;
        let cipher = CredentialCipher::from_passphrase(&config.encryption_secret)?;
        let identity = config
            .identity
            .as_ref()
            .map(IdentityClient::new)
            .transpose()?;

        Ok(Self::new(store, cipher).with_auth_config(AuthConfig::new(
            identity,
            config.jwt_secret.as_deref(),
        )))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentityConfig;
    use url::Url;

    #[test]
    fn auth_is_disabled_without_identity_provider() {
        let auth = AuthConfig::default();
        assert!(!auth.enabled());
        assert!(matches!(auth.identity(), Err(AuthError::AuthDisabled)));
    }

    #[test]
    fn auth_is_enabled_with_identity_provider() {
        let identity = IdentityClient::new(&IdentityConfig {
            url: Url::parse("https://project.supabase.co").unwrap(),
            anon_key: "anon".into(),
        })
        .unwrap();
        let auth = AuthConfig::new(Some(identity), None);
        assert!(auth.enabled());
        assert!(auth.jwt_key.is_none());
    }

    #[test]
    fn state_is_built_from_config() {
        let config = Config::from_lookup(|name| match name {
            "SUPABASE_URL" => Some("https://project.supabase.co".into()),
            "SUPABASE_SERVICE_ROLE_KEY" => Some("service".into()),
            "ENCRYPTION_SECRET" => Some("a-long-enough-passphrase".into()),
            _ => None,
        })
        .unwrap();

        let state = AppState::from_config(&config).unwrap();
        assert!(matches!(*state.store, Backend::Rest(_)));
        assert!(!state.auth.enabled());
    }
}
