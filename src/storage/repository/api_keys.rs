// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Provider API key repository.
//!
//! One key per `(user_id, provider)`, upserted on that pair. Values are
//! always [`Ciphertext`]; encryption happens before a key reaches this
//! module and decryption after it leaves.
//!
//! The GitHub helpers are the generic operations with the provider fixed to
//! [`GITHUB_PROVIDER`]. They share the same rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::super::tables::{columns, Filter, Table, API_KEYS_CONFLICT};
use super::super::{StoreResult, TableBackend};
use super::{all_rows, first_row, require};
use crate::crypto::Ciphertext;

/// Provider tag under which GitHub tokens are stored.
pub const GITHUB_PROVIDER: &str = "github";

/// Row of `api_keys` without the secret.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredApiKey {
    /// Provider tag (lowercase)
    pub provider: String,
    /// Last write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct CiphertextRow {
    key_ciphertext: Ciphertext,
}

/// Normalise a provider tag: trimmed, lowercase, non-empty.
fn provider_tag(provider: &str) -> StoreResult<String> {
    Ok(require("provider", provider)?.to_ascii_lowercase())
}

/// Repository for `api_keys`.
pub struct ApiKeyRepository<'a, B> {
    backend: &'a B,
}

impl<'a, B: TableBackend> ApiKeyRepository<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Create or replace the key for a provider.
    pub async fn store(&self, user_id: &str, provider: &str, key: &Ciphertext) -> StoreResult<()> {
        let user_id = require("user_id", user_id)?;
        let provider = provider_tag(provider)?;

        let row = json!({
            "user_id": user_id,
            "provider": provider,
            "key_ciphertext": key,
            "updated_at": Utc::now(),
        });

        self.backend
            .upsert(Table::ApiKeys, row, API_KEYS_CONFLICT)
            .await
            .inspect_err(|e| warn!(user_id, %provider, error = %e, "Error storing API key"))
    }

    /// Fetch the stored ciphertext for a provider.
    pub async fn get(&self, user_id: &str, provider: &str) -> StoreResult<Ciphertext> {
        let user_id = require("user_id", user_id)?;
        let provider = provider_tag(provider)?;

        let rows = self
            .backend
            .select(
                Table::ApiKeys,
                columns::KEY_CIPHERTEXT,
                &[
                    Filter::eq(columns::USER_ID, user_id),
                    Filter::eq(columns::PROVIDER, provider.as_str()),
                ],
            )
            .await
            .inspect_err(|e| warn!(user_id, %provider, error = %e, "Error fetching API key"))?;

        let row: CiphertextRow = first_row(rows, format!("API key for {provider}"))
            .inspect_err(|e| debug!(user_id, %provider, error = %e, "API key unavailable"))?;
        Ok(row.key_ciphertext)
    }

    /// Remove the key for a provider. Removing an absent key succeeds.
    pub async fn delete(&self, user_id: &str, provider: &str) -> StoreResult<()> {
        let user_id = require("user_id", user_id)?;
        let provider = provider_tag(provider)?;

        self.backend
            .delete(
                Table::ApiKeys,
                &[
                    Filter::eq(columns::USER_ID, user_id),
                    Filter::eq(columns::PROVIDER, provider.as_str()),
                ],
            )
            .await
            .inspect_err(|e| warn!(user_id, %provider, error = %e, "Error deleting API key"))
    }

    /// List the providers a user has keys for. Never returns ciphertext.
    pub async fn list_providers(&self, user_id: &str) -> StoreResult<Vec<StoredApiKey>> {
        let user_id = require("user_id", user_id)?;

        let rows = self
            .backend
            .select(
                Table::ApiKeys,
                "provider,updated_at",
                &[Filter::eq(columns::USER_ID, user_id)],
            )
            .await
            .inspect_err(|e| warn!(user_id, error = %e, "Error listing API keys"))?;

        let mut keys: Vec<StoredApiKey> = all_rows(rows, "API keys")?;
        keys.sort_by(|a, b| a.provider.cmp(&b.provider));
        Ok(keys)
    }

    pub async fn store_github_token(&self, user_id: &str, token: &Ciphertext) -> StoreResult<()> {
        self.store(user_id, GITHUB_PROVIDER, token).await
    }

    pub async fn get_github_token(&self, user_id: &str) -> StoreResult<Ciphertext> {
        self.get(user_id, GITHUB_PROVIDER).await
    }

    pub async fn delete_github_token(&self, user_id: &str) -> StoreResult<()> {
        self.delete(user_id, GITHUB_PROVIDER).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::CredentialCipher;
    use crate::storage::{MemoryBackend, StoreError};

    fn ct(value: &str) -> Ciphertext {
        Ciphertext::from_stored(value)
    }

    #[tokio::test]
    async fn store_then_get_returns_ciphertext_unchanged() {
        let backend = MemoryBackend::new();
        let repo = ApiKeyRepository::new(&backend);

        repo.store("user-1", "openai", &ct("v1:AAAA")).await.unwrap();
        assert_eq!(repo.get("user-1", "openai").await.unwrap(), ct("v1:AAAA"));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let backend = MemoryBackend::new();
        let repo = ApiKeyRepository::new(&backend);

        repo.store("user-1", "anthropic", &ct("v1:BBBB")).await.unwrap();
        repo.delete("user-1", "anthropic").await.unwrap();

        assert!(repo.get("user-1", "anthropic").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn latest_write_wins_per_provider() {
        let backend = MemoryBackend::new();
        let repo = ApiKeyRepository::new(&backend);

        repo.store("user-1", "openai", &ct("v1:old")).await.unwrap();
        repo.store("user-1", "openai", &ct("v1:new")).await.unwrap();
        repo.store("user-1", "groq", &ct("v1:groq")).await.unwrap();

        assert_eq!(repo.get("user-1", "openai").await.unwrap(), ct("v1:new"));
        assert_eq!(backend.row_count(Table::ApiKeys).await, 2);
    }

    #[tokio::test]
    async fn provider_tags_are_normalised() {
        let backend = MemoryBackend::new();
        let repo = ApiKeyRepository::new(&backend);

        repo.store("user-1", " OpenAI ", &ct("v1:x")).await.unwrap();
        assert_eq!(repo.get("user-1", "openai").await.unwrap(), ct("v1:x"));
    }

    #[tokio::test]
    async fn github_helpers_share_generic_rows() {
        let backend = MemoryBackend::new();
        let repo = ApiKeyRepository::new(&backend);

        repo.store_github_token("user-1", &ct("v1:gh")).await.unwrap();
        assert_eq!(repo.get("user-1", GITHUB_PROVIDER).await.unwrap(), ct("v1:gh"));
        assert_eq!(repo.get_github_token("user-1").await.unwrap(), ct("v1:gh"));

        repo.delete_github_token("user-1").await.unwrap();
        assert!(repo.get_github_token("user-1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn list_providers_omits_secrets() {
        let backend = MemoryBackend::new();
        let repo = ApiKeyRepository::new(&backend);

        repo.store("user-1", "openai", &ct("v1:1")).await.unwrap();
        repo.store("user-1", "github", &ct("v1:2")).await.unwrap();
        repo.store("user-2", "mistral", &ct("v1:3")).await.unwrap();

        let providers: Vec<_> = repo
            .list_providers("user-1")
            .await
            .unwrap()
            .into_iter()
            .map(|k| k.provider)
            .collect();
        assert_eq!(providers, vec!["github", "openai"]);
    }

    #[tokio::test]
    async fn encrypted_secret_is_what_lands_at_rest() {
        let backend = MemoryBackend::new();
        let repo = ApiKeyRepository::new(&backend);
        let cipher = CredentialCipher::from_passphrase("repository-test-passphrase").unwrap();

        let sealed = cipher.encrypt("sk-plain-secret").unwrap();
        repo.store("user-1", "openai", &sealed).await.unwrap();

        let rows = backend.select(Table::ApiKeys, "*", &[]).await.unwrap();
        let at_rest = rows[0]["key_ciphertext"].as_str().unwrap();
        assert!(!at_rest.contains("sk-plain-secret"));

        let loaded = repo.get("user-1", "openai").await.unwrap();
        assert_eq!(cipher.decrypt(&loaded).unwrap(), "sk-plain-secret");
    }

    #[tokio::test]
    async fn blank_provider_is_rejected() {
        let backend = MemoryBackend::new();
        let repo = ApiKeyRepository::new(&backend);

        let err = repo.store("user-1", "  ", &ct("v1:x")).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
