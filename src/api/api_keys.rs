// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Provider API keys and the GitHub token.
//!
//! Secrets travel in plaintext over the API and are encrypted before they
//! reach the store. Listing never returns secrets.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::{
    auth::Auth,
    error::ApiError,
    models::{ApiKeyValue, StoreApiKeyRequest, StoreTokenRequest, TokenValue},
    state::AppState,
    storage::{ApiKeyRepository, StoredApiKey},
};

fn non_blank(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{field} must not be empty")));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/api-keys",
    tag = "API Keys",
    responses((status = 200, body = [StoredApiKey])),
    security(("bearer_auth" = []))
)]
pub async fn list_api_keys(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredApiKey>>, ApiError> {
    let keys = ApiKeyRepository::new(state.store.as_ref())
        .list_providers(&user.user_id)
        .await?;
    Ok(Json(keys))
}

#[utoipa::path(
    get,
    path = "/v1/api-keys/{provider}",
    params(("provider" = String, Path, description = "Provider tag, e.g. openai")),
    tag = "API Keys",
    responses(
        (status = 200, body = ApiKeyValue),
        (status = 404, description = "No key stored for this provider")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_api_key(
    Auth(user): Auth,
    Path(provider): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiKeyValue>, ApiError> {
    let sealed = ApiKeyRepository::new(state.store.as_ref())
        .get(&user.user_id, &provider)
        .await?;
    let key = state.cipher.decrypt(&sealed)?;

    Ok(Json(ApiKeyValue {
        provider: provider.trim().to_ascii_lowercase(),
        key,
    }))
}

#[utoipa::path(
    put,
    path = "/v1/api-keys/{provider}",
    params(("provider" = String, Path, description = "Provider tag, e.g. openai")),
    request_body = StoreApiKeyRequest,
    tag = "API Keys",
    responses((status = 204)),
    security(("bearer_auth" = []))
)]
pub async fn store_api_key(
    Auth(user): Auth,
    Path(provider): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<StoreApiKeyRequest>,
) -> Result<StatusCode, ApiError> {
    non_blank("key", &request.key)?;
    let sealed = state.cipher.encrypt(&request.key)?;

    ApiKeyRepository::new(state.store.as_ref())
        .store(&user.user_id, &provider, &sealed)
        .await?;
    info!(user_id = %user.user_id, %provider, "API key stored");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/v1/api-keys/{provider}",
    params(("provider" = String, Path, description = "Provider tag, e.g. openai")),
    tag = "API Keys",
    responses((status = 204)),
    security(("bearer_auth" = []))
)]
pub async fn delete_api_key(
    Auth(user): Auth,
    Path(provider): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    ApiKeyRepository::new(state.store.as_ref())
        .delete(&user.user_id, &provider)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/github/token",
    tag = "GitHub",
    responses(
        (status = 200, body = TokenValue),
        (status = 404, description = "No token stored")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_github_token(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<TokenValue>, ApiError> {
    let sealed = ApiKeyRepository::new(state.store.as_ref())
        .get_github_token(&user.user_id)
        .await?;
    let token = state.cipher.decrypt(&sealed)?;
    Ok(Json(TokenValue { token }))
}

#[utoipa::path(
    put,
    path = "/v1/github/token",
    request_body = StoreTokenRequest,
    tag = "GitHub",
    responses((status = 204)),
    security(("bearer_auth" = []))
)]
pub async fn store_github_token(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<StoreTokenRequest>,
) -> Result<StatusCode, ApiError> {
    non_blank("token", &request.token)?;
    let sealed = state.cipher.encrypt(&request.token)?;

    ApiKeyRepository::new(state.store.as_ref())
        .store_github_token(&user.user_id, &sealed)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/v1/github/token",
    tag = "GitHub",
    responses((status = 204)),
    security(("bearer_auth" = []))
)]
pub async fn delete_github_token(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    ApiKeyRepository::new(state.store.as_ref())
        .delete_github_token(&user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::crypto::CredentialCipher;
    use crate::state::test_support::{memory, memory_state};
    use crate::storage::{Table, TableBackend};

    fn caller() -> Auth {
        Auth(AuthenticatedUser {
            user_id: "u-1".into(),
            email: None,
            session_id: None,
            expires_at: 0,
        })
    }

    fn key(k: &str) -> Json<StoreApiKeyRequest> {
        Json(StoreApiKeyRequest { key: k.into() })
    }

    #[tokio::test]
    async fn stored_key_is_encrypted_at_rest_and_decrypted_on_read() {
        let state = memory_state();

        store_api_key(caller(), Path("OpenAI".into()), State(state.clone()), key("sk-live-123"))
            .await
            .unwrap();

        let rows = memory(&state).select(Table::ApiKeys, "*", &[]).await.unwrap();
        let at_rest = rows[0]["key_ciphertext"].as_str().unwrap();
        assert!(at_rest.starts_with("v1:"));
        assert!(!at_rest.contains("sk-live-123"));

        let Json(value) = get_api_key(caller(), Path("openai".into()), State(state))
            .await
            .unwrap();
        assert_eq!(value.provider, "openai");
        assert_eq!(value.key, "sk-live-123");
    }

    #[tokio::test]
    async fn list_returns_providers_only() {
        let state = memory_state();
        store_api_key(caller(), Path("openai".into()), State(state.clone()), key("sk-1"))
            .await
            .unwrap();
        store_api_key(caller(), Path("anthropic".into()), State(state.clone()), key("sk-2"))
            .await
            .unwrap();

        let Json(keys) = list_api_keys(caller(), State(state)).await.unwrap();
        let providers: Vec<_> = keys.iter().map(|k| k.provider.as_str()).collect();
        assert_eq!(providers, vec!["anthropic", "openai"]);
        let json = serde_json::to_string(&keys).unwrap();
        assert!(!json.contains("sk-1"));
    }

    #[tokio::test]
    async fn delete_then_get_is_404() {
        let state = memory_state();
        store_api_key(caller(), Path("groq".into()), State(state.clone()), key("gsk"))
            .await
            .unwrap();
        delete_api_key(caller(), Path("groq".into()), State(state.clone()))
            .await
            .unwrap();

        let err = get_api_key(caller(), Path("groq".into()), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn blank_key_is_rejected() {
        let err = store_api_key(caller(), Path("openai".into()), State(memory_state()), key("  "))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn key_sealed_with_another_passphrase_is_500() {
        let state = memory_state();
        let foreign = CredentialCipher::from_passphrase("some-other-deployment-key").unwrap();
        let sealed = foreign.encrypt("sk-foreign").unwrap();
        ApiKeyRepository::new(state.store.as_ref())
            .store("u-1", "openai", &sealed)
            .await
            .unwrap();

        let err = get_api_key(caller(), Path("openai".into()), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("sk-foreign"));
    }

    #[tokio::test]
    async fn github_token_round_trip() {
        let state = memory_state();
        store_github_token(
            caller(),
            State(state.clone()),
            Json(StoreTokenRequest {
                token: "ghp_abc".into(),
            }),
        )
        .await
        .unwrap();

        let Json(token) = get_github_token(caller(), State(state.clone())).await.unwrap();
        assert_eq!(token.token, "ghp_abc");

        let Json(keys) = list_api_keys(caller(), State(state.clone())).await.unwrap();
        assert_eq!(keys[0].provider, "github");

        delete_github_token(caller(), State(state.clone())).await.unwrap();
        let err = get_github_token(caller(), State(state)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
