// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderName,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{IdentityUser, Session},
    models::{
        ApiKeyValue, AuthResponse, AuthStatusResponse, ChatIdsResponse, CreateProfileRequest,
        CredentialsRequest, LinkChatRequest, SetSettingRequest, SettingValue, StoreApiKeyRequest,
        StoreTokenRequest, TokenValue,
    },
    state::AppState,
    storage::{Profile, StoredApiKey, UserSetting},
};

pub mod api_keys;
pub mod auth;
pub mod chats;
pub mod health;
pub mod profile;
pub mod settings;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/status", get(auth::auth_status))
        .route("/auth/login", post(auth::login))
        .route("/auth/signup", post(auth::signup))
        .route(
            "/profile",
            get(profile::get_profile).post(profile::create_profile),
        )
        .route("/settings", get(settings::list_settings))
        .route(
            "/settings/{name}",
            get(settings::get_setting)
                .put(settings::set_setting)
                .delete(settings::delete_setting),
        )
        .route("/api-keys", get(api_keys::list_api_keys))
        .route(
            "/api-keys/{provider}",
            get(api_keys::get_api_key)
                .put(api_keys::store_api_key)
                .delete(api_keys::delete_api_key),
        )
        .route(
            "/github/token",
            get(api_keys::get_github_token)
                .put(api_keys::store_github_token)
                .delete(api_keys::delete_github_token),
        )
        .route("/chats", get(chats::list_chats).post(chats::link_chat))
        .route("/chats/{chat_id}", delete(chats::unlink_chat));

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        auth::auth_status,
        auth::login,
        auth::signup,
        profile::get_profile,
        profile::create_profile,
        settings::list_settings,
        settings::get_setting,
        settings::set_setting,
        settings::delete_setting,
        api_keys::list_api_keys,
        api_keys::get_api_key,
        api_keys::store_api_key,
        api_keys::delete_api_key,
        api_keys::get_github_token,
        api_keys::store_github_token,
        api_keys::delete_github_token,
        chats::list_chats,
        chats::link_chat,
        chats::unlink_chat
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            CredentialsRequest,
            AuthResponse,
            AuthStatusResponse,
            Session,
            IdentityUser,
            Profile,
            CreateProfileRequest,
            UserSetting,
            SettingValue,
            SetSettingRequest,
            StoredApiKey,
            StoreApiKeyRequest,
            ApiKeyValue,
            StoreTokenRequest,
            TokenValue,
            LinkChatRequest,
            ChatIdsResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Auth", description = "Login, signup and auth status"),
        (name = "Profile", description = "The caller's profile"),
        (name = "Settings", description = "Named per-user settings"),
        (name = "API Keys", description = "Provider API keys, encrypted at rest"),
        (name = "GitHub", description = "GitHub token convenience endpoints"),
        (name = "Chats", description = "Chat ids linked to the caller")
    )
)]
struct ApiDoc;
