// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login, signup and auth status.

use axum::{extract::State, http::StatusCode, Json};
use tracing::{info, warn};

use crate::{
    auth::AuthError,
    config::AUTH_DISABLED_MESSAGE,
    models::{AuthResponse, AuthStatusResponse, CredentialsRequest},
    state::AppState,
    storage::{ProfileRepository, StoreError},
};

#[utoipa::path(
    get,
    path = "/v1/auth/status",
    tag = "Auth",
    responses((status = 200, body = AuthStatusResponse))
)]
pub async fn auth_status(State(state): State<AppState>) -> Json<AuthStatusResponse> {
    let enabled = state.auth.enabled();
    Json(AuthStatusResponse {
        enabled,
        warning: (!enabled).then(|| AUTH_DISABLED_MESSAGE.to_string()),
    })
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = CredentialsRequest,
    tag = "Auth",
    responses(
        (status = 200, body = AuthResponse),
        (status = 400, description = "Missing credentials or rejected by the identity provider"),
        (status = 502, description = "Identity provider unreachable or failing"),
        (status = 503, description = "Identity provider not configured")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let identity = state.auth.identity()?;
    let (email, password) = request.normalized().ok_or(AuthError::MissingCredentials)?;

    let signed_in = identity.sign_in_with_password(email, password).await?;
    info!(user_id = %signed_in.user.id, "User logged in");

    Ok(Json(AuthResponse {
        display_name: signed_in.user.display_name(),
        user_id: signed_in.user.id,
        email: signed_in.user.email,
        session: Some(signed_in.session),
        confirmation_required: false,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/auth/signup",
    request_body = CredentialsRequest,
    tag = "Auth",
    responses(
        (status = 201, body = AuthResponse),
        (status = 400, description = "Missing credentials or rejected by the identity provider"),
        (status = 502, description = "Identity provider unreachable or failing"),
        (status = 503, description = "Identity provider not configured")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let identity = state.auth.identity()?;
    let (email, password) = request.normalized().ok_or(AuthError::MissingCredentials)?;

    let signed_up = identity.sign_up(email, password).await?;
    let user = signed_up.user;
    info!(user_id = %user.id, confirmed = signed_up.session.is_some(), "User signed up");

    // The account exists at this point; a missing profile row can be
    // created later through POST /v1/profile.
    let profile_email = user.email.as_deref().unwrap_or(email);
    match ProfileRepository::new(state.store.as_ref())
        .create(&user.id, profile_email)
        .await
    {
        Ok(()) | Err(StoreError::Conflict(_)) => {}
        Err(e) => warn!(user_id = %user.id, error = %e, "Profile creation after signup failed"),
    }

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            display_name: user.display_name(),
            confirmation_required: signed_up.session.is_none(),
            user_id: user.id,
            email: user.email,
            session: signed_up.session,
        }),
    ))
}
