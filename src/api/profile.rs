// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::Auth,
    error::ApiError,
    models::CreateProfileRequest,
    state::AppState,
    storage::{Profile, ProfileRepository},
};

#[utoipa::path(
    get,
    path = "/v1/profile",
    tag = "Profile",
    responses(
        (status = 200, body = Profile),
        (status = 404, description = "No profile for this user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Profile>, ApiError> {
    let profile = ProfileRepository::new(state.store.as_ref())
        .get(&user.user_id)
        .await?;
    Ok(Json(profile))
}

/// Create the caller's profile. Answers 409 when it already exists.
#[utoipa::path(
    post,
    path = "/v1/profile",
    request_body = CreateProfileRequest,
    tag = "Profile",
    responses(
        (status = 201, body = Profile),
        (status = 409, description = "Profile already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_profile(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    let email = request
        .email
        .or(user.email)
        .ok_or_else(|| ApiError::bad_request("email is required"))?;

    let profiles = ProfileRepository::new(state.store.as_ref());
    profiles.create(&user.user_id, &email).await?;
    let profile = profiles.get(&user.user_id).await?;

    Ok((StatusCode::CREATED, Json(profile)))
}
