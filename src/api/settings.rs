// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{SetSettingRequest, SettingValue},
    state::AppState,
    storage::{SettingsRepository, UserSetting},
};

#[utoipa::path(
    get,
    path = "/v1/settings",
    tag = "Settings",
    responses((status = 200, body = [UserSetting])),
    security(("bearer_auth" = []))
)]
pub async fn list_settings(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserSetting>>, ApiError> {
    let settings = SettingsRepository::new(state.store.as_ref())
        .list(&user.user_id)
        .await?;
    Ok(Json(settings))
}

#[utoipa::path(
    get,
    path = "/v1/settings/{name}",
    params(("name" = String, Path, description = "Setting name")),
    tag = "Settings",
    responses(
        (status = 200, body = SettingValue),
        (status = 404, description = "Setting not set")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_setting(
    Auth(user): Auth,
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SettingValue>, ApiError> {
    let value = SettingsRepository::new(state.store.as_ref())
        .get(&user.user_id, &name)
        .await?;
    Ok(Json(SettingValue {
        name: name.trim().to_string(),
        value,
    }))
}

#[utoipa::path(
    put,
    path = "/v1/settings/{name}",
    params(("name" = String, Path, description = "Setting name")),
    request_body = SetSettingRequest,
    tag = "Settings",
    responses((status = 204)),
    security(("bearer_auth" = []))
)]
pub async fn set_setting(
    Auth(user): Auth,
    Path(name): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<SetSettingRequest>,
) -> Result<StatusCode, ApiError> {
    SettingsRepository::new(state.store.as_ref())
        .set(&user.user_id, &name, &request.value)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/v1/settings/{name}",
    params(("name" = String, Path, description = "Setting name")),
    tag = "Settings",
    responses((status = 204)),
    security(("bearer_auth" = []))
)]
pub async fn delete_setting(
    Auth(user): Auth,
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    SettingsRepository::new(state.store.as_ref())
        .delete(&user.user_id, &name)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::state::test_support::{memory, memory_state};

    fn caller(user_id: &str) -> Auth {
        Auth(AuthenticatedUser {
            user_id: user_id.into(),
            email: None,
            session_id: None,
            expires_at: 0,
        })
    }

    fn value(v: &str) -> Json<SetSettingRequest> {
        Json(SetSettingRequest { value: v.into() })
    }

    #[tokio::test]
    async fn get_answers_with_the_stored_name() {
        let state = memory_state();
        set_setting(caller("u-1"), Path("theme".into()), State(state.clone()), value("dark"))
            .await
            .unwrap();

        let Json(setting) = get_setting(caller("u-1"), Path(" theme ".into()), State(state))
            .await
            .unwrap();
        assert_eq!(setting.name, "theme");
        assert_eq!(setting.value, "dark");
    }

    #[tokio::test]
    async fn set_get_list_delete() {
        let state = memory_state();

        let status = set_setting(caller("u-1"), Path("theme".into()), State(state.clone()), value("dark"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        set_setting(caller("u-1"), Path("theme".into()), State(state.clone()), value("light"))
            .await
            .unwrap();
        set_setting(caller("u-1"), Path("locale".into()), State(state.clone()), value("en"))
            .await
            .unwrap();

        let Json(setting) = get_setting(caller("u-1"), Path("theme".into()), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(setting.value, "light");

        let Json(all) = list_settings(caller("u-1"), State(state.clone())).await.unwrap();
        assert_eq!(all.len(), 2);

        delete_setting(caller("u-1"), Path("theme".into()), State(state.clone()))
            .await
            .unwrap();
        let err = get_setting(caller("u-1"), Path("theme".into()), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn settings_are_private_to_the_caller() {
        let state = memory_state();
        set_setting(caller("u-1"), Path("theme".into()), State(state.clone()), value("dark"))
            .await
            .unwrap();

        let err = get_setting(caller("u-2"), Path("theme".into()), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn store_outage_is_502() {
        let state = memory_state();
        memory(&state).set_unavailable(true);

        let err = list_settings(caller("u-1"), State(state)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    }
}
