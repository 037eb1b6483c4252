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
    models::{ChatIdsResponse, LinkChatRequest},
    state::AppState,
    storage::ChatIdRepository,
};

#[utoipa::path(
    get,
    path = "/v1/chats",
    tag = "Chats",
    responses((status = 200, body = ChatIdsResponse)),
    security(("bearer_auth" = []))
)]
pub async fn list_chats(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<ChatIdsResponse>, ApiError> {
    let chat_ids = ChatIdRepository::new(state.store.as_ref())
        .list(&user.user_id)
        .await?;
    Ok(Json(ChatIdsResponse { chat_ids }))
}

/// Link a chat id to the caller. Linking twice keeps both links.
#[utoipa::path(
    post,
    path = "/v1/chats",
    request_body = LinkChatRequest,
    tag = "Chats",
    responses((status = 201)),
    security(("bearer_auth" = []))
)]
pub async fn link_chat(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<LinkChatRequest>,
) -> Result<StatusCode, ApiError> {
    ChatIdRepository::new(state.store.as_ref())
        .link(&user.user_id, &request.chat_id)
        .await?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    delete,
    path = "/v1/chats/{chat_id}",
    params(("chat_id" = String, Path, description = "Chat id to unlink")),
    tag = "Chats",
    responses((status = 204)),
    security(("bearer_auth" = []))
)]
pub async fn unlink_chat(
    Auth(user): Auth,
    Path(chat_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    ChatIdRepository::new(state.store.as_ref())
        .delete(&user.user_id, &chat_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
