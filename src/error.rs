// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::crypto::CipherError;
use crate::storage::StoreError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::not_found(format!("{what} not found")),
            StoreError::Validation(msg) => Self::bad_request(msg),
            StoreError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            StoreError::PermissionDenied(msg) => Self::new(StatusCode::FORBIDDEN, msg),
            StoreError::Transport(_) | StoreError::Backend { .. } => {
                Self::new(StatusCode::BAD_GATEWAY, "Store unavailable")
            }
            StoreError::Decode(_) => Self::internal("Unreadable store response"),
        }
    }
}

impl From<CipherError> for ApiError {
    fn from(err: CipherError) -> Self {
        // Never echo key material or ciphertext details to the caller.
        error!(error = %err, "Credential cipher failure");
        Self::internal("Stored credential could not be processed")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
