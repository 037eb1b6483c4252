// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::identity::IdentityError;
use crate::config::AUTH_DISABLED_MESSAGE;

/// Authentication error type.
///
/// Covers bearer-token verification on protected routes and the
/// login/signup flow against the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("Authorization header is required")]
    MissingAuthHeader,
    /// Invalid authorization header format
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    /// Token is malformed
    #[error("Token is malformed")]
    MalformedToken,
    /// Token signature is invalid
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// Token has expired
    #[error("Token has expired")]
    TokenExpired,
    /// Token audience is invalid
    #[error("Token audience is invalid")]
    InvalidAudience,
    /// Token is not yet valid
    #[error("Token is not yet valid")]
    TokenNotYetValid,
    /// The identity provider did not accept the token
    #[error("Token was rejected by the identity provider")]
    TokenRejected,
    /// Login or signup without email or password
    #[error("Email and password are required.")]
    MissingCredentials,
    /// The identity provider refused the login or signup
    #[error("{0}")]
    ProviderRejected(String),
    /// The identity provider could not be reached
    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// No identity provider configured
    #[error("{}", AUTH_DISABLED_MESSAGE)]
    AuthDisabled,
    /// Internal error
    #[error("Internal authentication error: {0}")]
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::TokenRejected => "token_rejected",
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::ProviderRejected(_) => "authentication_failed",
            AuthError::ProviderUnavailable(_) => "provider_unavailable",
            AuthError::AuthDisabled => "auth_disabled",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::InvalidAudience
            | AuthError::TokenNotYetValid
            | AuthError::TokenRejected => StatusCode::UNAUTHORIZED,
            AuthError::MissingCredentials | AuthError::ProviderRejected(_) => StatusCode::BAD_REQUEST,
            AuthError::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
            AuthError::AuthDisabled => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<IdentityError> for AuthError {
    fn from(err: IdentityError) -> Self {
        if err.is_transient() {
            return AuthError::ProviderUnavailable(err.to_string());
        }
        match err {
            IdentityError::Rejected { message, .. } => AuthError::ProviderRejected(message),
            IdentityError::Transport(msg) | IdentityError::Decode(msg) => {
                AuthError::ProviderUnavailable(msg)
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
