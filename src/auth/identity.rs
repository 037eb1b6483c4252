// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity provider client (GoTrue REST API).
//!
//! All calls authenticate with the anon key in the `apikey` header.
//! `get_user` additionally carries the user's access token.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::claims::IdentityUser;
use crate::config::IdentityConfig;

/// Request timeout for identity calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Message used when the provider gives no reason.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Authentication failed";

#[derive(Debug, Error)]
pub enum IdentityError {
    /// Non-success answer; `message` is taken from the provider body.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("identity request failed: {0}")]
    Transport(String),

    #[error("unreadable identity response: {0}")]
    Decode(String),
}

/// Session issued on successful sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

/// Sign-in response: the session plus the user it belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct SignedIn {
    #[serde(flatten)]
    pub session: Session,
    pub user: IdentityUser,
}

/// Result of a sign-up. `session` is `None` while email confirmation is
/// pending.
#[derive(Debug, Clone)]
pub struct SignedUp {
    pub user: IdentityUser,
    pub session: Option<Session>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Pull a human-readable reason out of a provider error body.
pub(crate) fn provider_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return DEFAULT_FAILURE_MESSAGE.to_string();
    };

    ["error_description", "msg", "message", "error"]
        .iter()
        .filter_map(|field| value.get(field).and_then(Value::as_str))
        .map(str::trim)
        .find(|m| !m.is_empty())
        .unwrap_or(DEFAULT_FAILURE_MESSAGE)
        .to_string()
}

/// Parse a sign-up body, which is a session when the account is usable
/// immediately and a bare user while confirmation is pending.
pub(crate) fn parse_sign_up(body: Value) -> Result<SignedUp, IdentityError> {
    if body.get("access_token").is_some() {
        let signed_in: SignedIn =
            serde_json::from_value(body).map_err(|e| IdentityError::Decode(e.to_string()))?;
        return Ok(SignedUp {
            user: signed_in.user,
            session: Some(signed_in.session),
        });
    }

    let user: IdentityUser =
        serde_json::from_value(body).map_err(|e| IdentityError::Decode(e.to_string()))?;
    Ok(SignedUp {
        user,
        session: None,
    })
}

/// Client for `{SUPABASE_URL}/auth/v1`.
#[derive(Clone)]
pub struct IdentityClient {
    auth_url: String,
    anon_key: String,
    http: Client,
}

impl fmt::Debug for IdentityClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityClient")
            .field("auth_url", &self.auth_url)
            .finish_non_exhaustive()
    }
}

impl IdentityClient {
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| IdentityError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            auth_url: format!("{}/auth/v1", config.url.as_str().trim_end_matches('/')),
            anon_key: config.anon_key.clone(),
            http,
        })
    }

    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(format!("{}{path}", self.auth_url))
            .header("apikey", &self.anon_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, IdentityError> {
        let response: Response = request
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = provider_message(&body);
            debug!(status = status.as_u16(), %message, "Identity provider rejected request");
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| IdentityError::Decode(e.to_string()))
    }

    /// `POST /token?grant_type=password`
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignedIn, IdentityError> {
        let body = self
            .send(
                self.post("/token?grant_type=password")
                    .json(&Credentials { email, password }),
            )
            .await
            .inspect_err(|e| warn!(error = %e, "Sign-in failed"))?;

        serde_json::from_value(body).map_err(|e| IdentityError::Decode(e.to_string()))
    }

    /// `POST /signup`
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignedUp, IdentityError> {
        let body = self
            .send(self.post("/signup").json(&Credentials { email, password }))
            .await
            .inspect_err(|e| warn!(error = %e, "Sign-up failed"))?;

        parse_sign_up(body)
    }

    /// `GET /user` with the caller's access token.
    pub async fn get_user(&self, access_token: &str) -> Result<IdentityUser, IdentityError> {
        let request = self
            .http
            .get(format!("{}/user", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token);

        let body = self.send(request).await?;
        serde_json::from_value(body).map_err(|e| IdentityError::Decode(e.to_string()))
    }
}

impl IdentityError {
    /// Whether the provider refused the token or credentials outright.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            IdentityError::Rejected { status, .. }
                if *status == StatusCode::UNAUTHORIZED.as_u16()
                    || *status == StatusCode::FORBIDDEN.as_u16()
        )
    }

    /// Whether the failure says nothing about the credentials: the provider
    /// was unreachable, overloaded or broken.
    pub fn is_transient(&self) -> bool {
        match self {
            IdentityError::Rejected { status, .. } => {
                *status >= 500 || *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
            }
            IdentityError::Transport(_) | IdentityError::Decode(_) => true,
        }
    }
}
