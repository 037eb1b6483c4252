// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims, identity records and the authenticated user.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Audience carried by access tokens issued to signed-in users.
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Fallback when neither metadata nor email yields a name.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// Claims of an identity-provider access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration timestamp
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    /// Audience (validated by jsonwebtoken, not read directly)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Profile metadata the identity provider keeps for a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A user record as returned by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentityUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl IdentityUser {
    /// Name to greet the user with.
    ///
    /// `first_name`, then the first word of `full_name` or `name`, then the
    /// local part of the email, then [`DEFAULT_DISPLAY_NAME`].
    pub fn display_name(&self) -> String {
        let meta = &self.user_metadata;

        if let Some(first) = present(meta.first_name.as_deref()) {
            return first.to_string();
        }

        let full = present(meta.full_name.as_deref()).or_else(|| present(meta.name.as_deref()));
        if let Some(word) = full.and_then(|f| f.split_whitespace().next()) {
            return word.to_string();
        }

        present(self.email.as_deref())
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
            .to_string()
    }
}

/// Authenticated user information extracted from a bearer token.
///
/// This is the primary type used throughout the application to represent
/// the authenticated user making a request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Canonical user ID (`sub` claim)
    pub user_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Session ID (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Token expiration (Unix timestamp, 0 when unknown)
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: SupabaseClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            session_id: claims.session_id,
            expires_at: claims.exp,
        }
    }

    pub fn from_identity(user: IdentityUser) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            session_id: None,
            expires_at: 0,
        }
    }
}
