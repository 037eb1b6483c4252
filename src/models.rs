// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. Row types (`Profile`,
//! `UserSetting`, `StoredApiKey`) come from the storage layer and are
//! returned as-is.
//!
//! ## Model Categories
//!
//! - **Auth**: login, signup and auth status
//! - **Settings**: named per-user values
//! - **API keys**: provider secrets, plaintext on the wire only
//! - **Chats**: linked chat ids

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Session;

// =============================================================================
// Auth Models
// =============================================================================

/// Email and password for login or signup.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl CredentialsRequest {
    /// Trimmed email and password, or `None` when either is blank.
    pub fn normalized(&self) -> Option<(&str, &str)> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return None;
        }
        Some((email, self.password.as_str()))
    }
}

/// Outcome of a successful login or signup.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Name to greet the user with
    pub display_name: String,
    /// Absent after signup while email confirmation is pending
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
    /// Whether the user must confirm their email before logging in
    pub confirmation_required: bool,
}

/// Whether login and signup are available.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthStatusResponse {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

// =============================================================================
// Profile Models
// =============================================================================

/// Create the caller's profile. Defaults to the token's email.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateProfileRequest {
    #[serde(default)]
    pub email: Option<String>,
}

// =============================================================================
// Settings Models
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetSettingRequest {
    pub value: String,
}

/// A single setting value.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SettingValue {
    pub name: String,
    pub value: String,
}

// =============================================================================
// API Key Models
// =============================================================================

/// A provider secret in plaintext. Encrypted before it is stored.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StoreApiKeyRequest {
    pub key: String,
}

/// A decrypted provider secret.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiKeyValue {
    pub provider: String,
    pub key: String,
}

/// GitHub token in plaintext.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StoreTokenRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenValue {
    pub token: String,
}

// =============================================================================
// Chat Models
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LinkChatRequest {
    pub chat_id: String,
}

/// Chat ids linked to the caller.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatIdsResponse {
    pub chat_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_normalized() {
        let req = CredentialsRequest {
            email: "  ada@x.com ".into(),
            password: "secret".into(),
        };
        assert_eq!(req.normalized(), Some(("ada@x.com", "secret")));
    }

    #[test]
    fn blank_credentials_are_rejected() {
        let missing_password = CredentialsRequest {
            email: "ada@x.com".into(),
            password: String::new(),
        };
        assert!(missing_password.normalized().is_none());

        let missing_email: CredentialsRequest =
            serde_json::from_str(r#"{"password":"secret"}"#).unwrap();
        assert!(missing_email.normalized().is_none());
    }

    #[test]
    fn auth_response_omits_missing_session() {
        let resp = AuthResponse {
            user_id: "u-1".into(),
            email: None,
            display_name: "User".into(),
            session: None,
            confirmation_required: true,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("session").is_none());
        assert_eq!(json["confirmation_required"], true);
    }
}
