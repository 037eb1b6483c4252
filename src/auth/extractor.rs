// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use tracing::{debug, warn};

use super::claims::{AuthenticatedUser, SupabaseClaims, AUTHENTICATED_AUDIENCE};
use super::identity::IdentityClient;
use super::AuthError;
use crate::state::{AppState, AuthConfig};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Extractor for authenticated users.
///
/// ## Verification Modes
///
/// - **Local** (`SUPABASE_JWT_SECRET` set): HS256 signature, expiry and
///   audience are checked in-process.
/// - **Remote** (no secret, identity provider configured): the token is
///   presented to the provider's `/user` endpoint.
/// - Neither configured: every request fails with `internal_error`.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // A layer may already have verified the token.
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidAuthHeader)?;

        let user = verify_token(token, &state.auth).await?;
        parts.extensions.insert(user.clone());

        Ok(Auth(user))
    }
}

/// Verify an access token with whichever mode is configured.
async fn verify_token(token: &str, auth: &AuthConfig) -> Result<AuthenticatedUser, AuthError> {
    if let Some(key) = &auth.jwt_key {
        return verify_local(token, key);
    }
    if let Some(identity) = &auth.identity {
        return verify_remote(token, identity).await;
    }
    warn!("Bearer token received but no verification method is configured");
    Err(AuthError::InternalError(
        "no token verification method configured".into(),
    ))
}

fn verify_local(token: &str, key: &DecodingKey) -> Result<AuthenticatedUser, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = CLOCK_SKEW_LEEWAY;
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

    let token_data = decode::<SupabaseClaims>(token, key, &validation).map_err(|e| {
        debug!(error = %e, "Token verification failed");
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidAudience => AuthError::InvalidAudience,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            _ => AuthError::MalformedToken,
        }
    })?;

    Ok(AuthenticatedUser::from_claims(token_data.claims))
}

async fn verify_remote(token: &str, identity: &IdentityClient) -> Result<AuthenticatedUser, AuthError> {
    match identity.get_user(token).await {
        Ok(user) => Ok(AuthenticatedUser::from_identity(user)),
        Err(e) if e.is_unauthorized() => {
            debug!(error = %e, "Identity provider rejected token");
            Err(AuthError::TokenRejected)
        }
        Err(e) => {
            warn!(error = %e, "Token validation against identity provider failed");
            Err(AuthError::ProviderUnavailable(e.to_string()))
        }
    }
}
