// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Login, signup and bearer-token verification against the identity
//! provider.
//!
//! ## Auth Flow
//!
//! 1. The front-end posts email and password to `/v1/auth/login` or
//!    `/v1/auth/signup`
//! 2. The service forwards them to the identity provider and answers with
//!    the session and the user's display name
//! 3. Later requests send `Authorization: Bearer <access token>`; the
//!    [`Auth`] extractor verifies it and yields the `sub` claim as the
//!    canonical `user_id`
//!
//! ## Security
//!
//! - All non-health, non-login endpoints require authentication
//! - Clock skew tolerance is 60 seconds
//! - Without `SUPABASE_ANON_KEY` login and signup are disabled, but the
//!   process keeps serving

pub mod claims;
pub mod error;
pub mod extractor;
pub mod identity;

pub use claims::{AuthenticatedUser, IdentityUser};
pub use error::AuthError;
pub use extractor::Auth;
pub use identity::{IdentityClient, IdentityError, Session, SignedIn, SignedUp};
