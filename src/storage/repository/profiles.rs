// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile repository.
//!
//! One profile per identity, keyed by the auth subject id and created once
//! at sign-up. A second create for the same id fails with `Conflict`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::super::tables::{columns, Filter, Table};
use super::super::{StoreError, StoreResult, TableBackend};
use super::{first_row, require};

/// Row of `profiles`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Profile {
    /// Auth subject id
    pub id: String,
    /// Email at registration
    pub email: String,
    /// When the profile was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Repository for `profiles`.
pub struct ProfileRepository<'a, B> {
    backend: &'a B,
}

impl<'a, B: TableBackend> ProfileRepository<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Create the profile for an identity.
    pub async fn create(&self, user_id: &str, email: &str) -> StoreResult<()> {
        let user_id = require("user_id", user_id)?;
        let email = require("email", email)?;
        if !email.contains('@') {
            warn!(user_id, "Rejected profile email without '@'");
            return Err(StoreError::Validation("email must contain '@'".into()));
        }

        self.backend
            .insert(Table::Profiles, json!({ "id": user_id, "email": email }))
            .await
            .inspect_err(|e| match e {
                StoreError::Conflict(_) => debug!(user_id, "Profile already exists"),
                _ => warn!(user_id, error = %e, "Error creating profile"),
            })
    }

    /// Fetch the profile for an identity.
    pub async fn get(&self, user_id: &str) -> StoreResult<Profile> {
        let user_id = require("user_id", user_id)?;

        let rows = self
            .backend
            .select(Table::Profiles, "*", &[Filter::eq(columns::ID, user_id)])
            .await
            .inspect_err(|e| warn!(user_id, error = %e, "Error fetching profile"))?;

        first_row(rows, format!("Profile {user_id}"))
    }
}
