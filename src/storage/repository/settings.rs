// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User settings repository.
//!
//! Settings are free-form string values keyed by `(user_id, name)`. Writes
//! upsert on that pair, so the latest write wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::super::tables::{columns, Filter, Table, USER_SETTINGS_CONFLICT};
use super::super::{StoreResult, TableBackend};
use super::{all_rows, first_row, require};

/// Row of `user_settings`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserSetting {
    /// Setting name, unique per user
    pub name: String,
    /// Stored value
    pub value: String,
    /// Last write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ValueRow {
    value: String,
}

/// Repository for `user_settings`.
pub struct SettingsRepository<'a, B> {
    backend: &'a B,
}

impl<'a, B: TableBackend> SettingsRepository<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Get one setting value.
    pub async fn get(&self, user_id: &str, name: &str) -> StoreResult<String> {
        let user_id = require("user_id", user_id)?;
        let name = require("setting name", name)?;

        let rows = self
            .backend
            .select(
                Table::UserSettings,
                columns::VALUE,
                &[
                    Filter::eq(columns::USER_ID, user_id),
                    Filter::eq(columns::NAME, name),
                ],
            )
            .await
            .inspect_err(|e| warn!(user_id, setting = name, error = %e, "Error fetching user setting"))?;

        let row: ValueRow = first_row(rows, format!("Setting {name}"))
            .inspect_err(|e| debug!(user_id, setting = name, error = %e, "User setting unavailable"))?;
        Ok(row.value)
    }

    /// Create or replace a setting value.
    pub async fn set(&self, user_id: &str, name: &str, value: &str) -> StoreResult<()> {
        let user_id = require("user_id", user_id)?;
        let name = require("setting name", name)?;

        let row = json!({
            "user_id": user_id,
            "name": name,
            "value": value,
            "updated_at": Utc::now(),
        });

        self.backend
            .upsert(Table::UserSettings, row, USER_SETTINGS_CONFLICT)
            .await
            .inspect_err(|e| warn!(user_id, setting = name, error = %e, "Error setting user setting"))
    }

    /// List all settings of a user.
    pub async fn list(&self, user_id: &str) -> StoreResult<Vec<UserSetting>> {
        let user_id = require("user_id", user_id)?;

        let rows = self
            .backend
            .select(
                Table::UserSettings,
                "name,value,updated_at",
                &[Filter::eq(columns::USER_ID, user_id)],
            )
            .await
            .inspect_err(|e| warn!(user_id, error = %e, "Error listing user settings"))?;

        let mut settings: Vec<UserSetting> = all_rows(rows, "user settings")?;
        settings.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(settings)
    }

    /// Remove a setting. Removing an absent setting succeeds.
    pub async fn delete(&self, user_id: &str, name: &str) -> StoreResult<()> {
        let user_id = require("user_id", user_id)?;
        let name = require("setting name", name)?;

        self.backend
            .delete(
                Table::UserSettings,
                &[
                    Filter::eq(columns::USER_ID, user_id),
                    Filter::eq(columns::NAME, name),
                ],
            )
            .await
            .inspect_err(|e| warn!(user_id, setting = name, error = %e, "Error deleting user setting"))
    }
}
