// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Table names, column names and conflict targets of the remote store.

use std::fmt;

/// Tables owned by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Profiles,
    UserSettings,
    ApiKeys,
    ChatIds,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::UserSettings => "user_settings",
            Table::ApiKeys => "api_keys",
            Table::ChatIds => "chat_ids",
        }
    }

    /// Columns that uniquely identify a row beyond its surrogate `id`.
    ///
    /// `chat_ids` has none: links are append-only.
    pub fn natural_key(&self) -> &'static [&'static str] {
        match self {
            Table::Profiles => &[columns::ID],
            Table::UserSettings => USER_SETTINGS_CONFLICT,
            Table::ApiKeys => API_KEYS_CONFLICT,
            Table::ChatIds => &[],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conflict target for setting upserts.
pub const USER_SETTINGS_CONFLICT: &[&str] = &[columns::USER_ID, columns::NAME];

/// Conflict target for API key upserts.
pub const API_KEYS_CONFLICT: &[&str] = &[columns::USER_ID, columns::PROVIDER];

pub mod columns {
    pub const ID: &str = "id";
    pub const USER_ID: &str = "user_id";
    pub const EMAIL: &str = "email";
    pub const NAME: &str = "name";
    pub const VALUE: &str = "value";
    pub const PROVIDER: &str = "provider";
    pub const KEY_CIPHERTEXT: &str = "key_ciphertext";
    pub const CHAT_ID: &str = "chat_id";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
}

/// Equality filter on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: &'static str,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<String>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }

    /// PostgREST query operand (`eq.<value>`).
    pub fn operand(&self) -> String {
        format!("eq.{}", self.value)
    }
}
