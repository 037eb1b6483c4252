// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the remote tables.
//!
//! Each repository provides the operations for one entity type and borrows
//! the backend handed to it by the caller.

pub mod api_keys;
pub mod chat_ids;
pub mod profiles;
pub mod settings;

pub use api_keys::{ApiKeyRepository, StoredApiKey, GITHUB_PROVIDER};
pub use chat_ids::ChatIdRepository;
pub use profiles::{Profile, ProfileRepository};
pub use settings::{SettingsRepository, UserSetting};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::{StoreError, StoreResult};

/// Reject blank identifiers before they reach the backend.
pub(crate) fn require<'v>(field: &str, value: &'v str) -> StoreResult<&'v str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        warn!(field, "Rejected blank store key");
        return Err(StoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}

fn decode<T: DeserializeOwned>(row: Value, what: &str) -> StoreResult<T> {
    serde_json::from_value(row)
        .map_err(StoreError::from)
        .inspect_err(|e| warn!(record = what, error = %e, "Unreadable row from store"))
}

/// Decode the first row of a select, or `NotFound` when there is none.
pub(crate) fn first_row<T: DeserializeOwned>(rows: Vec<Value>, what: String) -> StoreResult<T> {
    let row = rows.into_iter().next();
    match row {
        Some(row) => decode(row, &what),
        None => Err(StoreError::NotFound(what)),
    }
}

/// Decode every row of a select. `what` names the rows in the log.
pub(crate) fn all_rows<T: DeserializeOwned>(rows: Vec<Value>, what: &str) -> StoreResult<Vec<T>> {
    rows.into_iter().map(|row| decode(row, what)).collect()
}
