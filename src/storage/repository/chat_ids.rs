// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chat link repository.
//!
//! Links a user to the chat ids they own. Links are append-only: linking is
//! an insert, so linking the same chat twice creates two rows.

use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::super::tables::{columns, Filter, Table};
use super::super::{StoreResult, TableBackend};
use super::{all_rows, require};

#[derive(Deserialize)]
struct ChatIdRow {
    chat_id: String,
}

/// Repository for `chat_ids`.
pub struct ChatIdRepository<'a, B> {
    backend: &'a B,
}

impl<'a, B: TableBackend> ChatIdRepository<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Link a chat id to a user.
    pub async fn link(&self, user_id: &str, chat_id: &str) -> StoreResult<()> {
        let user_id = require("user_id", user_id)?;
        let chat_id = require("chat_id", chat_id)?;

        self.backend
            .insert(
                Table::ChatIds,
                json!({
                    "user_id": user_id,
                    "chat_id": chat_id,
                }),
            )
            .await
            .inspect_err(|e| warn!(user_id, chat_id, error = %e, "Error linking chat ID to user"))
    }

    /// Chat ids linked to a user, in store order.
    pub async fn list(&self, user_id: &str) -> StoreResult<Vec<String>> {
        let user_id = require("user_id", user_id)?;

        let rows = self
            .backend
            .select(
                Table::ChatIds,
                columns::CHAT_ID,
                &[Filter::eq(columns::USER_ID, user_id)],
            )
            .await
            .inspect_err(|e| warn!(user_id, error = %e, "Error fetching user chat IDs"))?;

        let rows: Vec<ChatIdRow> = all_rows(rows, "chat links")?;
        Ok(rows.into_iter().map(|row| row.chat_id).collect())
    }

    /// Unlink a chat id. Every duplicate link is removed.
    pub async fn delete(&self, user_id: &str, chat_id: &str) -> StoreResult<()> {
        let user_id = require("user_id", user_id)?;
        let chat_id = require("chat_id", chat_id)?;

        self.backend
            .delete(
                Table::ChatIds,
                &[
                    Filter::eq(columns::USER_ID, user_id),
                    Filter::eq(columns::CHAT_ID, chat_id),
                ],
            )
            .await
            .inspect_err(|e| warn!(user_id, chat_id, error = %e, "Error deleting user chat ID"))
    }
}
