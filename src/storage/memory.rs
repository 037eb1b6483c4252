// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory table backend.
//!
//! Mirrors the semantics the repositories rely on from the remote store:
//! primary-key uniqueness on insert, merge-on-conflict upserts, equality
//! filters, column projection, and server-side `id`/`created_at` defaults.
//! Stands in for the remote store in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::backend::TableBackend;
use super::tables::{columns, Filter, Table};
use super::{StoreError, StoreResult};

type Row = Map<String, Value>;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
    unavailable: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a transport error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of rows currently held in a table.
    pub async fn row_count(&self, table: Table) -> usize {
        self.tables
            .read()
            .await
            .get(&table)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Transport("memory backend marked unavailable".into()))
        } else {
            Ok(())
        }
    }
}

impl TableBackend for MemoryBackend {
    async fn select(&self, table: Table, columns: &str, filters: &[Filter]) -> StoreResult<Vec<Value>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let rows = tables.get(&table).map(Vec::as_slice).unwrap_or(&[]);

        Ok(rows
            .iter()
            .filter(|row| matches_all(row, filters))
            .map(|row| Value::Object(project(row, columns)))
            .collect())
    }

    async fn insert(&self, table: Table, row: Value) -> StoreResult<()> {
        self.check_available()?;
        let mut row = into_row(row)?;
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();

        if let Some(id) = row.get(columns::ID) {
            if rows.iter().any(|existing| existing.get(columns::ID) == Some(id)) {
                return Err(StoreError::Conflict(format!(
                    "duplicate key value violates unique constraint \"{table}_pkey\""
                )));
            }
        }

        apply_defaults(&mut row);
        rows.push(row);
        Ok(())
    }

    async fn upsert(&self, table: Table, row: Value, on_conflict: &[&str]) -> StoreResult<()> {
        self.check_available()?;
        let row = into_row(row)?;
        if on_conflict.iter().any(|column| !row.contains_key(*column)) {
            return Err(StoreError::Validation(format!(
                "upsert on {table} is missing conflict columns {}",
                on_conflict.join(",")
            )));
        }

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();

        let position = rows.iter().position(|existing| {
            on_conflict
                .iter()
                .all(|column| existing.get(*column) == row.get(*column))
        });

        match position {
            Some(index) => {
                let existing = &mut rows[index];
                for (column, value) in row {
                    existing.insert(column, value);
                }
            }
            None => {
                let mut row = row;
                apply_defaults(&mut row);
                rows.push(row);
            }
        }
        Ok(())
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> StoreResult<()> {
        self.check_available()?;
        if filters.is_empty() {
            return Err(StoreError::Validation(format!(
                "refusing unfiltered delete on {table}"
            )));
        }

        let mut tables = self.tables.write().await;
        if let Some(rows) = tables.get_mut(&table) {
            rows.retain(|row| !matches_all(row, filters));
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.check_available()
    }
}

fn into_row(value: Value) -> StoreResult<Row> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Validation(format!("row must be an object, got {other}"))),
    }
}

fn apply_defaults(row: &mut Row) {
    row.entry(columns::ID)
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    row.entry(columns::CREATED_AT)
        .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
}

fn matches_all(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| match row.get(filter.column) {
        Some(Value::String(s)) => s == &filter.value,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == filter.value,
    })
}

fn project(row: &Row, columns: &str) -> Row {
    if columns.trim() == "*" {
        return row.clone();
    }
    columns
        .split(',')
        .map(str::trim)
        .filter_map(|column| row.get(column).map(|v| (column.to_string(), v.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_assigns_id_and_created_at() {
        let backend = MemoryBackend::new();
        backend
            .insert(Table::ChatIds, json!({"user_id": "u-1", "chat_id": "c-1"}))
            .await
            .unwrap();

        let rows = backend.select(Table::ChatIds, "*", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0]["id"].is_string());
        assert!(rows[0]["created_at"].is_string());
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_primary_key() {
        let backend = MemoryBackend::new();
        let row = json!({"id": "u-1", "email": "a@b.c"});
        backend.insert(Table::Profiles, row.clone()).await.unwrap();

        let err = backend.insert(Table::Profiles, row).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn upsert_merges_on_conflict_columns() {
        let backend = MemoryBackend::new();
        let target = &["user_id", "name"];
        backend
            .upsert(Table::UserSettings, json!({"user_id": "u", "name": "theme", "value": "dark"}), target)
            .await
            .unwrap();
        backend
            .upsert(Table::UserSettings, json!({"user_id": "u", "name": "theme", "value": "light"}), target)
            .await
            .unwrap();

        assert_eq!(backend.row_count(Table::UserSettings).await, 1);
        let rows = backend
            .select(Table::UserSettings, "value", &[Filter::eq("user_id", "u")])
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({"value": "light"})]);
    }

    #[tokio::test]
    async fn select_projects_and_filters() {
        let backend = MemoryBackend::new();
        for (user, chat) in [("u-1", "c-1"), ("u-1", "c-2"), ("u-2", "c-3")] {
            backend
                .insert(Table::ChatIds, json!({"user_id": user, "chat_id": chat}))
                .await
                .unwrap();
        }

        let rows = backend
            .select(Table::ChatIds, "chat_id", &[Filter::eq("user_id", "u-1")])
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({"chat_id": "c-1"}), json!({"chat_id": "c-2"})]);
    }

    #[tokio::test]
    async fn unfiltered_delete_is_refused() {
        let backend = MemoryBackend::new();
        let err = backend.delete(Table::ChatIds, &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn unavailable_backend_fails_with_transport_error() {
        let backend = MemoryBackend::new();
        backend.set_unavailable(true);

        let err = backend.select(Table::Profiles, "*", &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
        assert!(backend.health_check().await.is_err());

        backend.set_unavailable(false);
        assert!(backend.health_check().await.is_ok());
    }
}
