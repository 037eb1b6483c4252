// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Table backend abstraction.
//!
//! Repositories speak to the store only through [`TableBackend`]: one
//! method per backend call, each a single round trip. The production
//! implementation is [`RestClient`]; [`MemoryBackend`] backs tests.

use std::future::Future;

use serde_json::Value;

use super::memory::MemoryBackend;
use super::rest::RestClient;
use super::tables::{Filter, Table};
use super::StoreResult;

/// One-call-per-operation access to the remote tables.
pub trait TableBackend: Send + Sync {
    /// Select `columns` (comma separated, `*` for all) from rows matching
    /// every filter.
    fn select(
        &self,
        table: Table,
        columns: &str,
        filters: &[Filter],
    ) -> impl Future<Output = StoreResult<Vec<Value>>> + Send;

    /// Insert a row. Fails with `Conflict` on a duplicate primary key.
    fn insert(&self, table: Table, row: Value) -> impl Future<Output = StoreResult<()>> + Send;

    /// Insert or update keyed by `on_conflict`.
    fn upsert(
        &self,
        table: Table,
        row: Value,
        on_conflict: &[&str],
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Delete rows matching every filter. Deleting nothing is not an error.
    fn delete(&self, table: Table, filters: &[Filter]) -> impl Future<Output = StoreResult<()>> + Send;

    /// Check that the store answers.
    fn health_check(&self) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Backend selected at startup.
#[derive(Debug)]
pub enum Backend {
    Rest(RestClient),
    Memory(MemoryBackend),
}

impl TableBackend for Backend {
    async fn select(&self, table: Table, columns: &str, filters: &[Filter]) -> StoreResult<Vec<Value>> {
        match self {
            Backend::Rest(client) => client.select(table, columns, filters).await,
            Backend::Memory(memory) => memory.select(table, columns, filters).await,
        }
    }

    async fn insert(&self, table: Table, row: Value) -> StoreResult<()> {
        match self {
            Backend::Rest(client) => client.insert(table, row).await,
            Backend::Memory(memory) => memory.insert(table, row).await,
        }
    }

    async fn upsert(&self, table: Table, row: Value, on_conflict: &[&str]) -> StoreResult<()> {
        match self {
            Backend::Rest(client) => client.upsert(table, row, on_conflict).await,
            Backend::Memory(memory) => memory.upsert(table, row, on_conflict).await,
        }
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> StoreResult<()> {
        match self {
            Backend::Rest(client) => client.delete(table, filters).await,
            Backend::Memory(memory) => memory.delete(table, filters).await,
        }
    }

    async fn health_check(&self) -> StoreResult<()> {
        match self {
            Backend::Rest(client) => client.health_check().await,
            Backend::Memory(memory) => memory.health_check().await,
        }
    }
}

impl From<RestClient> for Backend {
    fn from(client: RestClient) -> Self {
        Backend::Rest(client)
    }
}

impl From<MemoryBackend> for Backend {
    fn from(memory: MemoryBackend) -> Self {
        Backend::Memory(memory)
    }
}

#[cfg(test)]
impl Backend {
    pub(crate) fn as_memory(&self) -> Option<&MemoryBackend> {
        match self {
            Backend::Memory(memory) => Some(memory),
            Backend::Rest(_) => None,
        }
    }
}
