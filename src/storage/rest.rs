// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! PostgREST client for the managed store.
//!
//! All requests authenticate with the service-role key (`apikey` header plus
//! bearer token). Equality filters are sent as `column=eq.value`; upserts use
//! `on_conflict` with `Prefer: resolution=merge-duplicates`.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::backend::TableBackend;
use super::tables::{Filter, Table};
use super::{StoreError, StoreResult};

/// Request timeout for store calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const PREFER_MINIMAL: &str = "return=minimal";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=minimal";

/// Error body returned by PostgREST.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Client for `{SUPABASE_URL}/rest/v1`.
#[derive(Clone)]
pub struct RestClient {
    rest_url: String,
    service_key: String,
    http: Client,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("rest_url", &self.rest_url)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    pub fn new(base_url: &Url, service_key: impl Into<String>) -> StoreResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            rest_url: format!("{}/rest/v1", base_url.as_str().trim_end_matches('/')),
            service_key: service_key.into(),
            http,
        })
    }

    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}", self.rest_url, table.as_str())
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    async fn send(&self, request: RequestBuilder, op: &str, table: Table) -> StoreResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("{op} {table} failed: {e}")))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(classify_error(status, &body))
    }
}

impl TableBackend for RestClient {
    async fn select(&self, table: Table, columns: &str, filters: &[Filter]) -> StoreResult<Vec<Value>> {
        let request = self
            .request(Method::GET, &self.table_url(table))
            .query(&[("select", columns)])
            .query(&filter_params(filters));

        let response = self.send(request, "select", table).await?;
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| StoreError::Decode(format!("select {table}: {e}")))
    }

    async fn insert(&self, table: Table, row: Value) -> StoreResult<()> {
        let request = self
            .request(Method::POST, &self.table_url(table))
            .header("Prefer", PREFER_MINIMAL)
            .json(&row);

        self.send(request, "insert", table).await?;
        Ok(())
    }

    async fn upsert(&self, table: Table, row: Value, on_conflict: &[&str]) -> StoreResult<()> {
        let request = self
            .request(Method::POST, &self.table_url(table))
            .query(&[("on_conflict", on_conflict.join(","))])
            .header("Prefer", PREFER_UPSERT)
            .json(&row);

        self.send(request, "upsert", table).await?;
        Ok(())
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> StoreResult<()> {
        // PostgREST refuses unfiltered deletes; never send one.
        if filters.is_empty() {
            return Err(StoreError::Validation(format!(
                "refusing unfiltered delete on {table}"
            )));
        }

        let request = self
            .request(Method::DELETE, &self.table_url(table))
            .query(&filter_params(filters))
            .header("Prefer", PREFER_MINIMAL);

        self.send(request, "delete", table).await?;
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        let response = self
            .request(Method::GET, &format!("{}/", self.rest_url))
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("health check failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(classify_error(status, &body))
        }
    }
}

fn filter_params(filters: &[Filter]) -> Vec<(&'static str, String)> {
    filters.iter().map(|f| (f.column, f.operand())).collect()
}

/// Map a PostgREST error response to a [`StoreError`].
///
/// PostgreSQL error codes take precedence over the HTTP status: `23505` is a
/// unique violation, `42501` insufficient privilege, class `22` and `23`
/// data or constraint errors, `PGRST116` a `.single()` miss.
pub(crate) fn classify_error(status: StatusCode, body: &str) -> StoreError {
    let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let message = match (parsed.message, parsed.details) {
        (Some(m), Some(d)) if !d.is_empty() => format!("{m} ({d})"),
        (Some(m), _) => m,
        (None, _) if !body.is_empty() => body.to_string(),
        (None, _) => status.to_string(),
    };

    match parsed.code.as_deref() {
        Some("23505") => return StoreError::Conflict(message),
        Some("42501") => return StoreError::PermissionDenied(message),
        Some("PGRST116") => return StoreError::NotFound(message),
        Some(code) if code.starts_with("22") || code.starts_with("23") => {
            return StoreError::Validation(message)
        }
        _ => {}
    }

    match status {
        StatusCode::CONFLICT => StoreError::Conflict(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::PermissionDenied(message),
        StatusCode::NOT_FOUND | StatusCode::NOT_ACCEPTABLE => StoreError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            StoreError::Validation(message)
        }
        _ => StoreError::Backend {
            status: status.as_u16(),
            message,
        },
    }
}
