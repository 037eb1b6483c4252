// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error type for store operations.
//!
//! Every failure carries enough structure for callers to tell "row does not
//! exist" apart from "request rejected" and "backend unreachable".

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row matched the key
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input rejected before or by the backend
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unique constraint violated (e.g. profile already exists)
    #[error("Already exists: {0}")]
    Conflict(String),

    /// Credential lacks access to the table or row
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Network failure before a response arrived
    #[error("Store unreachable: {0}")]
    Transport(String),

    /// Any other non-success response
    #[error("Store returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// Response body could not be decoded into the expected row shape
    #[error("Unreadable store response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
