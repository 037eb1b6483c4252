// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chat Settings Server - data access and authentication for a chat assistant
//!
//! This crate keeps per-user settings, provider API keys and chat links in a
//! managed PostgREST store, encrypts secrets before they are persisted, and
//! runs login/signup against a GoTrue-style identity provider.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Login, signup and bearer-token verification
//! - `config` - Environment configuration
//! - `crypto` - Credential cipher (AES-256-GCM)
//! - `storage` - Typed repositories over the remote tables

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
