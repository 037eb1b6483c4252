// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Settings & Identity Store
//!
//! Typed access to the four tables the chat assistant keeps in its managed
//! PostgREST store.
//!
//! ## Tables
//!
//! ```text
//! profiles       id (= auth subject), email, created_at
//! user_settings  user_id, name, value, created_at, updated_at   unique (user_id, name)
//! api_keys       user_id, provider, key_ciphertext, ...          unique (user_id, provider)
//! chat_ids       id, user_id, chat_id, created_at               append-only
//! ```
//!
//! ## Rules
//!
//! - Every repository call is exactly one backend round trip
//! - Nothing is cached in-process
//! - Settings and API keys are upserted on their natural key (last write wins)
//! - Chat links are inserted, never upserted; duplicates are kept
//! - API keys are written as [`Ciphertext`](crate::crypto::Ciphertext) only

pub mod backend;
pub mod error;
pub mod memory;
pub mod repository;
pub mod rest;
pub mod tables;

pub use backend::{Backend, TableBackend};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryBackend;
pub use repository::{
    ApiKeyRepository, ChatIdRepository, Profile, ProfileRepository,
    SettingsRepository, StoredApiKey, UserSetting, GITHUB_PROVIDER,
};
pub use rest::RestClient;
pub use tables::{Filter, Table};
