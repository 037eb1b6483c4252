// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variables are read once at startup. Parsing goes through a
//! lookup closure so it can be exercised without touching the process
//! environment.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SUPABASE_URL` | Base URL of the store and identity provider | Required |
//! | `SUPABASE_SERVICE_ROLE_KEY` | Store credential | Required |
//! | `SUPABASE_ANON_KEY` | Identity provider credential | Auth disabled when unset |
//! | `SUPABASE_JWT_SECRET` | HS256 secret for local token verification | Remote validation |
//! | `ENCRYPTION_SECRET` | Passphrase for the credential cipher | Required |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::crypto::{CipherError, CredentialCipher};

pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_SERVICE_ROLE_KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const SUPABASE_ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";
pub const SUPABASE_JWT_SECRET_ENV: &str = "SUPABASE_JWT_SECRET";
pub const ENCRYPTION_SECRET_ENV: &str = "ENCRYPTION_SECRET";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Shown when the identity provider is not configured.
pub const AUTH_DISABLED_MESSAGE: &str =
    "Supabase is not configured. Please set SUPABASE_URL and SUPABASE_ANON_KEY.";

/// Fatal startup misconfiguration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl { name: &'static str, reason: String },

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("ENCRYPTION_SECRET rejected: {0}")]
    Encryption(#[from] CipherError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Identity provider settings. Absent when the anon key is unset.
#[derive(Clone)]
pub struct IdentityConfig {
    pub url: Url,
    pub anon_key: String,
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

/// Fully parsed configuration.
#[derive(Clone)]
pub struct Config {
    pub supabase_url: Url,
    pub service_role_key: String,
    pub identity: Option<IdentityConfig>,
    pub jwt_secret: Option<String>,
    pub encryption_secret: String,
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("supabase_url", &self.supabase_url.as_str())
            .field("identity", &self.identity)
            .field("jwt_secret", &self.jwt_secret.is_some())
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_format", &self.log_format)
            .finish_non_exhaustive()
    }
}

/// Non-empty value of a variable, trimmed.
fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url =
            non_empty(&lookup, SUPABASE_URL_ENV).ok_or(ConfigError::Missing(SUPABASE_URL_ENV))?;
        let supabase_url = Url::parse(&raw_url).map_err(|e| ConfigError::InvalidUrl {
            name: SUPABASE_URL_ENV,
            reason: e.to_string(),
        })?;
        if !matches!(supabase_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                name: SUPABASE_URL_ENV,
                reason: format!("unsupported scheme '{}'", supabase_url.scheme()),
            });
        }

        let service_role_key = non_empty(&lookup, SUPABASE_SERVICE_ROLE_KEY_ENV)
            .ok_or(ConfigError::Missing(SUPABASE_SERVICE_ROLE_KEY_ENV))?;

        // Policy only; the key is derived once, when the state is built.
        let encryption_secret = lookup(ENCRYPTION_SECRET_ENV).unwrap_or_default();
        CredentialCipher::check_passphrase(&encryption_secret)?;

        let identity = non_empty(&lookup, SUPABASE_ANON_KEY_ENV).map(|anon_key| IdentityConfig {
            url: supabase_url.clone(),
            anon_key,
        });

        let port = match non_empty(&lookup, PORT_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                reason: format!("'{raw}' is not a port number"),
            })?,
            None => DEFAULT_PORT,
        };

        let log_format = match non_empty(&lookup, LOG_FORMAT_ENV).as_deref() {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            supabase_url,
            service_role_key,
            identity,
            jwt_secret: non_empty(&lookup, SUPABASE_JWT_SECRET_ENV),
            encryption_secret,
            host: non_empty(&lookup, HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            log_format,
        })
    }

    pub fn auth_enabled(&self) -> bool {
        self.identity.is_some()
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: HOST_ENV,
                reason: format!("'{}' is not a bind address", self.host),
            })
    }
}

/// Log format from the environment, read before the full config so that
/// config errors are logged in the right format.
pub fn log_format_from_env() -> LogFormat {
    match std::env::var(LOG_FORMAT_ENV) {
        Ok(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Pretty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        (SUPABASE_URL_ENV, "https://project.supabase.co"),
        (SUPABASE_SERVICE_ROLE_KEY_ENV, "service-role"),
        (ENCRYPTION_SECRET_ENV, "a-long-enough-passphrase"),
    ];

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut vars = BASE.to_vec();
        vars.extend_from_slice(extra);
        vars
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_lookup(lookup(BASE)).unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.jwt_secret.is_none());
        assert!(!config.auth_enabled());
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
    }

    #[test]
    fn missing_store_url_is_fatal() {
        let vars: Vec<_> = BASE.iter().copied().filter(|(k, _)| *k != SUPABASE_URL_ENV).collect();
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(SUPABASE_URL_ENV)));
    }

    #[test]
    fn missing_service_key_is_fatal() {
        let vars: Vec<_> = BASE
            .iter()
            .copied()
            .filter(|(k, _)| *k != SUPABASE_SERVICE_ROLE_KEY_ENV)
            .collect();
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(SUPABASE_SERVICE_ROLE_KEY_ENV)));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut vars = BASE.to_vec();
        vars[1] = (SUPABASE_SERVICE_ROLE_KEY_ENV, "   ");
        assert!(matches!(
            Config::from_lookup(lookup(&vars)),
            Err(ConfigError::Missing(SUPABASE_SERVICE_ROLE_KEY_ENV))
        ));
    }

    #[test]
    fn invalid_url_is_fatal() {
        let mut vars = BASE.to_vec();
        vars[0] = (SUPABASE_URL_ENV, "not a url");
        assert!(matches!(
            Config::from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidUrl { .. })
        ));

        vars[0] = (SUPABASE_URL_ENV, "ftp://project.supabase.co");
        assert!(matches!(
            Config::from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn encryption_secret_policy_is_enforced() {
        let vars: Vec<_> = BASE
            .iter()
            .copied()
            .filter(|(k, _)| *k != ENCRYPTION_SECRET_ENV)
            .collect();
        assert!(matches!(
            Config::from_lookup(lookup(&vars)),
            Err(ConfigError::Encryption(CipherError::MissingPassphrase))
        ));

        let mut vars = BASE.to_vec();
        vars[2] = (ENCRYPTION_SECRET_ENV, "short");
        assert!(matches!(
            Config::from_lookup(lookup(&vars)),
            Err(ConfigError::Encryption(CipherError::WeakPassphrase))
        ));
    }

    #[test]
    fn anon_key_enables_auth() {
        let config = Config::from_lookup(lookup(&with(&[(SUPABASE_ANON_KEY_ENV, "anon")]))).unwrap();
        assert!(config.auth_enabled());
        let identity = config.identity.unwrap();
        assert_eq!(identity.anon_key, "anon");
        assert_eq!(identity.url.as_str(), "https://project.supabase.co/");
    }

    #[test]
    fn optional_values_are_parsed() {
        let config = Config::from_lookup(lookup(&with(&[
            (SUPABASE_JWT_SECRET_ENV, "jwt-secret"),
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "9000"),
            (LOG_FORMAT_ENV, "JSON"),
        ])))
        .unwrap();
        assert_eq!(config.jwt_secret.as_deref(), Some("jwt-secret"));
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:9000");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Config::from_lookup(lookup(&with(&[(PORT_ENV, "eighty")]))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: PORT_ENV, .. }));
    }

    #[test]
    fn debug_hides_secrets() {
        let config = Config::from_lookup(lookup(&with(&[(SUPABASE_ANON_KEY_ENV, "anon-secret")]))).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("service-role"));
        assert!(!debug.contains("anon-secret"));
        assert!(!debug.contains("a-long-enough-passphrase"));
    }
}
