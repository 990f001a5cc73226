// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults and the two configuration structs
//! read at startup: [`EngineConfig`] for the authorization engine and
//! [`ServerConfig`] for the HTTP binary.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the redb database and event logs | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `ADMIN_TOKEN` | Bearer token for the authoriser admin routes | Disabled when unset |
//! | `DOMAIN_ID` | Deployment domain mixed into every signed payload | `1` |
//! | `SECURITY_PERIOD_SECS` | Delay before whitelist entries and guardian changes mature | `86400` |
//! | `SECURITY_WINDOW_SECS` | Window in which a matured guardian change can be confirmed | `43200` |
//! | `LOCK_PERIOD_SECS` | Duration of a guardian lock | `432000` |
//! | `RECOVERY_PERIOD_SECS` | Cooling-off period of a social recovery | `172800` |
//! | `GUARDIAN_QUORUM` | `majority`, `half_rounded_up` or `two_thirds` | `majority` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Default data directory.
pub const DEFAULT_DATA_DIR: &str = "/data";

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Environment variable name for the server port.
pub const PORT_ENV: &str = "PORT";

/// Default port.
pub const DEFAULT_PORT: u16 = 8080;

/// Environment variable name for the admin bearer token.
///
/// When unset, the `/v1/admin` routes reject every request.
pub const ADMIN_TOKEN_ENV: &str = "ADMIN_TOKEN";

/// Environment variable name for the deployment domain id.
pub const DOMAIN_ID_ENV: &str = "DOMAIN_ID";

pub const SECURITY_PERIOD_ENV: &str = "SECURITY_PERIOD_SECS";
pub const SECURITY_WINDOW_ENV: &str = "SECURITY_WINDOW_SECS";
pub const LOCK_PERIOD_ENV: &str = "LOCK_PERIOD_SECS";
pub const RECOVERY_PERIOD_ENV: &str = "RECOVERY_PERIOD_SECS";
pub const GUARDIAN_QUORUM_ENV: &str = "GUARDIAN_QUORUM";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default deployment domain id.
pub const DEFAULT_DOMAIN_ID: u64 = 1;

/// One day.
pub const DEFAULT_SECURITY_PERIOD_SECS: u64 = 24 * 60 * 60;

/// Twelve hours.
pub const DEFAULT_SECURITY_WINDOW_SECS: u64 = 12 * 60 * 60;

/// Five days.
pub const DEFAULT_LOCK_PERIOD_SECS: u64 = 5 * 24 * 60 * 60;

/// Two days.
pub const DEFAULT_RECOVERY_PERIOD_SECS: u64 = 2 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be an unsigned integer, got `{value}`")]
    InvalidNumber { name: &'static str, value: String },

    #[error("GUARDIAN_QUORUM must be one of majority, half_rounded_up, two_thirds; got `{0}`")]
    InvalidQuorum(String),

    #[error("LOG_FORMAT must be `json` or `pretty`, got `{0}`")]
    InvalidLogFormat(String),
}

/// How many active guardians must co-sign an operation that needs the
/// guardian quorum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuorumRule {
    /// `ceil((n + 1) / 2)`: a strict majority of the active set.
    #[default]
    Majority,
    /// `ceil(n / 2)`.
    HalfRoundedUp,
    /// `ceil(2n / 3)`.
    TwoThirds,
}

impl QuorumRule {
    /// Number of guardian signatures required when `active` guardians exist.
    pub fn required(self, active: usize) -> usize {
        match self {
            Self::Majority => (active + 2) / 2,
            Self::HalfRoundedUp => active.div_ceil(2),
            Self::TwoThirds => (2 * active).div_ceil(3),
        }
        .min(active)
    }

    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "majority" => Ok(Self::Majority),
            "half_rounded_up" => Ok(Self::HalfRoundedUp),
            "two_thirds" => Ok(Self::TwoThirds),
            _ => Err(ConfigError::InvalidQuorum(raw.to_string())),
        }
    }
}

/// Timing and quorum parameters of the authorization engine.
///
/// All periods are in seconds of the engine [`Clock`](crate::clock::Clock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deployment domain id. Signatures produced for one domain never
    /// verify in another.
    pub domain: u64,
    pub security_period: u64,
    pub security_window: u64,
    pub lock_period: u64,
    pub recovery_period: u64,
    pub guardian_quorum: QuorumRule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN_ID,
            security_period: DEFAULT_SECURITY_PERIOD_SECS,
            security_window: DEFAULT_SECURITY_WINDOW_SECS,
            lock_period: DEFAULT_LOCK_PERIOD_SECS,
            recovery_period: DEFAULT_RECOVERY_PERIOD_SECS,
            guardian_quorum: QuorumRule::Majority,
        }
    }
}

impl EngineConfig {
    /// Load from the environment, falling back to defaults for unset
    /// variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let number = |name: &'static str, default: u64| match lookup(name) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
            None => Ok(default),
        };

        Ok(Self {
            domain: number(DOMAIN_ID_ENV, defaults.domain)?,
            security_period: number(SECURITY_PERIOD_ENV, defaults.security_period)?,
            security_window: number(SECURITY_WINDOW_ENV, defaults.security_window)?,
            lock_period: number(LOCK_PERIOD_ENV, defaults.lock_period)?,
            recovery_period: number(RECOVERY_PERIOD_ENV, defaults.recovery_period)?,
            guardian_quorum: match lookup(GUARDIAN_QUORUM_ENV) {
                Some(raw) => QuorumRule::parse(&raw)?,
                None => defaults.guardian_quorum,
            },
        })
    }

    /// Short periods used by tests: every delay is 2 seconds.
    pub fn for_testing() -> Self {
        Self {
            domain: DEFAULT_DOMAIN_ID,
            security_period: 2,
            security_window: 2,
            lock_period: 2,
            recovery_period: 2,
            guardian_quorum: QuorumRule::Majority,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Settings of the HTTP binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub admin_token: Option<String>,
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidNumber {
                name: PORT_ENV,
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref().map(str::trim) {
            None | Some("") | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        };

        Ok(Self {
            host: lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            data_dir: PathBuf::from(
                lookup(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            ),
            admin_token: lookup(ADMIN_TOKEN_ENV).filter(|token| !token.trim().is_empty()),
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn majority_quorum_matches_guardian_counts() {
        let rule = QuorumRule::Majority;
        assert_eq!(rule.required(0), 0);
        assert_eq!(rule.required(1), 1);
        assert_eq!(rule.required(2), 2);
        assert_eq!(rule.required(3), 2);
        assert_eq!(rule.required(4), 3);
        assert_eq!(rule.required(5), 3);
    }

    #[test]
    fn alternative_quorum_rules() {
        assert_eq!(QuorumRule::HalfRoundedUp.required(1), 1);
        assert_eq!(QuorumRule::HalfRoundedUp.required(2), 1);
        assert_eq!(QuorumRule::HalfRoundedUp.required(5), 3);
        assert_eq!(QuorumRule::TwoThirds.required(3), 2);
        assert_eq!(QuorumRule::TwoThirds.required(4), 3);
        assert_eq!(QuorumRule::TwoThirds.required(0), 0);
    }

    #[test]
    fn engine_config_defaults_when_env_is_empty() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn engine_config_reads_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            (SECURITY_PERIOD_ENV, "2"),
            (RECOVERY_PERIOD_ENV, " 10 "),
            (GUARDIAN_QUORUM_ENV, "Two_Thirds"),
            (DOMAIN_ID_ENV, "43114"),
        ]))
        .unwrap();
        assert_eq!(config.security_period, 2);
        assert_eq!(config.recovery_period, 10);
        assert_eq!(config.guardian_quorum, QuorumRule::TwoThirds);
        assert_eq!(config.domain, 43114);
        assert_eq!(config.lock_period, DEFAULT_LOCK_PERIOD_SECS);
    }

    #[test]
    fn engine_config_rejects_garbage() {
        let err = EngineConfig::from_lookup(lookup(&[(LOCK_PERIOD_ENV, "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                name: LOCK_PERIOD_ENV,
                value: "soon".into()
            }
        );

        let err = EngineConfig::from_lookup(lookup(&[(GUARDIAN_QUORUM_ENV, "all")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidQuorum(_)));
    }

    #[test]
    fn server_config_defaults_and_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.admin_token, None);
        assert_eq!(config.log_format, LogFormat::Pretty);

        let config = ServerConfig::from_lookup(lookup(&[
            (PORT_ENV, "9000"),
            (ADMIN_TOKEN_ENV, "   "),
            (LOG_FORMAT_ENV, "json"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.admin_token, None);
        assert_eq!(config.log_format, LogFormat::Json);

        assert!(ServerConfig::from_lookup(lookup(&[(LOG_FORMAT_ENV, "xml")])).is_err());
    }
}
