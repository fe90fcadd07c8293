//! Environment-driven server configuration
//!
//! Storage location and serving directories are supplied externally at
//! process start; the experiment → variant-list mapping is compiled-in
//! configuration (see [`crate::experiment::ExperimentRegistry::builtin`])
//! and deliberately not represented here.

use crate::{Error, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

/// Server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address, `host:port`.
    pub bind: String,
    /// SQLite database path (created and provisioned if absent).
    pub database_path: PathBuf,
    /// Root directory of the survey schema documents.
    pub schema_root: PathBuf,
    /// Root directory of the static assets (survey page shell, widget).
    pub public_root: PathBuf,
    /// Emit JSON-formatted logs.
    pub log_json: bool,
    /// Grace period for in-flight requests on shutdown.
    pub shutdown_drain: Duration,
}

impl ServerConfig {
    /// Read the configuration from `ROTOR_*` environment variables, falling
    /// back to development defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            bind: env_string("ROTOR_BIND", "0.0.0.0:3000"),
            database_path: PathBuf::from(env_string(
                "ROTOR_DATABASE_PATH",
                "data/survey-rotor.sqlite",
            )),
            schema_root: PathBuf::from(env_string("ROTOR_SCHEMA_ROOT", "surveys")),
            public_root: PathBuf::from(env_string("ROTOR_PUBLIC_ROOT", "public")),
            log_json: env_bool("ROTOR_LOG_JSON", false),
            shutdown_drain: env_duration_ms("ROTOR_SHUTDOWN_DRAIN_MS", 5000),
        }
    }

    /// Parse the bind address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the address is malformed.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|e| Error::Configuration(format!("invalid bind addr {}: {e}", self.bind)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr_parses() {
        let config = ServerConfig {
            bind: "127.0.0.1:3000".to_string(),
            ..ServerConfig::from_env()
        };
        assert!(config.bind_addr().is_ok());
    }

    #[test]
    fn test_bind_addr_rejects_garbage() {
        let config = ServerConfig {
            bind: "not-an-addr".to_string(),
            ..ServerConfig::from_env()
        };
        assert!(matches!(
            config.bind_addr(),
            Err(Error::Configuration(_))
        ));
    }
}
