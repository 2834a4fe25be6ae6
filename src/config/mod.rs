//! Configuration loading for threadline.
//!
//! Config lives at `~/.threadline/config.toml` and every field has a
//! sensible default, so a missing file is not an error. Two environment
//! variables override the file for deployment convenience:
//! - `THREADLINE_SECRET` — token signing secret
//! - `THREADLINE_DB` — identity store path

use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Development fallback signing secret. A deployment must override this via
/// config or `THREADLINE_SECRET`; startup logs a warning when it is in use.
const FALLBACK_SECRET: &str = "fallback-secret-key-change-in-production";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP gateway bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Identity store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite file. Defaults to `~/.threadline/threadline.db`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Token issuance and credential policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret. `THREADLINE_SECRET` takes precedence.
    #[serde(default)]
    pub secret: Option<String>,
    /// Session token lifetime in days.
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: u64,
    /// Minimum accepted password length at signup.
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    3000
}

fn default_token_ttl_days() -> u64 {
    7
}

fn default_min_password_len() -> usize {
    6
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: None,
            token_ttl_days: default_token_ttl_days(),
            min_password_len: default_min_password_len(),
        }
    }
}

impl Config {
    /// Load from `~/.threadline/config.toml`, falling back to defaults when
    /// the file does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::data_dir()?.join("config.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    /// Directory holding config, identity store, and client session files.
    pub fn data_dir() -> Result<PathBuf> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".threadline"))
    }

    /// Resolved identity store path (`THREADLINE_DB` > config > default).
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Ok(path) = std::env::var("THREADLINE_DB") {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("threadline.db")),
        }
    }

    /// Resolved signing secret (`THREADLINE_SECRET` > config > fallback).
    /// The fallback keeps local development working but is loudly flagged.
    pub fn signing_secret(&self) -> String {
        if let Ok(secret) = std::env::var("THREADLINE_SECRET") {
            if !secret.is_empty() {
                return secret;
            }
        }
        if let Some(secret) = &self.auth.secret {
            if !secret.is_empty() {
                return secret.clone();
            }
        }
        tracing::warn!(
            "No signing secret configured — using the development fallback. \
             Set THREADLINE_SECRET or [auth] secret in config.toml."
        );
        FALLBACK_SECRET.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.auth.token_ttl_days, 7);
        assert_eq!(config.auth.min_password_len, 6);
        assert!(config.auth.secret.is_none());
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            "[gateway]\nport = 8080\n\n[auth]\ntoken_ttl_days = 1\n",
        )
        .unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.auth.token_ttl_days, 1);
        assert_eq!(config.auth.min_password_len, 6);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.gateway.port, 3000);
        assert!(config.database.path.is_none());
    }
}
