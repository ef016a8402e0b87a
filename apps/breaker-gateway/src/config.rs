// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup and is immutable afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `BREAKER_LISTEN_ADDR` | Socket the gateway listens on | `127.0.0.1:6666` |
//! | `BREAKER_TOKEN_SECRET` | HMAC secret used to sign bearer tokens | Required |
//! | `BREAKER_IDENTIFIER_FIELD` | Claim that must be present in every token | Empty (disabled) |
//! | `BREAKER_TOKEN_VALIDITY_SECS` | Lifetime of issued tokens | `86400` |
//! | `BREAKER_DRY_RUN` | Accept webhooks without touching the chain | `false` |
//! | `BREAKER_STATUS_REQUIRES_AUTH` | Require a token on `/v1/status/*` | `false` |
//! | `BREAKER_CHAIN_TIMEOUT_SECS` | Upper bound for a single chain client call | `30` |
//! | `BREAKER_SHUTDOWN_GRACE_SECS` | Time in-flight requests get on shutdown | `10` |
//! | `BREAKER_LCD_URL` | REST endpoint of the chain node | Unset (no client bound) |
//! | `BREAKER_TOKEN_IDENTIFIER` | Identifier used by the `issue-token` binary | Empty |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::time::Duration;

/// Environment variable name for the listen address.
pub const LISTEN_ADDR_ENV: &str = "BREAKER_LISTEN_ADDR";

/// Environment variable name for the token signing secret.
///
/// The value never appears in logs or error messages.
pub const TOKEN_SECRET_ENV: &str = "BREAKER_TOKEN_SECRET";

/// Environment variable name for the identifier claim.
pub const IDENTIFIER_FIELD_ENV: &str = "BREAKER_IDENTIFIER_FIELD";

/// Environment variable name for the token validity window.
pub const TOKEN_VALIDITY_ENV: &str = "BREAKER_TOKEN_VALIDITY_SECS";

/// Environment variable name for the dry-run flag.
pub const DRY_RUN_ENV: &str = "BREAKER_DRY_RUN";

/// Environment variable name for gating the status routes.
pub const STATUS_REQUIRES_AUTH_ENV: &str = "BREAKER_STATUS_REQUIRES_AUTH";

/// Environment variable name for the chain client call timeout.
pub const CHAIN_TIMEOUT_ENV: &str = "BREAKER_CHAIN_TIMEOUT_SECS";

/// Environment variable name for the shutdown grace period.
pub const SHUTDOWN_GRACE_ENV: &str = "BREAKER_SHUTDOWN_GRACE_SECS";

/// Environment variable name for the LCD (REST) endpoint.
pub const LCD_URL_ENV: &str = "BREAKER_LCD_URL";

/// Environment variable name for the identifier the `issue-token` binary embeds.
pub const TOKEN_IDENTIFIER_ENV: &str = "BREAKER_TOKEN_IDENTIFIER";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:6666";
const DEFAULT_TOKEN_VALIDITY_SECS: u64 = 86_400;
const DEFAULT_CHAIN_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;

/// Gateway configuration.
///
/// Built once at startup. `dry_run` in particular is fixed for the lifetime
/// of the gateway constructed from it.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Address the HTTP listener binds to
    pub listen_addr: SocketAddr,
    /// Shared HMAC secret for bearer tokens
    pub token_secret: String,
    /// Claim every token must carry, if any
    pub identifier_field: Option<String>,
    /// Seconds an issued token stays valid
    pub token_validity_secs: u64,
    /// Skip chain invocation for webhook calls
    pub dry_run: bool,
    /// Apply the token gate to the status routes as well
    pub status_requires_auth: bool,
    /// Bound applied to every chain client call
    pub chain_call_timeout: Duration,
    /// How long in-flight requests may run after shutdown begins
    pub shutdown_grace: Duration,
    /// REST endpoint used to build the LCD chain client
    pub lcd_url: Option<String>,
}

impl GatewayConfig {
    /// Configuration with defaults for everything except the secret.
    pub fn new(token_secret: impl Into<String>) -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 6666))),
            token_secret: token_secret.into(),
            identifier_field: None,
            token_validity_secs: DEFAULT_TOKEN_VALIDITY_SECS,
            dry_run: false,
            status_requires_auth: false,
            chain_call_timeout: Duration::from_secs(DEFAULT_CHAIN_TIMEOUT_SECS),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
            lcd_url: None,
        }
    }

    pub fn with_listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = addr;
        self
    }

    pub fn with_identifier_field(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.identifier_field = if field.is_empty() { None } else { Some(field) };
        self
    }

    pub fn with_token_validity_secs(mut self, secs: u64) -> Self {
        self.token_validity_secs = secs;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_status_requires_auth(mut self, required: bool) -> Self {
        self.status_requires_auth = required;
        self
    }

    pub fn with_chain_call_timeout(mut self, timeout: Duration) -> Self {
        self.chain_call_timeout = timeout;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(TOKEN_SECRET_ENV)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing(TOKEN_SECRET_ENV))?;

        let mut config = Self::new(secret);

        if let Some(raw) = lookup(LISTEN_ADDR_ENV) {
            config.listen_addr = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid(LISTEN_ADDR_ENV, &raw))?;
        }
        if let Some(raw) = lookup(IDENTIFIER_FIELD_ENV) {
            config = config.with_identifier_field(raw.trim());
        }
        if let Some(raw) = lookup(TOKEN_VALIDITY_ENV) {
            config.token_validity_secs = parse_secs(TOKEN_VALIDITY_ENV, &raw)?;
        }
        if let Some(raw) = lookup(DRY_RUN_ENV) {
            config.dry_run = parse_flag(DRY_RUN_ENV, &raw)?;
        }
        if let Some(raw) = lookup(STATUS_REQUIRES_AUTH_ENV) {
            config.status_requires_auth = parse_flag(STATUS_REQUIRES_AUTH_ENV, &raw)?;
        }
        if let Some(raw) = lookup(CHAIN_TIMEOUT_ENV) {
            config.chain_call_timeout = Duration::from_secs(parse_secs(CHAIN_TIMEOUT_ENV, &raw)?);
        }
        if let Some(raw) = lookup(SHUTDOWN_GRACE_ENV) {
            config.shutdown_grace = Duration::from_secs(parse_secs(SHUTDOWN_GRACE_ENV, &raw)?);
        }
        if let Some(raw) = lookup(LCD_URL_ENV).filter(|s| !s.trim().is_empty()) {
            url::Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
                key: LCD_URL_ENV,
                reason: e.to_string(),
            })?;
            config.lcd_url = Some(raw.trim().to_string());
        }

        Ok(config)
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("listen_addr", &self.listen_addr)
            .field("token_secret", &"<redacted>")
            .field("identifier_field", &self.identifier_field)
            .field("token_validity_secs", &self.token_validity_secs)
            .field("dry_run", &self.dry_run)
            .field("status_requires_auth", &self.status_requires_auth)
            .field("chain_call_timeout", &self.chain_call_timeout)
            .field("shutdown_grace", &self.shutdown_grace)
            .field("lcd_url", &self.lcd_url.as_deref().map(redact_url))
            .finish()
    }
}

/// Render a URL for logs with any userinfo stripped.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            let _ = url.set_password(None);
            let _ = url.set_username("");
            url.to_string()
        }
        Err(_) => "<unparsable url>".to_string(),
    }
}

fn parse_secs(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, raw))
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::invalid(key, raw)),
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    /// The raw value is left out since URLs may carry credentials.
    #[error("Invalid URL in {key}: {reason}")]
    InvalidUrl { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str) -> Self {
        // Only ever raised for non-secret keys.
        ConfigError::Invalid {
            key,
            value: value.to_string(),
        }
    }
}
