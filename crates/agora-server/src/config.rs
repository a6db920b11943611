//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use agora_shared::constants::{DEFAULT_HTTP_PORT, DEFAULT_IDENTITY_HEADER, MAX_BODY_BYTES};
use axum::http::HeaderName;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`, or `PORT` to change only the port.
    /// Default: `0.0.0.0:3000`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `None` (platform data directory).
    pub database_path: Option<PathBuf>,

    /// Header the upstream authenticator uses to forward the caller's user id.
    /// Env: `IDENTITY_HEADER`
    /// Default: `x-user-id`
    pub identity_header: HeaderName,

    /// Maximum accepted request body size in bytes.
    /// Env: `MAX_BODY_BYTES`
    /// Default: 1 MiB
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            identity_header: HeaderName::from_static(DEFAULT_IDENTITY_HEADER),
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = var("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        if let Some(port) = var("PORT") {
            match port.parse::<u16>() {
                Ok(port) => config.http_addr.set_port(port),
                Err(_) => tracing::warn!(value = %port, "Invalid PORT, ignoring"),
            }
        }

        if let Some(path) = var("DATABASE_PATH").filter(|p| !p.is_empty()) {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(name) = var("IDENTITY_HEADER") {
            match HeaderName::from_bytes(name.trim().as_bytes()) {
                Ok(header) => config.identity_header = header,
                Err(_) => tracing::warn!(value = %name, "Invalid IDENTITY_HEADER, using default"),
            }
        }

        if let Some(val) = var("MAX_BODY_BYTES") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_body_bytes = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_BODY_BYTES, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
