//! Startup configuration from environment variables.

use std::time::Duration;

/// Runtime configuration for the API binary.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (`VESTRY_ADDR`, default `0.0.0.0:8080`).
    pub addr: String,
    /// HS256 secret for bearer-token verification (`JWT_SECRET`).
    pub jwt_secret: String,
    /// Postgres connection string (`DATABASE_URL`); absent means the
    /// in-memory backend (dev/tests only, nothing survives a restart).
    pub database_url: Option<String>,
    /// Email granted the administrator role at startup
    /// (`VESTRY_BOOTSTRAP_ADMIN`).
    pub bootstrap_admin: Option<String>,
    /// Per-request deadline (`VESTRY_REQUEST_TIMEOUT_SECS`, default 10).
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });

        let request_timeout = std::env::var("VESTRY_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        Self {
            addr: std::env::var("VESTRY_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            jwt_secret,
            database_url: std::env::var("DATABASE_URL").ok(),
            bootstrap_admin: std::env::var("VESTRY_BOOTSTRAP_ADMIN").ok(),
            request_timeout,
        }
    }

    /// In-memory configuration for tests.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            addr: "127.0.0.1:0".to_string(),
            jwt_secret: jwt_secret.to_string(),
            database_url: None,
            bootstrap_admin: None,
            request_timeout: Duration::from_secs(5),
        }
    }
}
