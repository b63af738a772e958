//! Database module for handling PostgreSQL connections and operations
//!
//! This module provides connection pooling, configuration, connection-string
//! normalization and health checks for the PostgreSQL database.

use crate::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, time::Duration};
use tracing::{error, info};
use url::Url;

/// Environment variables holding the connection string, in lookup order
pub const DATABASE_URL_VARS: [&str; 2] = ["DATABASE_URL", "DB_URL"];

const CANONICAL_SCHEME: &str = "postgresql";
const SSL_MODE_PARAM: &str = "sslmode";

/// Database configuration struct
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Normalized database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection acquire timeout in seconds
    pub connection_timeout: u64,
}

impl DatabaseConfig {
    /// Create a new DatabaseConfig from environment variables
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` or `DB_URL`: PostgreSQL connection URL (required)
    /// - `DATABASE_MAX_CONNECTIONS`: Maximum number of connections (default: 5)
    /// - `DATABASE_CONNECTION_TIMEOUT`: Acquire timeout in seconds (default: 30)
    pub fn from_env() -> DatabaseResult<Self> {
        let raw_url = DATABASE_URL_VARS
            .iter()
            .find_map(|name| env::var(name).ok().filter(|value| !value.trim().is_empty()))
            .ok_or_else(|| {
                DatabaseError::Configuration(format!(
                    "none of {} is set",
                    DATABASE_URL_VARS.join(", ")
                ))
            })?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let connection_timeout = env::var("DATABASE_CONNECTION_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            database_url: normalize_database_url(&raw_url)?,
            max_connections,
            connection_timeout,
        })
    }
}

/// Normalize a PostgreSQL connection string before handing it to sqlx
///
/// `postgres://` and driver-qualified schemes such as `postgresql+psycopg://`
/// are rewritten to `postgresql://`. When the URL carries no `sslmode`
/// parameter, `sslmode=require` is appended; an explicit `sslmode` is kept.
pub fn normalize_database_url(raw: &str) -> DatabaseResult<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DatabaseError::Configuration(
            "database URL is empty".to_string(),
        ));
    }

    let mut url = Url::parse(raw)
        .map_err(|e| DatabaseError::Configuration(format!("Invalid database URL: {}", e)))?;

    // Url::parse lowercases the scheme
    let scheme = url.scheme().to_string();
    let base_scheme = scheme.split('+').next().unwrap_or(&scheme);
    if base_scheme != "postgres" && base_scheme != CANONICAL_SCHEME {
        return Err(DatabaseError::Configuration(format!(
            "unsupported database URL scheme: {}",
            scheme
        )));
    }

    if scheme != CANONICAL_SCHEME {
        url.set_scheme(CANONICAL_SCHEME).map_err(|_| {
            DatabaseError::Configuration(format!(
                "cannot rewrite database URL scheme {} to {}",
                scheme, CANONICAL_SCHEME
            ))
        })?;
    }

    let has_ssl_mode = url.query_pairs().any(|(key, _)| key == SSL_MODE_PARAM);
    if !has_ssl_mode {
        url.query_pairs_mut().append_pair(SSL_MODE_PARAM, "require");
    }

    Ok(url.into())
}

/// Initialize a PostgreSQL connection pool
///
/// # Arguments
///
/// * `config` - Database configuration
///
/// # Returns
///
/// * `DatabaseResult<PgPool>` - PostgreSQL connection pool or error
pub async fn init_pool(config: &DatabaseConfig) -> DatabaseResult<PgPool> {
    info!("Initializing database connection pool");

    let options = config
        .database_url
        .parse()
        .map_err(|e| DatabaseError::Configuration(format!("Invalid database URL: {}", e)))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect_with(options)
        .await
        .map_err(DatabaseError::Connection)?;

    info!(
        max_connections = config.max_connections,
        "Database connection pool initialized"
    );
    Ok(pool)
}

/// Check database connectivity
///
/// Returns `Ok(false)` instead of an error when the database does not answer,
/// so callers can report degraded health without failing.
pub async fn health_check(pool: &PgPool) -> DatabaseResult<bool> {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => Ok(true),
        Err(e) => {
            error!("Database health check failed: {}", e);
            Ok(false)
        }
    }
}
