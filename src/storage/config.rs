//! Store configuration
//!
//! `StoreConfig` is an explicitly constructed, immutable value handed to
//! the store at construction time; there is no global configuration
//! state. Placeholder values left over from environment templates are
//! rejected eagerly, with a clear message, instead of surfacing later as
//! an opaque connection failure.

use crate::core::error::Error;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Connection settings for the PostgreSQL store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "prospect".to_string(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Placeholder patterns commonly left in environment templates.
const PLACEHOLDERS: &[&str] = &[
    "your_db_user",
    "your_db_name",
    "your_secure_password_here",
    "localhost_or_postgres_service",
    "CHANGE_ME",
    "TODO",
];

impl StoreConfig {
    /// Fail fast on placeholder values instead of attempting to connect.
    pub fn validate(&self) -> Result<(), Error> {
        let fields = [
            ("host", self.host.as_str()),
            ("user", self.user.as_str()),
            ("database", self.database.as_str()),
        ];
        for (field, value) in fields {
            if value.is_empty() || PLACEHOLDERS.contains(&value) {
                return Err(Error::failed_precondition(
                    field,
                    format!("database {field} is unset or a placeholder value: {value:?}"),
                ));
            }
        }
        if PLACEHOLDERS.contains(&self.password.as_str()) {
            return Err(Error::failed_precondition(
                "password",
                "database password is a placeholder value",
            ));
        }
        Ok(())
    }

    /// The connection URL for this configuration.
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }

    /// Validate and open a connection pool.
    pub async fn connect(&self) -> Result<PgPool, Error> {
        self.validate()?;

        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect(&self.url())
            .await
            .map_err(|err| Error::internal("connect", err))
    }
}
