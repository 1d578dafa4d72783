//! Connection settings for the PostgreSQL store.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tracing::info;

use crate::store::{DatabaseError, PgStore};

/// Where the OSM data lives and how many connections may be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Upper bound on pooled connections, and on concurrent sub-queries
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
            database: "osm".to_string(),
            username: None,
            password: None,
            max_connections: 15,
        }
    }
}

impl StoreConfig {
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// `user@host:port/database`, without the password
    pub fn target(&self) -> String {
        match &self.username {
            Some(user) => format!("{}@{}:{}/{}", user, self.host, self.port, self.database),
            None => format!("{}:{}/{}", self.host, self.port, self.database),
        }
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database);
        if let Some(user) = &self.username {
            options = options.username(user);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        options
    }

    /// Open a bounded pool and wrap it as a store.
    pub async fn connect(&self) -> Result<PgStore, DatabaseError> {
        let max = self.max_connections.max(1);
        let pool = PgPoolOptions::new()
            .max_connections(max)
            .connect_with(self.connect_options())
            .await
            .map_err(|source| DatabaseError::Connect {
                target: self.target(),
                source,
            })?;

        info!(store = %self.target(), max_connections = max, "connected to store");
        Ok(PgStore::new(pool, max as usize))
    }
}
