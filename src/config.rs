//! Datastore configuration.
//!
//! Settings are read from the `[db]` table of a TOML document and may be
//! overridden per deployment through environment variables:
//!
//! | Variable        | Field         |
//! |-----------------|---------------|
//! | `RDS_HOSTNAME`  | `host`        |
//! | `RDS_PORT`      | `port`        |
//! | `RDS_DB_NAME`   | `database`    |
//! | `RDS_USERNAME`  | `username`    |
//! | `RDS_PASSWORD`  | `password`    |
//! | `TYPEORM_SYNC`  | `synchronize` |

use crate::task::adapters::postgres::{PostgresTaskRepository, TaskPgPool};
use crate::task::ports::TaskRepositoryError;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use serde::Deserialize;
use std::fmt;
use std::net::Ipv6Addr;
use std::path::Path;
use thiserror::Error;
use url::Url;

const DEFAULT_POOL_SIZE: u32 = 10;

/// Errors raised while loading configuration or opening the datastore.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// Path that was read.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid.
    #[error("invalid configuration: {0}")]
    Parse(Box<toml::de::Error>),

    /// An environment override holds an unusable value.
    #[error("invalid value '{value}' for {variable}")]
    InvalidOverride {
        /// Environment variable name.
        variable: &'static str,
        /// Rejected value.
        value: String,
    },

    /// A setting cannot be written into a connection URL.
    #[error("invalid connection setting {field}")]
    InvalidUrl {
        /// Offending setting.
        field: &'static str,
    },

    /// The connection pool could not be built.
    #[error("failed to build connection pool: {0}")]
    Pool(#[from] PoolError),

    /// The blocking pool construction task failed.
    #[error("connection setup task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Schema synchronization failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    db: DatabaseConfig,
}

/// Connection settings for the task datastore.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// Database server host name.
    pub host: String,
    /// Database server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Login role.
    pub username: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// Whether to create missing tables on connect.
    #[serde(default)]
    pub synchronize: bool,
    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

const fn default_port() -> u16 {
    5432
}

const fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

impl DatabaseConfig {
    /// Parses the `[db]` table of a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the document is malformed or the
    /// table is missing required keys.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let parsed: ConfigDocument =
            toml::from_str(document).map_err(|err| ConfigError::Parse(Box::new(err)))?;
        Ok(parsed.db)
    }

    /// Reads a TOML file and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is unreadable, malformed, or an
    /// override is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = path.as_ref();
        let document = std::fs::read_to_string(file).map_err(|source| ConfigError::Read {
            path: file.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&document)?.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies deployment overrides looked up through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] when `RDS_PORT` or
    /// `TYPEORM_SYNC` cannot be parsed.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup("RDS_HOSTNAME") {
            self.host = host;
        }
        if let Some(port) = lookup("RDS_PORT") {
            self.port = port.trim().parse().map_err(|_| ConfigError::InvalidOverride {
                variable: "RDS_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(database) = lookup("RDS_DB_NAME") {
            self.database = database;
        }
        if let Some(username) = lookup("RDS_USERNAME") {
            self.username = username;
        }
        if let Some(password) = lookup("RDS_PASSWORD") {
            self.password = password;
        }
        if let Some(sync) = lookup("TYPEORM_SYNC") {
            self.synchronize = parse_flag(&sync).ok_or_else(|| ConfigError::InvalidOverride {
                variable: "TYPEORM_SYNC",
                value: sync.clone(),
            })?;
        }
        Ok(self)
    }

    /// Renders a `postgres://` connection URL.
    ///
    /// Credentials and the database name are percent-encoded. IPv6 hosts
    /// are bracketed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] when a setting cannot appear in a
    /// URL, such as a host containing spaces.
    pub fn database_url(&self) -> Result<String, ConfigError> {
        let mut url = Url::parse("postgres://localhost/").map_err(|_| invalid_url("scheme"))?;
        let host = self
            .host
            .parse::<Ipv6Addr>()
            .map_or_else(|_| self.host.clone(), |addr| format!("[{addr}]"));
        url.set_host(Some(&host)).map_err(|_| invalid_url("host"))?;
        url.set_port(Some(self.port)).map_err(|()| invalid_url("port"))?;
        url.set_username(&self.username).map_err(|()| invalid_url("username"))?;
        let password = Some(self.password.as_str()).filter(|value| !value.is_empty());
        url.set_password(password).map_err(|()| invalid_url("password"))?;
        url.path_segments_mut()
            .map_err(|()| invalid_url("database"))?
            .pop_if_empty()
            .push(&self.database);
        Ok(url.into())
    }

    /// Builds a connection pool for this configuration.
    ///
    /// This blocks while the pool opens its initial connections.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Pool`] when the database is unreachable.
    pub fn build_pool(&self) -> Result<TaskPgPool, ConfigError> {
        let manager = ConnectionManager::<PgConnection>::new(self.database_url()?);
        let pool = Pool::builder().max_size(self.pool_size).build(manager)?;
        Ok(pool)
    }

    /// Opens the task repository, creating the schema first when
    /// `synchronize` is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the pool cannot be built or schema
    /// synchronization fails.
    pub async fn connect(&self) -> Result<PostgresTaskRepository, ConfigError> {
        let config = self.clone();
        let pool = tokio::task::spawn_blocking(move || config.build_pool()).await??;
        let repository = PostgresTaskRepository::new(pool);
        if self.synchronize {
            repository.synchronize_schema().await?;
        }
        tracing::info!(host = %self.host, database = %self.database, "task store connected");
        Ok(repository)
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("synchronize", &self.synchronize)
            .field("pool_size", &self.pool_size)
            .finish()
    }
}

const fn invalid_url(field: &'static str) -> ConfigError {
    ConfigError::InvalidUrl { field }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
