//! Database connection pool management.
//!
//! A [`PoolManager`] owns at most one pool at a time. The pool is built on
//! the first call to [`PoolManager::get_pool`]: configuration is derived
//! from [`DatabaseConfig`], the password is resolved through the
//! [`SecretResolver`], and a single connection is checked out as a liveness
//! probe before the pool is handed out. Later calls return the same pool
//! until [`PoolManager::close_pool`] resets the manager.

use super::error::DbError;
use crate::config::{Config, DatabaseConfig};
use crate::secrets::{GcpSecretStore, SecretResolver};
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow, PgSslMode};
use sqlx::{PgPool, Postgres};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Default PostgreSQL port.
pub const DEFAULT_PORT: u16 = 5432;

/// Where the database is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// Unix socket directory, e.g. `/cloudsql/PROJECT:REGION:INSTANCE`.
    Socket(PathBuf),
    /// Network host and port.
    Tcp {
        /// Hostname or address.
        host: String,
        /// Port number.
        port: u16,
        /// Whether to require TLS.
        ssl: bool,
    },
}

impl ConnectionTarget {
    /// Derives the target from a host string.
    ///
    /// Hosts starting with `/` are socket paths; port and SSL are ignored
    /// for them.
    #[must_use]
    pub fn from_host(host: &str, port: Option<u16>, ssl: bool) -> Self {
        if host.starts_with('/') {
            ConnectionTarget::Socket(PathBuf::from(host))
        } else {
            ConnectionTarget::Tcp {
                host: host.to_string(),
                port: port.unwrap_or(DEFAULT_PORT),
                ssl,
            }
        }
    }
}

/// Fully resolved connection configuration.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Where to connect.
    pub target: ConnectionTarget,
    /// Database user.
    pub user: String,
    /// Resolved password.
    pub password: String,
    /// Database name.
    pub database: String,
    /// Maximum number of pooled connections.
    pub pool_size: u32,
    /// Bound on waiting for a pooled connection.
    pub acquire_timeout: Duration,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("target", &self.target)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("pool_size", &self.pool_size)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

impl ConnectionConfig {
    /// Builds `sqlx` connect options for this configuration.
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .username(&self.user)
            .password(&self.password)
            .database(&self.database);

        match &self.target {
            ConnectionTarget::Socket(path) => options.socket(path).ssl_mode(PgSslMode::Disable),
            ConnectionTarget::Tcp { host, port, ssl } => {
                let mode = if *ssl {
                    PgSslMode::Require
                } else {
                    PgSslMode::Disable
                };
                options.host(host).port(*port).ssl_mode(mode)
            }
        }
    }
}

/// Builds, probes and closes pools.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Shared pool handle.
    type Pool: Clone + Send + Sync;

    /// Constructs a pool without performing I/O.
    fn build(&self, config: &ConnectionConfig) -> Result<Self::Pool, DbError>;

    /// Checks out and releases one connection.
    async fn probe(&self, pool: &Self::Pool) -> Result<(), DbError>;

    /// Drains and closes the pool.
    async fn close(&self, pool: &Self::Pool);
}

/// PostgreSQL connector backed by `sqlx`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnector;

#[async_trait]
impl Connector for PgConnector {
    type Pool = PgPool;

    fn build(&self, config: &ConnectionConfig) -> Result<PgPool, DbError> {
        Ok(PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(config.connect_options()))
    }

    async fn probe(&self, pool: &PgPool) -> Result<(), DbError> {
        let conn = pool.acquire().await.map_err(|e| match e {
            sqlx::Error::PoolTimedOut => DbError::Timeout {
                operation: "liveness probe",
                after: pool.options().get_acquire_timeout(),
            },
            other => DbError::Connection(other),
        })?;
        drop(conn);
        Ok(())
    }

    async fn close(&self, pool: &PgPool) {
        pool.close().await;
    }
}

/// Lazily initialized database pool.
pub struct PoolManager<C: Connector = PgConnector> {
    config: DatabaseConfig,
    secrets: Arc<SecretResolver>,
    connector: C,
    pool: RwLock<Option<C::Pool>>,
}

impl PoolManager<PgConnector> {
    /// Creates a manager for PostgreSQL.
    #[must_use]
    pub fn new(config: DatabaseConfig, secrets: Arc<SecretResolver>) -> Self {
        Self::with_connector(config, secrets, PgConnector)
    }

    /// Creates a manager whose passwords come from Secret Manager.
    ///
    /// # Errors
    /// Returns an error if the secret store HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let store = GcpSecretStore::new(&config.secrets)?;
        let secrets = SecretResolver::new(
            Arc::new(store),
            Duration::from_secs(config.secrets.fetch_timeout_secs),
        );
        Ok(Self::new(config.database.clone(), Arc::new(secrets)))
    }
}

impl<C: Connector> PoolManager<C> {
    /// Creates a manager using a custom connector.
    #[must_use]
    pub fn with_connector(config: DatabaseConfig, secrets: Arc<SecretResolver>, connector: C) -> Self {
        Self {
            config,
            secrets,
            connector,
            pool: RwLock::new(None),
        }
    }

    /// Returns the pool, building and probing it on first use.
    ///
    /// # Errors
    /// Returns [`DbError::Configuration`] when required settings are missing,
    /// [`DbError::Secret`] when the password cannot be resolved, and
    /// [`DbError::Connection`] or [`DbError::Timeout`] when the probe fails.
    /// Nothing is cached on failure, so the next call starts over.
    pub async fn get_pool(&self) -> Result<C::Pool, DbError> {
        if let Some(pool) = self.pool.read().await.as_ref() {
            return Ok(pool.clone());
        }

        let mut slot = self.pool.write().await;
        if let Some(pool) = slot.as_ref() {
            return Ok(pool.clone());
        }

        let config = self.resolve_config().await?;
        debug!(?config, "Building database pool");
        let pool = self.connector.build(&config)?;

        let probe_timeout = Duration::from_secs(self.config.probe_timeout_secs);
        let probe = match tokio::time::timeout(probe_timeout, self.connector.probe(&pool)).await {
            Ok(result) => result,
            Err(_) => Err(DbError::Timeout {
                operation: "liveness probe",
                after: probe_timeout,
            }),
        };

        if let Err(e) = probe {
            error!("Database connection failed: {}", e);
            self.connector.close(&pool).await;
            return Err(e);
        }

        info!("Database connection established successfully");
        *slot = Some(pool.clone());
        Ok(pool)
    }

    /// Returns true if a pool is currently cached.
    pub async fn is_initialized(&self) -> bool {
        self.pool.read().await.is_some()
    }

    /// Closes the pool and resets the manager. No-op when already closed.
    pub async fn close_pool(&self) {
        let pool = self.pool.write().await.take();
        if let Some(pool) = pool {
            self.connector.close(&pool).await;
            info!("Database connection pool closed");
        }
    }

    /// Derives and validates the connection configuration.
    async fn resolve_config(&self) -> Result<ConnectionConfig, DbError> {
        let config = &self.config;
        let user = non_empty(config.user.as_deref());
        let database = non_empty(config.name.as_deref());
        let local_password = non_empty(config.password.as_deref());
        let secret_name = non_empty(config.password_secret.as_deref());

        let mut missing = Vec::new();
        if user.is_none() {
            missing.push("DB_USER");
        }
        if local_password.is_none() && secret_name.is_none() {
            missing.push("DB_PASSWORD");
        }
        if database.is_none() {
            missing.push("DB_NAME");
        }
        let (Some(user), Some(database), true) = (user, database, missing.is_empty()) else {
            return Err(DbError::Configuration { missing });
        };

        let password = self
            .secrets
            .resolve_password(local_password, secret_name)
            .await?
            .filter(|password| !password.is_empty())
            .ok_or_else(|| DbError::Configuration {
                missing: vec!["DB_PASSWORD"],
            })?;

        Ok(ConnectionConfig {
            target: ConnectionTarget::from_host(&config.host, config.port, config.ssl),
            user: user.to_string(),
            password,
            database: database.to_string(),
            pool_size: config.pool_size,
            acquire_timeout: Duration::from_secs(config.acquire_timeout_secs),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl PoolManager<PgConnector> {
    /// Executes a parameterized statement and returns its rows.
    ///
    /// Parameters are bound as `$1`, `$2`, ... in order. Failures are
    /// returned unmodified and never retried.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be initialized or the query fails.
    pub async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<PgRow>, DbError> {
        let pool = self.get_pool().await?;
        let mut query = sqlx::query(sql);
        for param in params {
            query = match param {
                SqlValue::Null(NullKind::Bool) => query.bind(None::<bool>),
                SqlValue::Null(NullKind::Int) => query.bind(None::<i64>),
                SqlValue::Null(NullKind::Float) => query.bind(None::<f64>),
                SqlValue::Null(NullKind::Text) => query.bind(None::<String>),
                SqlValue::Bool(v) => query.bind(*v),
                SqlValue::Int(v) => query.bind(*v),
                SqlValue::Float(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.clone()),
            };
        }
        Ok(query.fetch_all(&pool).await?)
    }

    /// Executes a single unparameterized statement.
    ///
    /// # Errors
    /// Returns [`DbError::AlreadyExists`] for duplicate-object failures and
    /// [`DbError::Query`] for anything else.
    pub async fn execute_script(&self, sql: &str) -> Result<(), DbError> {
        let pool = self.get_pool().await?;
        sqlx::raw_sql(sql)
            .execute(&pool)
            .await
            .map_err(DbError::from_statement)?;
        Ok(())
    }

    /// Checks out a connection. It returns to the pool when dropped.
    ///
    /// # Errors
    /// Returns [`DbError::Timeout`] when no connection frees up in time.
    pub async fn get_connection(&self) -> Result<PoolConnection<Postgres>, DbError> {
        let pool = self.get_pool().await?;
        pool.acquire().await.map_err(|e| match e {
            sqlx::Error::PoolTimedOut => DbError::Timeout {
                operation: "connection acquisition",
                after: pool.options().get_acquire_timeout(),
            },
            other => DbError::Query(other),
        })
    }
}

/// A dynamically typed query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL `NULL` bound with the given column type.
    Null(NullKind),
    /// Boolean.
    Bool(bool),
    /// 64-bit integer.
    Int(i64),
    /// Double precision float.
    Float(f64),
    /// Text.
    Text(String),
}

/// Parameter type of a `NULL` value, matching the non-null variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullKind {
    /// `BOOL`.
    Bool,
    /// `INT8`.
    Int,
    /// `FLOAT8`.
    Float,
    /// `TEXT`.
    Text,
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

macro_rules! impl_from_option {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl From<Option<$ty>> for SqlValue {
                fn from(value: Option<$ty>) -> Self {
                    value.map_or(SqlValue::Null(NullKind::$kind), Into::into)
                }
            }
        )*
    };
}

impl_from_option! {
    &str => Text,
    String => Text,
    i64 => Int,
    f64 => Float,
    bool => Bool,
}
