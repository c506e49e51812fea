//! Configuration module for loading TOML files and environment overrides.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an optional TOML configuration file.
pub const CONFIG_PATH_VAR: &str = "CONFIG_PATH";

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse TOML configuration.
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// Invalid configuration value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Database connection configuration.
    pub database: DatabaseConfig,
    /// Remote secret store configuration.
    pub secrets: SecretsConfig,
    /// Migration runner configuration.
    pub migrations: MigrationsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port number to listen on.
    pub port: u16,
    /// Directory holding the static browser UI.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: PathBuf::from("public"),
        }
    }
}

/// Database connection configuration as provided by the environment.
///
/// Required fields stay optional here; they are checked when the pool is
/// first built so that a misconfigured server can still start and report
/// the problem per request.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Hostname, or a socket directory when the value starts with `/`.
    pub host: String,
    /// TCP port, ignored in socket mode.
    pub port: Option<u16>,
    /// Database user.
    pub user: Option<String>,
    /// Plain-text password for local development.
    pub password: Option<String>,
    /// Database name.
    pub name: Option<String>,
    /// Enables TLS without certificate verification for TCP connections.
    pub ssl: bool,
    /// Maximum number of pooled connections.
    pub pool_size: u32,
    /// Name of the secret holding the password in the secret store.
    pub password_secret: Option<String>,
    /// Bound on waiting for a pooled connection, in seconds.
    pub acquire_timeout_secs: u64,
    /// Bound on the liveness probe run after building the pool, in seconds.
    pub probe_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            user: None,
            password: None,
            name: None,
            ssl: false,
            pool_size: 10,
            password_secret: None,
            acquire_timeout_secs: 5,
            probe_timeout_secs: 10,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("name", &self.name)
            .field("ssl", &self.ssl)
            .field("pool_size", &self.pool_size)
            .field("password_secret", &self.password_secret)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("probe_timeout_secs", &self.probe_timeout_secs)
            .finish()
    }
}

/// Secret store configuration.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// Cloud project owning the secrets. Looked up from the metadata
    /// server when unset.
    pub project_id: Option<String>,
    /// Pre-issued OAuth access token. The metadata server is used when unset.
    pub access_token: Option<String>,
    /// Bound on a single secret fetch, in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            access_token: None,
            fetch_timeout_secs: 10,
        }
    }
}

impl fmt::Debug for SecretsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretsConfig")
            .field("project_id", &self.project_id)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .finish()
    }
}

/// Migration runner configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MigrationsConfig {
    /// Directory holding `*.sql` migration files.
    pub dir: PathBuf,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("migrations"),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file.
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Arguments
    /// * `content` - TOML content as string.
    ///
    /// # Errors
    /// Returns error if content cannot be parsed.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds configuration from the process environment.
    ///
    /// Starts from the file named by `CONFIG_PATH` when set, otherwise from
    /// defaults, then applies environment overrides.
    ///
    /// # Errors
    /// Returns error if the file cannot be loaded or a variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) if !path.is_empty() => Self::load(path)?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from a variable lookup. Empty values count as unset.
    ///
    /// # Errors
    /// Returns error if a numeric variable cannot be parsed.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            self.server.port = parse_number("PORT", &port)?;
        }
        if let Some(dir) = get("STATIC_DIR") {
            self.server.static_dir = PathBuf::from(dir);
        }

        if let Some(host) = get("DB_HOST") {
            self.database.host = host;
        }
        if let Some(port) = get("DB_PORT") {
            self.database.port = Some(parse_number("DB_PORT", &port)?);
        }
        if let Some(user) = get("DB_USER") {
            self.database.user = Some(user);
        }
        if let Some(password) = get("DB_PASSWORD") {
            self.database.password = Some(password);
        }
        if let Some(name) = get("DB_NAME") {
            self.database.name = Some(name);
        }
        if let Some(ssl) = get("DB_SSL") {
            self.database.ssl = ssl.trim().eq_ignore_ascii_case("true");
        }
        if let Some(size) = get("DB_POOL_SIZE") {
            self.database.pool_size = parse_number("DB_POOL_SIZE", &size)?;
        }
        if let Some(secret) = get("DB_PASSWORD_SECRET") {
            self.database.password_secret = Some(secret);
        }
        if let Some(secs) = get("DB_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs = parse_number("DB_ACQUIRE_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = get("DB_PROBE_TIMEOUT_SECS") {
            self.database.probe_timeout_secs = parse_number("DB_PROBE_TIMEOUT_SECS", &secs)?;
        }

        if let Some(project) = get("GOOGLE_CLOUD_PROJECT").or_else(|| get("GCP_PROJECT")) {
            self.secrets.project_id = Some(project);
        }
        if let Some(token) = get("GCP_ACCESS_TOKEN") {
            self.secrets.access_token = Some(token);
        }
        if let Some(secs) = get("SECRET_FETCH_TIMEOUT_SECS") {
            self.secrets.fetch_timeout_secs = parse_number("SECRET_FETCH_TIMEOUT_SECS", &secs)?;
        }

        if let Some(dir) = get("MIGRATIONS_DIR") {
            self.migrations.dir = PathBuf::from(dir);
        }

        Ok(())
    }

    /// Validates the configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.pool_size == 0 {
            return Err(ConfigError::InvalidValue(
                "database pool_size must be positive".to_string(),
            ));
        }
        if self.database.port == Some(0) {
            return Err(ConfigError::InvalidValue(
                "database port must be positive".to_string(),
            ));
        }
        if self.database.acquire_timeout_secs == 0 || self.database.probe_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "database timeouts must be positive".to_string(),
            ));
        }
        if self.secrets.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "secret fetch timeout must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{key} must be a number, got {value:?}")))
}
