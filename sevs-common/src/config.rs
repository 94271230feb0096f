//! Bootstrap configuration
//!
//! Resolution priority for every setting:
//! 1. Command-line argument or environment variable (via clap in the binary)
//! 2. TOML config file
//! 3. Compiled default
//!
//! Nothing here is reloaded at runtime; the service must restart to pick up
//! changes.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default HTTP port (matches the original deployment)
pub const DEFAULT_PORT: u16 = 4000;

/// Default bearer token lifetime
pub const DEFAULT_TOKEN_TTL_HOURS: u32 = 24;

const DEFAULT_POOL_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5000;

/// How long a recorded entry blocks another entry for the same venue
///
/// `Ever` is the primary contract. `Day` only rejects a second scan on the
/// same local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateScope {
    #[default]
    Ever,
    Day,
}

impl FromStr for DuplicateScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ever" => Ok(DuplicateScope::Ever),
            "day" => Ok(DuplicateScope::Day),
            other => Err(Error::Config(format!(
                "Unknown duplicate scope '{}' (expected 'ever' or 'day')",
                other
            ))),
        }
    }
}

impl fmt::Display for DuplicateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateScope::Ever => write!(f, "ever"),
            DuplicateScope::Day => write!(f, "day"),
        }
    }
}

/// Configuration file contents
///
/// Every field is optional; missing values fall through to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub bind_address: Option<IpAddr>,

    /// Origins allowed by CORS; empty means any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Previous signing secret, still accepted for verification during rotation
    #[serde(default)]
    pub jwt_secret_fallback: Option<String>,

    #[serde(default)]
    pub token_ttl_hours: Option<u32>,

    #[serde(default)]
    pub duplicate_scope: Option<DuplicateScope>,

    #[serde(default)]
    pub pool_max_connections: Option<u32>,

    #[serde(default)]
    pub acquire_timeout_ms: Option<u64>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level or EnvFilter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub allowed_origins: Option<Vec<String>>,
    pub jwt_secret: Option<String>,
    pub jwt_secret_fallback: Option<String>,
    pub token_ttl_hours: Option<u32>,
    pub duplicate_scope: Option<DuplicateScope>,
    pub log_level: Option<String>,
}

/// Connection pool sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    /// How long a request waits for a connection before failing
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_POOL_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_millis(DEFAULT_ACQUIRE_TIMEOUT_MS),
        }
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_address: IpAddr,
    pub port: u16,
    pub database_path: PathBuf,
    pub allowed_origins: Vec<String>,
    /// None means "use the persisted generated secret"
    pub jwt_secret: Option<String>,
    pub jwt_secret_fallback: Option<String>,
    pub token_ttl_hours: u32,
    pub duplicate_scope: DuplicateScope,
    pub pool: PoolSettings,
    pub log_level: String,
}

impl ServiceConfig {
    /// Merge overrides, file values and defaults
    pub fn resolve(overrides: ConfigOverrides, file: TomlConfig) -> Result<Self> {
        let token_ttl_hours = overrides
            .token_ttl_hours
            .or(file.token_ttl_hours)
            .unwrap_or(DEFAULT_TOKEN_TTL_HOURS);
        if token_ttl_hours == 0 {
            return Err(Error::Config("token_ttl_hours must be at least 1".to_string()));
        }

        let max_connections = file
            .pool_max_connections
            .unwrap_or(DEFAULT_POOL_MAX_CONNECTIONS);
        if max_connections == 0 {
            return Err(Error::Config(
                "pool_max_connections must be at least 1".to_string(),
            ));
        }

        let allowed_origins = overrides
            .allowed_origins
            .unwrap_or(file.allowed_origins)
            .into_iter()
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            bind_address: file
                .bind_address
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
            database_path: overrides
                .database_path
                .or(file.database_path)
                .unwrap_or_else(default_database_path),
            allowed_origins,
            jwt_secret: non_blank(overrides.jwt_secret).or_else(|| non_blank(file.jwt_secret)),
            jwt_secret_fallback: non_blank(overrides.jwt_secret_fallback)
                .or_else(|| non_blank(file.jwt_secret_fallback)),
            token_ttl_hours,
            duplicate_scope: overrides
                .duplicate_scope
                .or(file.duplicate_scope)
                .unwrap_or_default(),
            pool: PoolSettings {
                max_connections,
                acquire_timeout: Duration::from_millis(
                    file.acquire_timeout_ms.unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_MS),
                ),
            },
            log_level: overrides.log_level.unwrap_or(file.logging.level),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// True when CORS should accept any origin
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Split a comma-separated origin list (FRONTEND_URL)
pub fn parse_allowed_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load the TOML config file
///
/// An explicitly named file must exist and parse. Without one, the
/// platform default location is tried and silently skipped if absent.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(TomlConfig::default()),
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Parse TOML config text
pub fn parse_toml_config(content: &str) -> std::result::Result<TomlConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Platform config file location (~/.config/sevs/config.toml on Linux)
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sevs").join("config.toml"))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sevs"))
        .unwrap_or_else(|| PathBuf::from("./sevs_data"))
        .join("sevs.db")
}
