use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::catalog::UploaderId;
use crate::classifier::{RuleError, RuleTable};

/// Distinguishes runtime behavior for different stages of the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Process-wide settings, loaded once at start-up and passed down explicitly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
    pub import: ImportConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let data_path = env::var("APP_DATA_PATH").unwrap_or_else(|_| "data/catalog.json".to_string());
        let media_root = env::var("APP_MEDIA_ROOT").unwrap_or_else(|_| "media".to_string());
        let media_url = env::var("APP_MEDIA_URL").unwrap_or_else(|_| "/media/".to_string());
        if media_url.trim().is_empty() {
            return Err(ConfigError::EmptyValue("APP_MEDIA_URL"));
        }

        let uploader = env::var("APP_IMPORT_UPLOADER").unwrap_or_else(|_| "admin".to_string());
        if uploader.trim().is_empty() {
            return Err(ConfigError::EmptyValue("APP_IMPORT_UPLOADER"));
        }
        let rules_path = env::var("APP_RULES_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            storage: StorageConfig {
                data_path: PathBuf::from(data_path),
                media_root: PathBuf::from(media_root),
                media_url,
            },
            import: ImportConfig {
                uploader: UploaderId(uploader),
                rules_path,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the catalog snapshot and the media files live.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_path: PathBuf,
    pub media_root: PathBuf,
    pub media_url: String,
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Identity recorded as uploader on imported resources.
    pub uploader: UploaderId,
    /// JSON rule table replacing the built-in one.
    pub rules_path: Option<PathBuf>,
}

impl ImportConfig {
    pub fn rule_table(&self) -> Result<RuleTable, RuleError> {
        match &self.rules_path {
            Some(path) => RuleTable::from_path(path),
            None => Ok(RuleTable::standard()),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    EmptyValue(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::EmptyValue(name) => write!(f, "{name} must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::EmptyValue(_) => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
