//! Configuration System
//!
//! Loads configuration from an optional TOML file and applies environment
//! variable overrides on top. The data bucket has no default; [`Config::validate`]
//! rejects a configuration without one before anything is fetched or bound.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::dashboards::DashboardKind;
use crate::store::{DEFAULT_ENDPOINT, DEFAULT_METADATA_HOST};
use crate::table::LoadOptions;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which dashboard to serve and where its snapshot lives
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardConfig {
    #[serde(default = "default_kind")]
    pub kind: DashboardKind,

    /// Overrides the variant's built-in object key
    #[serde(default)]
    pub object_key: Option<String>,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_kind() -> DashboardKind {
    DashboardKind::Customer
}

fn default_delimiter() -> char {
    ','
}

impl DashboardConfig {
    /// Loader options for this dashboard
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions::default().with_delimiter(self.delimiter as u8)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            object_key: None,
            delimiter: default_delimiter(),
        }
    }
}

/// Object store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Bucket holding the snapshots. Required.
    #[serde(default)]
    pub bucket: Option<String>,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub token: Option<String>,

    /// Fetch tokens from the metadata server when no token is set and the
    /// endpoint is the public service
    #[serde(default = "default_metadata_credentials")]
    pub metadata_credentials: bool,

    #[serde(default = "default_metadata_host")]
    pub metadata_host: String,

    /// Read objects from `{local_root}/{bucket}/{key}` instead of over HTTP
    #[serde(default)]
    pub local_root: Option<PathBuf>,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    #[serde(default = "default_base_backoff")]
    pub base_backoff_ms: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_metadata_credentials() -> bool {
    true
}

fn default_metadata_host() -> String {
    DEFAULT_METADATA_HOST.to_string()
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_backoff() -> u64 {
    250
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            endpoint: default_endpoint(),
            token: None,
            metadata_credentials: default_metadata_credentials(),
            metadata_host: default_metadata_host(),
            local_root: None,
            fetch_timeout_secs: default_fetch_timeout(),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff(),
        }
    }
}

impl StoreConfig {
    /// The configured bucket, if present and not blank
    pub fn bucket_name(&self) -> Option<&str> {
        self.bucket
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8050
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Socket address to bind
    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid {
                setting: "api.host".to_string(),
                message: format!("{}:{} is not a socket address ({})", self.host, self.port, e),
            })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Default config file locations, highest priority first
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("dashboards").join("config.toml"));
        }
        paths.push(PathBuf::from("/etc/dashboards/config.toml"));
        paths.push(PathBuf::from("./dashboards.toml"));
        paths
    }

    /// Load the first of `paths` that exists, with environment overrides.
    ///
    /// Returns `None` when none of them exist. A file that exists but cannot
    /// be read or parsed is an error rather than a reason to fall back.
    pub fn load_first(paths: &[PathBuf]) -> Result<Option<(Self, PathBuf)>, ConfigError> {
        match paths.iter().find(|path| path.exists()) {
            Some(path) => Ok(Some((Self::load_with_env(path)?, path.clone()))),
            None => Ok(None),
        }
    }

    /// Load from default locations or environment
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::load_first(&Self::default_paths())? {
            Some((config, _)) => Ok(config),
            None => Self::from_env(),
        }
    }

    /// Apply environment variable overrides to an existing config
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Dashboard overrides
        if let Some(kind) = lookup("DASHBOARD") {
            self.dashboard.kind = kind.parse().map_err(|message| ConfigError::Invalid {
                setting: "DASHBOARD".to_string(),
                message,
            })?;
        }

        // Store overrides
        if let Some(bucket) = lookup("DATA_BUCKET") {
            self.store.bucket = Some(bucket);
        }
        if let Some(host) = lookup("STORAGE_EMULATOR_HOST") {
            self.store.endpoint = if host.contains("://") {
                host
            } else {
                format!("http://{}", host)
            };
        }
        if let Some(endpoint) = lookup("DASHBOARDS_STORE_ENDPOINT") {
            self.store.endpoint = endpoint;
        }
        if let Some(token) = lookup("DASHBOARDS_STORE_TOKEN") {
            self.store.token = Some(token);
        }
        if let Some(enabled) = lookup("DASHBOARDS_METADATA_CREDENTIALS") {
            self.store.metadata_credentials = parse_setting("DASHBOARDS_METADATA_CREDENTIALS", &enabled)?;
        }
        if let Some(host) = lookup("GCE_METADATA_HOST") {
            self.store.metadata_host = if host.contains("://") {
                host
            } else {
                format!("http://{}", host)
            };
        }
        if let Some(root) = lookup("DASHBOARDS_LOCAL_ROOT") {
            self.store.local_root = Some(PathBuf::from(root));
        }
        if let Some(secs) = lookup("DASHBOARDS_FETCH_TIMEOUT_SECS") {
            self.store.fetch_timeout_secs = parse_setting("DASHBOARDS_FETCH_TIMEOUT_SECS", &secs)?;
        }

        // API overrides
        if let Some(host) = lookup("HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.api.port = parse_setting("PORT", &port)?;
        }

        // Logging overrides
        if let Some(level) = lookup("DASHBOARDS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("DASHBOARDS_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Check settings that have no usable default
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.bucket_name().is_none() {
            return Err(ConfigError::MissingSetting {
                setting: "store.bucket".to_string(),
                env: "DATA_BUCKET".to_string(),
            });
        }
        if self.store.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                setting: "store.fetch_timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.store.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                setting: "store.max_attempts".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if !self.dashboard.delimiter.is_ascii() {
            return Err(ConfigError::Invalid {
                setting: "dashboard.delimiter".to_string(),
                message: format!("'{}' is not a single-byte character", self.dashboard.delimiter),
            });
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::Invalid {
                setting: "logging.format".to_string(),
                message: format!("expected 'pretty' or 'json', got '{}'", self.logging.format),
            });
        }
        self.api.addr()?;
        Ok(())
    }
}

fn parse_setting<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        setting: name.to_string(),
        message: format!("'{}': {}", raw, e),
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting {setting} (set {env})")]
    MissingSetting { setting: String, env: String },

    #[error("Invalid value for {setting}: {message}")]
    Invalid { setting: String, message: String },

    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Dashboards Configuration
#
# Environment variables override these settings:
# - DASHBOARD
# - DATA_BUCKET
# - STORAGE_EMULATOR_HOST
# - DASHBOARDS_STORE_ENDPOINT
# - DASHBOARDS_STORE_TOKEN
# - DASHBOARDS_METADATA_CREDENTIALS
# - GCE_METADATA_HOST
# - DASHBOARDS_LOCAL_ROOT
# - DASHBOARDS_FETCH_TIMEOUT_SECS
# - HOST
# - PORT
# - DASHBOARDS_LOG_LEVEL
# - DASHBOARDS_LOG_FORMAT

[dashboard]
# Variant to serve: customer, financial or sales
kind = "customer"

# Override the variant's snapshot key
# object_key = "dashboards/customer_data.csv"

# Field delimiter of the snapshot
delimiter = ","

[store]
# Bucket holding the snapshots (required)
# bucket = "my-analytics-bucket"

# Storage JSON API endpoint
endpoint = "https://storage.googleapis.com"

# Static bearer token; without one, tokens come from the metadata server
# token = "ya29...."

# Ask the metadata server for tokens (public endpoint only)
metadata_credentials = true
metadata_host = "http://metadata.google.internal"

# Read from {local_root}/{bucket}/{key} instead of the endpoint
# local_root = "./data"

# Per-request timeout in seconds
fetch_timeout_secs = 30

# Attempts for transient failures, with linear backoff
max_attempts = 3
base_backoff_ms = 250

[api]
# Server host
host = "0.0.0.0"

# Server port
port = 8050

# Allowed CORS origins
cors_origins = []

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.port, 8050);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.dashboard.kind, DashboardKind::Customer);
        assert_eq!(config.store.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.store.fetch_timeout_secs, 30);
        assert!(config.store.bucket.is_none());
    }

    #[test]
    fn test_missing_bucket_fails_validation() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingSetting { ref env, .. }) if env == "DATA_BUCKET"
        ));

        let mut blank = Config::default();
        blank.store.bucket = Some("   ".to_string());
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("DATA_BUCKET", "analytics"),
                ("PORT", "9000"),
                ("DASHBOARD", "sales"),
                ("DASHBOARDS_LOG_FORMAT", "json"),
            ]))
            .unwrap();

        assert_eq!(config.store.bucket_name(), Some("analytics"));
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.dashboard.kind, DashboardKind::Sales);
        assert_eq!(config.logging.format, "json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_emulator_host() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[("STORAGE_EMULATOR_HOST", "localhost:4443")]))
            .unwrap();
        assert_eq!(config.store.endpoint, "http://localhost:4443");

        // An explicit endpoint wins over the emulator
        config
            .apply_overrides(env(&[
                ("STORAGE_EMULATOR_HOST", "localhost:4443"),
                ("DASHBOARDS_STORE_ENDPOINT", "https://gcs.internal"),
            ]))
            .unwrap();
        assert_eq!(config.store.endpoint, "https://gcs.internal");
    }

    #[test]
    fn test_metadata_overrides() {
        let mut config = Config::default();
        assert!(config.store.metadata_credentials);
        assert_eq!(config.store.metadata_host, DEFAULT_METADATA_HOST);

        config
            .apply_overrides(env(&[
                ("GCE_METADATA_HOST", "169.254.169.254"),
                ("DASHBOARDS_METADATA_CREDENTIALS", "false"),
            ]))
            .unwrap();
        assert_eq!(config.store.metadata_host, "http://169.254.169.254");
        assert!(!config.store.metadata_credentials);
    }

    #[test]
    fn test_invalid_overrides() {
        let mut config = Config::default();
        assert!(matches!(
            config.apply_overrides(env(&[("PORT", "eighty")])),
            Err(ConfigError::Invalid { ref setting, .. }) if setting == "PORT"
        ));
        assert!(matches!(
            config.apply_overrides(env(&[("DASHBOARD", "inventory")])),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.api.port, 8050);
        assert_eq!(config.dashboard.delimiter, ',');
        assert_eq!(config.dashboard.load_options().delimiter, b',');
        assert_eq!(config.store.max_attempts, 3);
        assert!(config.store.metadata_credentials);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboards.toml");
        std::fs::write(
            &path,
            "[dashboard]\nkind = \"financial\"\n\n[store]\nbucket = \"reports\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.dashboard.kind, DashboardKind::Financial);
        assert_eq!(config.store.bucket_name(), Some("reports"));
        assert_eq!(config.api.port, 8050);

        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_malformed_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("config.toml");
        let broken = dir.path().join("dashboards.toml");
        std::fs::write(&broken, "[store\nbucket = \"x\"\n\n[api]\nport = \"eighty\"\n").unwrap();

        let result = Config::load_first(&[missing, broken.clone()]);
        assert!(matches!(
            result,
            Err(ConfigError::Parse { ref path, .. }) if *path == broken
        ));
    }

    #[test]
    fn test_load_first_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("config.toml");
        assert!(Config::load_first(&[missing.clone()]).unwrap().is_none());

        let present = dir.path().join("dashboards.toml");
        std::fs::write(&present, "[store]\nbucket = \"reports\"\n").unwrap();

        let (config, source) = Config::load_first(&[missing, present.clone()])
            .unwrap()
            .unwrap();
        assert_eq!(source, present);
        assert!(config.store.bucket.is_some());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = Config::default();
        config.store.bucket = Some("b".to_string());
        config.logging.format = "xml".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }
}
