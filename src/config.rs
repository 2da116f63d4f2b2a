//! Configuration management for the TagMatch engine
//!
//! Provides strongly-typed configuration with validation, environment variable parsing,
//! and sensible defaults.
//!
//! # Example
//! ```no_run
//! use tagmatch::Config;
//! let config = Config::from_env().expect("failed to load config");
//! println!("Catalog URL: {}", config.catalog.products_url());
//! ```

use crate::error::{Error, Result};
use std::time::Duration;
use tracing::{info, warn};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,
    /// Catalog provider configuration
    pub catalog: CatalogConfig,
    /// Logging and metrics configuration
    pub telemetry: TelemetryConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Port to listen on
    pub port: u16,
    /// Host to bind to
    pub host: String,
    /// Request timeout
    pub request_timeout: Duration,
    /// Enable CORS
    pub cors_enabled: bool,
    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

/// Catalog provider configuration
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the catalog service
    pub base_url: String,
    /// Path of the product listing endpoint
    pub products_path: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum retries for a fetch
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_delay: Duration,
    /// How often to re-fetch the catalog; `None` disables the refresher
    pub refresh_interval: Option<Duration>,
    /// How many tags of each item feed the selectable vocabulary
    pub tags_per_item: Option<usize>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Logging and metrics configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_format: LogFormat,
    /// Port for the Prometheus exporter (only with the `prometheus` feature)
    pub metrics_port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            request_timeout: Duration::from_secs(30),
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            products_path: "/products".to_string(),
            timeout: Duration::from_millis(5000),
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
            refresh_interval: None,
            tags_per_item: None,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_port: 9000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Platforms that mount secrets as files: each file name is the env var
        // name and its contents the value.
        if let Ok(folder) = std::env::var("FFOLDER") {
            load_env_folder(&folder);
        } else {
            // Try to load .env file (ignore if not found)
            dotenvy::dotenv().ok();
        }

        let config = Self {
            api: ApiConfig::from_env()?,
            catalog: CatalogConfig::from_env()?,
            telemetry: TelemetryConfig::from_env()?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let base_url = self.catalog.base_url.trim();
        if base_url.is_empty() {
            return Err(Error::InvalidConfig {
                key: "CATALOG_BASE_URL",
                message: "catalog base URL cannot be empty".into(),
            });
        }

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::InvalidConfig {
                key: "CATALOG_BASE_URL",
                message: format!("unsupported scheme in '{}'", mask_url(base_url)).into(),
            });
        }

        if self.api.port == 0 {
            return Err(Error::InvalidConfig {
                key: "API_PORT",
                message: "port must be non-zero".into(),
            });
        }

        if self.catalog.tags_per_item == Some(0) {
            return Err(Error::InvalidConfig {
                key: "CATALOG_TAGS_PER_ITEM",
                message: "must be at least 1 when set".into(),
            });
        }

        Ok(())
    }

    /// Log configuration summary (without sensitive data)
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!("  API:");
        info!("    Listening on: {}:{}", self.api.host, self.api.port);
        info!("    CORS: {} ({:?})", self.api.cors_enabled, self.api.cors_origins);
        info!("  Catalog:");
        info!("    Provider: {}", mask_url(&self.catalog.products_url()));
        info!(
            "    Timeout: {:?}, retries: {}",
            self.catalog.timeout, self.catalog.max_retries
        );
        match self.catalog.refresh_interval {
            Some(every) => info!("    Refresh every: {:?}", every),
            None => info!("    Refresh: disabled"),
        }
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let refresh_secs: u64 = get_env_or("CATALOG_REFRESH_SECS", "0").parse().unwrap_or(0);
        let tags_per_item = parse_optional(
            "CATALOG_TAGS_PER_ITEM",
            std::env::var("CATALOG_TAGS_PER_ITEM").ok().as_deref(),
        );

        Ok(Self {
            base_url: get_env_or("CATALOG_BASE_URL", &defaults.base_url),
            products_path: get_env_or("CATALOG_PRODUCTS_PATH", &defaults.products_path),
            timeout: Duration::from_millis(
                get_env_or("CATALOG_TIMEOUT_MS", "5000")
                    .parse()
                    .unwrap_or(5000),
            ),
            max_retries: get_env_or("CATALOG_MAX_RETRIES", "3").parse().unwrap_or(3),
            retry_delay: Duration::from_millis(
                get_env_or("CATALOG_RETRY_DELAY_MS", "500")
                    .parse()
                    .unwrap_or(500),
            ),
            refresh_interval: (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs)),
            tags_per_item,
        })
    }

    /// Full URL of the product listing
    pub fn products_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.products_path.starts_with('/') {
            format!("{}{}", base, self.products_path)
        } else {
            format!("{}/{}", base, self.products_path)
        }
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            port: get_env_or("API_PORT", "8080").parse().unwrap_or(8080),
            host: get_env_or("API_HOST", "0.0.0.0"),
            request_timeout: Duration::from_secs(
                get_env_or("API_REQUEST_TIMEOUT_SECS", "30")
                    .parse()
                    .unwrap_or(30),
            ),
            cors_enabled: get_env_or("API_CORS_ENABLED", "true")
                .parse()
                .unwrap_or(true),
            cors_origins: get_env_or("API_CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }
}

impl TelemetryConfig {
    fn from_env() -> Result<Self> {
        let log_format = match get_env_or("LOG_FORMAT", "pretty").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            log_format,
            metrics_port: get_env_or("METRICS_PORT", "9000").parse().unwrap_or(9000),
        })
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn load_env_folder(folder: &str) {
    let path = std::path::Path::new(folder);
    if !path.is_dir() {
        warn!("FFOLDER {} is not a directory, ignoring", folder);
        return;
    }

    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("Failed to read FFOLDER {}: {}", folder, err);
            return;
        }
    };

    for entry in entries.flatten() {
        let fpath = entry.path();
        let Ok(fname) = entry.file_name().into_string() else {
            continue;
        };
        if !fpath.is_file() {
            continue;
        }
        if let Ok(contents) = std::fs::read_to_string(&fpath) {
            // Only set env var if not already set in the environment
            if std::env::var(&fname).is_err() {
                std::env::set_var(&fname, contents.trim());
            }
        }
    }
    info!("Loaded configuration from FFOLDER={}", folder);
}

/// Get environment variable with default
fn get_env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional knob; blank or malformed values leave it unset
fn parse_optional<T: std::str::FromStr>(key: &str, raw: Option<&str>) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    let raw = raw.map(str::trim).filter(|v| !v.is_empty())?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring invalid {}={:?}: {}", key, raw, e);
            None
        }
    }
}

/// Mask sensitive parts of URL
pub fn mask_url(url: &str) -> String {
    // Mask password if present
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            // Skip the scheme separator in "http://host@..."
            if url[colon_pos..].starts_with("://") {
                return url.to_string();
            }
            let (before, _) = url.split_at(colon_pos + 1);
            return format!("{}****{}", before, &url[at_pos..]);
        }
    }
    url.to_string()
}
