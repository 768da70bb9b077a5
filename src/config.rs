//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `STACDASH_*` environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetch::{HttpTransportConfig, DEFAULT_PAGE_LIMIT};
use crate::index::MalformedPolicy;
use crate::snapshot::{OnFetchFailure, SnapshotOptions, DEFAULT_COLLECTION_ID};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub stac: StacConfig,

    #[serde(default)]
    pub snapshot: SnapshotConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream catalog API
#[derive(Debug, Clone, Deserialize)]
pub struct StacConfig {
    #[serde(default = "default_stac_api_url")]
    pub api_url: String,

    /// Page size appended to URLs without a `limit`
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    #[serde(default = "default_stac_timeout")]
    pub request_timeout_secs: u64,

    pub user_agent: Option<String>,
}

fn default_stac_api_url() -> String {
    "https://earth.gov/ghgcenter/api/stac".to_string()
}

fn default_page_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

fn default_stac_timeout() -> u64 {
    120
}

impl Default for StacConfig {
    fn default() -> Self {
        Self {
            api_url: default_stac_api_url(),
            page_limit: default_page_limit(),
            request_timeout_secs: default_stac_timeout(),
            user_agent: None,
        }
    }
}

impl StacConfig {
    pub fn transport_config(&self) -> HttpTransportConfig {
        let mut transport = HttpTransportConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..Default::default()
        };
        if let Some(ua) = &self.user_agent {
            transport.user_agent = ua.clone();
        }
        transport
    }
}

/// Snapshot batch job
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Base of the envelope `self` link; the API URL when unset
    pub self_link_base: Option<String>,

    #[serde(default)]
    pub on_failure: OnFetchFailure,

    /// Collections snapshotted when none is given on the command line
    #[serde(default = "default_collections")]
    pub collections: Vec<String>,
}

fn default_output_dir() -> String {
    "./public".to_string()
}

fn default_collections() -> Vec<String> {
    vec![DEFAULT_COLLECTION_ID.to_string()]
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            self_link_base: None,
            on_failure: OnFetchFailure::default(),
            collections: default_collections(),
        }
    }
}

/// In-memory index data sources
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    /// Snapshot artifact to index
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,

    /// JSON array of target metadata records
    pub metadata_path: Option<String>,

    /// Fill gaps in the metadata file from item properties
    #[serde(default = "default_harvest_metadata")]
    pub harvest_metadata: bool,

    #[serde(default)]
    pub malformed: MalformedPolicy,

    /// Coverage footprints (GeoJSON)
    pub coverage_path: Option<String>,

    /// Snapshot of a plume collection to join with plume metadata
    pub plume_snapshot_path: Option<String>,

    /// Plume metadata feature collection (GeoJSON)
    pub plume_metadata_path: Option<String>,
}

fn default_snapshot_path() -> String {
    format!("./public/{}.json", DEFAULT_COLLECTION_ID)
}

fn default_harvest_metadata() -> bool {
    true
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            metadata_path: None,
            harvest_metadata: default_harvest_metadata(),
            malformed: MalformedPolicy::default(),
            coverage_path: None,
            plume_snapshot_path: None,
            plume_metadata_path: None,
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8083
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "stacdash=info".to_string()
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

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }

    /// Install the global subscriber, writing to stderr
    ///
    /// `RUST_LOG` overrides `level` when set.
    pub fn init_subscriber(&self) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.level));
        let registry = tracing_subscriber::registry().with(filter);

        if self.is_json() {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
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
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("stacdash").join("config.toml")),
            Some(PathBuf::from("/etc/stacdash/config.toml")),
            Some(PathBuf::from("./stacdash.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Load an explicit file if given, the default locations otherwise
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_with_env(path),
            None => Ok(Self::load_default()),
        }
    }

    /// Options for the snapshot builder
    pub fn snapshot_options(&self) -> SnapshotOptions {
        SnapshotOptions {
            stac_api_url: self.stac.api_url.clone(),
            self_link_base: self
                .snapshot
                .self_link_base
                .clone()
                .unwrap_or_else(|| self.stac.api_url.clone()),
            output_dir: PathBuf::from(&self.snapshot.output_dir),
            on_failure: self.snapshot.on_failure,
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any `STACDASH_*` lookup
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Upstream
        if let Some(url) = var("STACDASH_STAC_API_URL") {
            self.stac.api_url = url;
        }
        if let Some(limit) = var("STACDASH_PAGE_LIMIT").and_then(|s| s.parse().ok()) {
            self.stac.page_limit = limit;
        }

        // Snapshot
        if let Some(dir) = var("STACDASH_OUTPUT_DIR") {
            self.snapshot.output_dir = dir;
        }
        if let Some(base) = var("STACDASH_SELF_LINK_BASE") {
            self.snapshot.self_link_base = Some(base);
        }
        if let Some(policy) = var("STACDASH_ON_FAILURE").and_then(|s| s.parse().ok()) {
            self.snapshot.on_failure = policy;
        }

        // Index
        if let Some(path) = var("STACDASH_SNAPSHOT_PATH") {
            self.index.snapshot_path = path;
        }
        if let Some(path) = var("STACDASH_METADATA_PATH") {
            self.index.metadata_path = Some(path);
        }
        if let Some(path) = var("STACDASH_COVERAGE_PATH") {
            self.index.coverage_path = Some(path);
        }
        if let Some(path) = var("STACDASH_PLUME_SNAPSHOT_PATH") {
            self.index.plume_snapshot_path = Some(path);
        }
        if let Some(path) = var("STACDASH_PLUME_METADATA_PATH") {
            self.index.plume_metadata_path = Some(path);
        }

        // API
        if let Some(host) = var("STACDASH_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("STACDASH_API_PORT").and_then(|s| s.parse().ok()) {
            self.api.port = port;
        }

        // Logging
        if let Some(level) = var("STACDASH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("STACDASH_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# stacdash Configuration
#
# Environment variables override these settings:
# - STACDASH_STAC_API_URL
# - STACDASH_PAGE_LIMIT
# - STACDASH_OUTPUT_DIR
# - STACDASH_SELF_LINK_BASE
# - STACDASH_ON_FAILURE
# - STACDASH_SNAPSHOT_PATH
# - STACDASH_METADATA_PATH
# - STACDASH_COVERAGE_PATH
# - STACDASH_PLUME_SNAPSHOT_PATH
# - STACDASH_PLUME_METADATA_PATH
# - STACDASH_API_HOST
# - STACDASH_API_PORT
# - STACDASH_LOG_LEVEL
# - STACDASH_LOG_FORMAT

[stac]
# Catalog API base URL
api_url = "https://earth.gov/ghgcenter/api/stac"

# Page size requested when a URL has no limit
page_limit = 10000

# Per-request timeout in seconds
request_timeout_secs = 120

# user_agent = "stacdash/0.1"

[snapshot]
# Directory receiving <collection_id>.json
output_dir = "./public"

# Base URL of the envelope self link (defaults to stac.api_url)
# self_link_base = "https://staging.openveda.cloud/api/stac"

# On fetch failure: "abort" (exit non-zero, write nothing) or "write-empty"
on_failure = "abort"

# Collections snapshotted when none is given on the command line
collections = ["oco3-co2-sams-daygrid-v11r"]

[index]
# Snapshot artifact to index
snapshot_path = "./public/oco3-co2-sams-daygrid-v11r.json"

# Target metadata side file (JSON array)
# metadata_path = "./public/targets.json"

# Take missing metadata from item properties
harvest_metadata = true

# Observations with unparsable ids: "skip" or "abort"
malformed = "skip"

# Coverage footprints (GeoJSON)
# coverage_path = "./public/oco3-coverage.json"

# Plume collection snapshot, joined with the plume metadata by item id
# plume_snapshot_path = "./public/emit-ch4plume-v1.json"
# plume_metadata_path = "./public/methane_metadata.json"

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8083

# Allowed CORS origins
cors_origins = ["http://localhost:3000", "http://127.0.0.1:3000"]

# Request timeout in seconds
request_timeout_secs = 30

[logging]
# Filter directive, e.g. "stacdash=debug,tower_http=info"
level = "stacdash=info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
