//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with ETHEARTS_, sections split by `__`)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! Secrets like the database password and S3 credentials should be kept in
//! environment variables, not in the config file. Rusoto reads its credentials
//! from the standard AWS environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Postgres connection string. Empty runs against in-memory storage.
    pub url: String,
    /// Maximum pooled connections
    pub max_connections: u32,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend: "local" or "s3"
    pub backend: String,
    /// Local storage path (used when backend = "local")
    pub local_path: String,
    /// Base of every public resource URL; the bucket and key are appended
    pub public_base_url: String,
    /// Bucket name (a subdirectory of `local_path` for the local backend)
    pub bucket: String,
    /// S3 region (used when backend = "s3")
    pub s3_region: String,
    /// S3 endpoint override for S3-compatible stores; empty uses AWS
    pub s3_endpoint: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "local".to_string(),
            local_path: "./uploads".to_string(),
            public_base_url: "http://localhost:8080/uploads".to_string(),
            bucket: "resources".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_endpoint: String::new(),
        }
    }
}

/// Content limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum size of a single uploaded resource in MB
    pub max_upload_size_mb: u32,
    /// Maximum number of resource files in one upload request
    pub max_files_per_upload: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: 10,
            max_files_per_upload: 10,
        }
    }
}

impl LimitsConfig {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb as usize * 1024 * 1024
    }
}

/// A token accepted without a database, for local development.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticToken {
    pub token: String,
    pub member_id: i32,
    pub roles: Vec<String>,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// How long a resolved token is trusted before it is looked up again
    pub token_cache_seconds: u64,
    /// Tokens registered at startup when running without a database
    pub static_tokens: Vec<StaticToken>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_cache_seconds: 60,
            static_tokens: Vec::new(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // e.g., ETHEARTS_DATABASE__URL, ETHEARTS_STORAGE__BACKEND
            .add_source(
                Environment::with_prefix("ETHEARTS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
