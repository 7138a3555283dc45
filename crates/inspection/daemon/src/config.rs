//! Configuration for inspection-daemon

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Evidence blob configuration
    #[serde(default)]
    pub evidence: EvidenceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// First admin account, created only when the user catalog is empty
    #[serde(default)]
    pub bootstrap: Option<BootstrapConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
            request_timeout_secs: default_request_timeout(),
            max_body_size: default_max_body_size(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    #[default]
    Memory,

    /// PostgreSQL storage
    Postgres {
        /// Connection URL
        url: String,

        /// Maximum connections in pool
        #[serde(default = "default_pool_size")]
        max_connections: u32,

        /// Connection timeout in seconds
        #[serde(default = "default_connection_timeout")]
        connect_timeout_secs: u64,
    },
}

/// Where evidence files live and how large they may be
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceConfig {
    /// Root directory for photos and signatures
    #[serde(default = "default_evidence_root")]
    pub root_dir: PathBuf,

    /// Largest accepted single upload in bytes
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            root_dir: default_evidence_root(),
            max_upload_bytes: default_max_upload(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default = "default_admin_name")]
    pub name: String,
    pub email: String,
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8080))
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    // room for a batch of photos plus multipart framing
    64 * 1024 * 1024
}

fn default_pool_size() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_evidence_root() -> PathBuf {
    PathBuf::from("./storage/evidence")
}

fn default_max_upload() -> usize {
    inspection_engine::DEFAULT_MAX_UPLOAD_BYTES
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_admin_name() -> String {
    "Administrador".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `INSPECTION_`-prefixed environment variables
    ///
    /// Nested keys use a double underscore, e.g.
    /// `INSPECTION_SERVER__LISTEN_ADDR`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("INSPECTION")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Engine settings derived from this configuration
    pub fn engine(&self) -> inspection_engine::EngineConfig {
        inspection_engine::EngineConfig {
            max_upload_bytes: self.evidence.max_upload_bytes,
        }
    }
}
