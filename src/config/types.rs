// Configuration types module
// Defines the configuration sections and their serde mappings

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub assets: AssetsConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Tokio worker threads; defaults to the CPU count when unset.
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Asset root configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AssetsConfig {
    /// Directory all served files are resolved under.
    pub root: String,
    /// Resource substituted for a request to `/`.
    pub index_file: String,
    /// Extension of the on-disk sources behind `.js` requests.
    pub source_extension: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log file path (stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}
