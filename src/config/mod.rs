// Configuration module entry point
// Layers an optional config file over environment variables over defaults

mod types;

use std::net::SocketAddr;

pub use types::{AssetsConfig, Config, LoggingConfig, ServerConfig};

impl Config {
    /// Load configuration from `config.toml` next to the binary.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from the specified file path (without
    /// extension). The file is optional; defaults reproduce the fixed
    /// out-of-the-box behavior (port 8000, assets under `client/`).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("DEVSERVE"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("assets.root", "client")?
            .set_default("assets.index_file", "index.html")?
            .set_default("assets.source_extension", "ts")?
            .set_default("logging.access_log", true)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
