use orbit_backend::config::{OrbitConfig, read_config_file};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Logging, index and storage settings shared with the ingestion tool
    #[serde(flatten)]
    pub core: OrbitConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to bind the server to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether to bind to all interfaces (0.0.0.0) or just localhost
    #[serde(default = "default_bind_all")]
    pub bind_all: bool,

    /// Allow cross-origin requests from any origin
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

fn default_port() -> u16 {
    3040
}

fn default_bind_all() -> bool {
    true
}

fn default_enable_cors() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_all: default_bind_all(),
            enable_cors: default_enable_cors(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> SocketAddr {
        let ip = if self.bind_all { [0, 0, 0, 0] } else { [127, 0, 0, 1] };
        SocketAddr::from((ip, self.port))
    }
}

impl ApiConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let mut config: ApiConfig = read_config_file(path)?;
        config.core.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }
}
