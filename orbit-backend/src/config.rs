use anyhow::Context;
use clap::Args;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "ORBIT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbitConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Location of the orbit record table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Table identifier; the table lives at `<data_dir>/<table_name>.json`
    #[serde(default = "default_table_name")]
    pub table_name: String,
}

/// Where orbit files are downloaded from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub bucket_name: Option<String>,

    #[serde(default = "default_region")]
    pub region: String,

    /// Explicit URL prefix, takes precedence over the bucket
    #[serde(default)]
    pub url_root: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_table_name() -> String {
    "orbit-records".to_string()
}

fn default_region() -> String {
    "us-west-2".to_string()
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            index: IndexConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            table_name: default_table_name(),
        }
    }
}

impl IndexConfig {
    pub fn table_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(format!("{}.json", self.table_name))
    }
}

impl StorageConfig {
    /// URL prefix for synthesized download links, if one can be derived
    pub fn storage_root(&self) -> Option<String> {
        if let Some(root) = self.url_root.as_deref().filter(|r| !r.is_empty()) {
            return Some(root.trim_end_matches('/').to_string());
        }
        self.bucket_name
            .as_deref()
            .filter(|b| !b.is_empty())
            .map(|bucket| format!("https://{}.s3.{}.amazonaws.com", bucket, self.region))
    }
}

impl OrbitConfig {
    /// Apply the deployment environment on top of the file values.
    ///
    /// `TABLE_NAME`, `BUCKET_NAME` and `LOG_LEVEL` are honoured.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(table_name) = lookup("TABLE_NAME") {
            self.index.table_name = table_name;
        }
        if let Some(bucket_name) = lookup("BUCKET_NAME") {
            self.storage.bucket_name = Some(bucket_name);
        }
        if let Some(log_level) = lookup("LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    /// Load from `path` (defaults when the file is absent) plus the process environment.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let mut config: OrbitConfig = read_config_file(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }
}

/// Command line arguments shared by every binary
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Configuration file path
    #[arg(long, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

/// Parse a TOML config file. A missing file yields `T::default()`.
pub fn read_config_file<T: DeserializeOwned + Default>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
    Ok(config)
}
