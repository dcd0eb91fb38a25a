//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::CoreError;
use crate::Result;

const CONFIG_FILE: &str = "config.json";
const DEFAULT_REMOTE_URL: &str = "https://jsonplaceholder.typicode.com/posts";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Endpoint serving and accepting quotes
    pub remote_url: String,
    /// Remote records kept per fetch
    pub remote_limit: usize,
    /// Seconds between periodic syncs
    pub sync_interval_secs: u64,
    /// Per-request timeout for the remote
    pub request_timeout_secs: u64,
    /// Largest quote snapshot durable storage accepts; `None` means unbounded
    pub storage_quota_bytes: Option<usize>,
}

/// Overrides read from `config.json`; anything absent keeps its default.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    remote_url: Option<String>,
    remote_limit: Option<usize>,
    sync_interval_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    storage_quota_bytes: Option<usize>,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("quotebox.db"),
            remote_url: DEFAULT_REMOTE_URL.to_string(),
            remote_limit: quotebox_remote::DEFAULT_LIMIT,
            sync_interval_secs: 60,
            request_timeout_secs: 10,
            storage_quota_bytes: Some(5 * 1024 * 1024),
        }
    }

    /// Defaults for `data_dir`, overridden by `config.json` inside it when present.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let mut config = Self::new(data_dir.to_path_buf());
        let path = data_dir.join(CONFIG_FILE);

        if !path.exists() {
            return Ok(config);
        }

        let raw = std::fs::read_to_string(&path)?;
        let file: ConfigFile = serde_json::from_str(&raw)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;

        if let Some(p) = file.database_path {
            config.database_path = if p.is_relative() { data_dir.join(p) } else { p };
        }
        if let Some(url) = file.remote_url {
            config.remote_url = url;
        }
        if let Some(limit) = file.remote_limit {
            config.remote_limit = limit;
        }
        if let Some(secs) = file.sync_interval_secs {
            config.sync_interval_secs = secs;
        }
        if let Some(secs) = file.request_timeout_secs {
            config.request_timeout_secs = secs;
        }
        if file.storage_quota_bytes.is_some() {
            config.storage_quota_bytes = file.storage_quota_bytes;
        }

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration file");

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sync_interval_secs == 0 {
            return Err(CoreError::Config(
                "sync_interval_secs must be at least 1".into(),
            ));
        }
        self.parsed_remote_url()?;
        Ok(())
    }

    pub fn parsed_remote_url(&self) -> Result<Url> {
        let url = Url::parse(&self.remote_url)
            .map_err(|e| CoreError::Config(format!("invalid remote_url {}: {e}", self.remote_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::Config(format!(
                "remote_url must be http or https, got {url}"
            )));
        }
        Ok(url)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("quotebox"))
            .unwrap_or_else(|| PathBuf::from(".quotebox"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
