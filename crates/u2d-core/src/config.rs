use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::chunk::{CHUNK_GRANULARITY, DEFAULT_CHUNK_SIZE};
use crate::http::HttpOptions;
use crate::relay::RelayOptions;
use crate::upload::{UploadApi, DEFAULT_INIT_ENDPOINT};

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per stage (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/u2d/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct U2dConfig {
    /// Resumable upload creation endpoint.
    pub upload_endpoint: String,
    /// Bytes per chunk PUT; a non-zero multiple of 256 KiB.
    pub chunk_size: u64,
    /// Keep the fetched local copy after a successful relay.
    #[serde(default)]
    pub keep_local: bool,
    /// Where fetched files land (None = system temp dir).
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Authorized-user JSON file holding the access token.
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    /// Connect timeout in seconds (None = libcurl default).
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for U2dConfig {
    fn default() -> Self {
        Self {
            upload_endpoint: DEFAULT_INIT_ENDPOINT.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            keep_local: false,
            download_dir: None,
            token_file: None,
            connect_timeout_secs: None,
            retry: None,
        }
    }
}

impl U2dConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size % CHUNK_GRANULARITY != 0 {
            bail!(
                "chunk_size must be a non-zero multiple of {} bytes, got {}",
                CHUNK_GRANULARITY,
                self.chunk_size
            );
        }
        if self.chunk_size > u64::from(u32::MAX) {
            bail!("chunk_size {} is too large", self.chunk_size);
        }
        url::Url::parse(&self.upload_endpoint)
            .with_context(|| format!("invalid upload_endpoint {:?}", self.upload_endpoint))?;
        Ok(())
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn relay_options(&self) -> RelayOptions {
        let http = self.http_options();
        RelayOptions {
            api: UploadApi::new(self.upload_endpoint.clone()).http_options(http),
            chunk_size: self.chunk_size,
            download_dir: self.download_dir.clone(),
            http,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("u2d")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<U2dConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = U2dConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: U2dConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
