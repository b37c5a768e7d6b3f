use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::http::HttpOptions;

/// Global configuration loaded from `~/.config/flush/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlushConfig {
    /// Connection count used when the command line does not give one.
    pub connections: usize,
    /// Default destination folder (None = current directory).
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// TCP/TLS connect timeout in seconds for probe and section requests.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds for the HEAD probe.
    pub probe_timeout_secs: u64,
    /// Whole-transfer timeout in seconds for one section GET.
    pub transfer_timeout_secs: u64,
    /// End the final section at `content_length` instead of `content_length - 1`.
    /// Reproduces the historical partition; off by default.
    #[serde(default)]
    pub legacy_final_section_end: bool,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            connections: 8,
            download_dir: None,
            connect_timeout_secs: 30,
            probe_timeout_secs: 30,
            transfer_timeout_secs: 3600,
            legacy_final_section_end: false,
        }
    }
}

impl FlushConfig {
    /// HTTP timeouts shared by the probe and every section fetcher.
    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
            transfer_timeout: Duration::from_secs(self.transfer_timeout_secs),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("flush")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FlushConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FlushConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)
            .with_context(|| format!("failed to write default config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let cfg: FlushConfig = toml::from_str(&data)
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}
