use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default listen address: port 8080 on all interfaces.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Global configuration loaded from `~/.config/wiki/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Directory holding `<title>.txt` page files (None = current directory).
    #[serde(default)]
    pub pages_dir: Option<PathBuf>,
    /// Directory holding `edit.html` and `view.html` (None = current directory).
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            pages_dir: None,
            templates_dir: None,
        }
    }
}

impl WikiConfig {
    pub fn pages_dir(&self) -> PathBuf {
        self.pages_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.templates_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("wiki")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<WikiConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = WikiConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: WikiConfig = toml::from_str(&data)?;
    Ok(cfg)
}
