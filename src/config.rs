use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::reveal::{DEFAULT_PAGE_SIZE, DEFAULT_REVEAL_LATENCY};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub session: SessionConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub reveal: RevealConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  pub url: String,
  /// Per-request timeout; a timeout surfaces as a failed fetch
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
  15
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
  /// User id to sign in as on startup
  pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
  /// Records survive restarts in a SQLite file
  #[default]
  Sqlite,
  /// Records live for the lifetime of the process
  Memory,
  /// Nothing is cached; every read goes to the network
  Off,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  #[serde(default)]
  pub mode: CacheMode,
  /// SQLite file location (defaults to $XDG_DATA_HOME/shopsync/cache.db)
  pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevealConfig {
  /// Items released per reveal step
  #[serde(default = "default_page_size")]
  pub page_size: usize,
  /// Synthetic delay before a reveal step is committed
  #[serde(default = "default_latency_ms")]
  pub latency_ms: u64,
}

fn default_page_size() -> usize {
  DEFAULT_PAGE_SIZE
}

fn default_latency_ms() -> u64 {
  DEFAULT_REVEAL_LATENCY.as_millis() as u64
}

impl Default for RevealConfig {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
      latency_ms: default_latency_ms(),
    }
  }
}

impl RevealConfig {
  pub fn latency(&self) -> Duration {
    Duration::from_millis(self.latency_ms)
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./shopsync.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/shopsync/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/shopsync/config.yaml\n\
                 with at least an `api.url` entry."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("shopsync.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("shopsync").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }

  /// Get the API bearer token from environment variables.
  ///
  /// Checks SHOPSYNC_API_TOKEN first, then MARKET_API_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("SHOPSYNC_API_TOKEN")
      .or_else(|_| std::env::var("MARKET_API_TOKEN"))
      .map_err(|_| {
        eyre!("API token not found. Set SHOPSYNC_API_TOKEN or MARKET_API_TOKEN environment variable.")
      })
  }

  /// Directory holding the cache database and log files.
  pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("shopsync"))
  }
}
