use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::release::origin::Mirrors;

// =============================================================================
// Network constants
// =============================================================================

/// Shared deadline for one probing race in milliseconds
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 1500;

/// Connect timeout for artifact downloads in milliseconds (30 seconds)
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_PRIMARY_MIRROR: &str = "https://repo.pigsty.io";
pub const DEFAULT_SECONDARY_MIRROR: &str = "https://repo.pigsty.cc";

/// General external target used to tell "no internet" from "restricted region"
pub const DEFAULT_REACHABILITY_URL: &str = "https://www.google.com";

pub const USER_AGENT: &str = concat!("relfetch/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Release defaults
// =============================================================================

pub const DEFAULT_PRODUCT: &str = "pigsty";

/// Latest stable version assumed when no catalog has been fetched
pub const DEFAULT_LATEST_VERSION: &str = "v4.0.0";

/// Oldest version shown by catalog listings unless asked otherwise
pub const DEFAULT_LIST_SINCE: &str = "v3.0.0";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Resolver configuration
///
/// Every field falls back to the compiled defaults, which double as the
/// offline dataset used before any mirror has been reached.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub product: String,
    pub mirrors: MirrorsConfig,
    pub reachability_url: String,
    pub probe: ProbeConfig,
    pub download: DownloadConfig,
    pub default_latest_version: String,
    pub list_since: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            product: DEFAULT_PRODUCT.to_string(),
            mirrors: MirrorsConfig::default(),
            reachability_url: DEFAULT_REACHABILITY_URL.to_string(),
            probe: ProbeConfig::default(),
            download: DownloadConfig::default(),
            default_latest_version: DEFAULT_LATEST_VERSION.to_string(),
            list_since: DEFAULT_LIST_SINCE.to_string(),
        }
    }
}

/// Mirror base URLs in priority order
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MirrorsConfig {
    pub primary: String,
    pub secondary: String,
}

impl Default for MirrorsConfig {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY_MIRROR.to_string(),
            secondary: DEFAULT_SECONDARY_MIRROR.to_string(),
        }
    }
}

impl From<&MirrorsConfig> for Mirrors {
    fn from(config: &MirrorsConfig) -> Self {
        Mirrors {
            primary: config.primary.trim_end_matches('/').to_string(),
            secondary: config.secondary.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProbeConfig {
    /// Shared probing deadline in milliseconds
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DownloadConfig {
    pub connect_timeout_ms: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Loads the configuration
    ///
    /// An explicit `path` must exist. Without one, the default config file is
    /// used when present and the compiled defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = config_path();
                if path.is_file() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Returns the path to the data directory for relfetch.
/// Uses $XDG_DATA_HOME/relfetch if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/relfetch,
/// or ./relfetch if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("relfetch.log")
}

/// Returns the path to the default config file.
pub fn config_path() -> PathBuf {
    config_path_with_env(std::env::var("XDG_CONFIG_HOME").ok(), dirs::home_dir())
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("relfetch")
}

fn config_path_with_env(xdg_config_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let config_dir = xdg_config_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));

    config_dir.join("relfetch").join("config.json")
}
