//! Application configuration for scriptwatch.
//!
//! User config lives at `~/.scriptwatch/scriptwatch.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScriptwatchError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "scriptwatch.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".scriptwatch";

// ---------------------------------------------------------------------------
// Config structs (matching scriptwatch.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP API server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Record store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outbound fetch settings.
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP API binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".into()
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the libSQL database file.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    dirs::home_dir()
        .map(|home| {
            home.join(CONFIG_DIR_NAME)
                .join("scriptwatch.db")
                .to_string_lossy()
                .into_owned()
        })
        .unwrap_or_else(|| "scriptwatch.db".into())
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds for outbound content fetches.
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of redirects to follow per fetch.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
            max_redirects: default_max_redirects(),
        }
    }
}

fn default_fetch_timeout_secs() -> u64 {
    10
}
fn default_max_redirects() -> usize {
    5
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.scriptwatch/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ScriptwatchError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.scriptwatch/scriptwatch.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ScriptwatchError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ScriptwatchError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ScriptwatchError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ScriptwatchError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ScriptwatchError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
