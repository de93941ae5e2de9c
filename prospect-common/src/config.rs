//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "PROSPECT_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "prospect.db";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Path to SQLite database file (defaults to `<root>/prospect.db`)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Root folder for data files
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Capacity of the statistics sync queue
    ///
    /// Notifications beyond this are dropped and repaired by the next
    /// recalculation.
    #[serde(default = "default_sync_queue_capacity")]
    pub sync_queue_capacity: usize,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_sync_queue_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse configuration text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;

        if config.sync_queue_capacity == 0 {
            return Err(Error::Config("sync_queue_capacity must be at least 1".to_string()));
        }

        Ok(config)
    }

    /// Load configuration from `path`
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged. A file that exists but does not parse is a `Config` error.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file not found at {}, using defaults", path.display());
                Ok(Self::with_defaults())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Configuration with every field at its default
    pub fn with_defaults() -> Self {
        Self {
            database_path: None,
            root_folder: None,
            sync_queue_capacity: default_sync_queue_capacity(),
            logging: LoggingConfig::default(),
        }
    }

    /// Database path: explicit `database_path`, else `<root>/prospect.db`
    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| root_folder.join(DATABASE_FILE_NAME))
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("prospect").join("config.toml"))
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("prospect"))
        .unwrap_or_else(|| PathBuf::from("./prospect_data"))
}
