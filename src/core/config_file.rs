//! User configuration file handling
//!
//! Manages settings from ~/.config/bezy-project/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_CPS_FILE: &str = "global.cps";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_WATCH_DEBOUNCE_MS: u64 = 100;

/// User configuration from ~/.config/bezy-project/settings.json
///
/// These settings override built-in defaults but are overridden by CLI arguments
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ConfigFile {
    /// Rule file new masters use when `--cps` is not given
    pub default_cps_file: Option<String>,
    /// Log filter used when `RUST_LOG` is unset (e.g. "info", "debug")
    pub log_level: Option<String>,
    /// Also write logs to the daily file in the logs directory
    pub log_to_file: Option<bool>,
    /// Quiet period before a changed rule file is reported again
    pub watch_debounce_ms: Option<u64>,
}

impl ConfigFile {
    /// Get the path to the bezy-project config directory
    pub fn config_dir() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));
        config_dir.join("bezy-project")
    }

    /// Get the path to the user config file
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Load configuration from the user config file
    pub fn load() -> Option<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    debug!("Loaded user settings from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    warn!("Failed to parse settings.json: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read settings.json: {}", e);
                None
            }
        }
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;

        debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Settings written by `new-config`
    pub fn example() -> Self {
        Self {
            default_cps_file: Some(DEFAULT_CPS_FILE.to_string()),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
            log_to_file: Some(false),
            watch_debounce_ms: Some(DEFAULT_WATCH_DEBOUNCE_MS),
        }
    }

    pub fn default_cps_file(&self) -> &str {
        self.default_cps_file.as_deref().unwrap_or(DEFAULT_CPS_FILE)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_to_file(&self) -> bool {
        self.log_to_file.unwrap_or(false)
    }

    pub fn watch_debounce_ms(&self) -> u64 {
        self.watch_debounce_ms.unwrap_or(DEFAULT_WATCH_DEBOUNCE_MS)
    }

    /// Initialize the user configuration directory
    ///
    /// This creates:
    /// 1. The ~/.config/bezy-project directory
    /// 2. A logs/ directory
    /// 3. A settings.json file with default values
    pub fn initialize_config_directory() -> anyhow::Result<()> {
        let config_dir = Self::config_dir();
        fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {:?}", config_dir);

        let logs_dir = config_dir.join("logs");
        fs::create_dir_all(&logs_dir)?;
        println!("Created logs directory: {:?}", logs_dir);

        let settings_path = Self::config_path();
        if !settings_path.exists() {
            Self::example().save_to(&settings_path)?;
            println!("Created settings file: {:?}", settings_path);
        } else {
            println!("Settings file already exists: {:?}", settings_path);
        }

        println!("\nConfiguration initialized successfully!");
        println!("  - Edit settings at: {:?}", settings_path);
        println!("  - View application logs in: {:?}", logs_dir);
        Ok(())
    }
}
