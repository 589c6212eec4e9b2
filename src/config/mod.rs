//! Configuration management for the remote client
//!
//! This module handles application configuration including:
//! - Loading and saving configuration files
//! - Managing configuration directory
//! - Providing sensible defaults
//! - Configuration validation

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const CONFIG_FILE_NAME: &str = "config.toml";

const DEFAULT_DIRECTORY_API_BASE_URL: &str = "https://www.googleapis.com/chromoting/v1";
const DEFAULT_APP_REMOTING_API_BASE_URL: &str = "https://www.googleapis.com/appremoting/v1beta1";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Host directory lookup configuration
    pub directory: DirectorySettings,

    /// App remoting (hosted application) configuration
    pub app_remoting: AppRemotingSettings,
}

/// Host directory lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySettings {
    /// Base URL of the directory REST API
    pub api_base_url: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

/// App remoting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppRemotingSettings {
    /// Base URL of the app remoting REST API
    pub api_base_url: String,

    /// Identifier of the hosted application to run
    pub application_id: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            directory: DirectorySettings::default(),
            app_remoting: AppRemotingSettings::default(),
        }
    }
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_DIRECTORY_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Default for AppRemotingSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_APP_REMOTING_API_BASE_URL.to_string(),
            application_id: String::new(),
        }
    }
}

/// Configuration manager
pub struct ConfigManager {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigManager {
    /// Creates a new ConfigManager
    ///
    /// # Errors
    ///
    /// Returns error if project directory cannot be determined
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::get_config_directory()?;
        Ok(Self::with_directory(config_dir))
    }

    /// Creates a ConfigManager rooted at a specific directory
    ///
    /// Mainly useful for tests and portable installations.
    pub fn with_directory(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join(CONFIG_FILE_NAME);
        Self {
            config_dir,
            config_file,
        }
    }

    /// Gets the configuration directory path
    fn get_config_directory() -> ConfigResult<PathBuf> {
        ProjectDirs::from("com", "remoteclient", "RemoteClient")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| {
                ConfigError::DirectoryNotFound(
                    "Could not determine configuration directory".to_string(),
                )
            })
    }

    /// Ensures the configuration directory exists
    fn ensure_config_directory(&self) -> ConfigResult<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir).map_err(|e| {
                ConfigError::DirectoryCreationFailed(format!(
                    "Failed to create config directory at {:?}: {}",
                    self.config_dir, e
                ))
            })?;
        }
        Ok(())
    }

    /// Loads configuration from file, or creates default if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns error if configuration cannot be loaded or created
    pub fn load_or_create_default(&self) -> ConfigResult<Settings> {
        self.ensure_config_directory()?;

        if self.config_file.exists() {
            self.load()
        } else {
            let settings = Settings::default();
            self.save(&settings)?;
            Ok(settings)
        }
    }

    /// Loads configuration from file
    fn load(&self) -> ConfigResult<Settings> {
        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let settings: Settings = toml::from_str(&content)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to parse config file: {}", e)))?;

        self.validate(&settings)?;

        Ok(settings)
    }

    /// Saves configuration to file
    ///
    /// # Errors
    ///
    /// Returns error if configuration cannot be saved
    pub fn save(&self, settings: &Settings) -> ConfigResult<()> {
        self.ensure_config_directory()?;
        self.validate(settings)?;

        let content = toml::to_string_pretty(settings)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        fs::write(&self.config_file, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validates configuration values
    fn validate(&self, settings: &Settings) -> ConfigResult<()> {
        for url in [
            &settings.directory.api_base_url,
            &settings.app_remoting.api_base_url,
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue(format!(
                    "API base URL must be an http(s) URL: {}",
                    url
                )));
            }
            if url.ends_with('/') {
                return Err(ConfigError::InvalidValue(format!(
                    "API base URL must not end with a slash: {}",
                    url
                )));
            }
        }

        if settings.directory.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }

        Ok(())
    }

    /// Gets the configuration directory path
    pub fn config_directory(&self) -> &PathBuf {
        &self.config_dir
    }
}
