use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DATA_FILE_NAME: &str = "scriby-data.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// User settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The workspace JSON file
    pub data_path: PathBuf,
    pub autosave_delay_ms: u64,
    pub saving_indicator_ms: u64,
    pub toast_ms: u64,
    /// Where exported Markdown goes; the data file's directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: Self::default_data_path(),
            autosave_delay_ms: 400,
            saving_indicator_ms: 600,
            toast_ms: 2000,
            export_dir: None,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded paths
        config.data_path = Self::expand_path(&config.data_path).unwrap_or(config.data_path);
        config.export_dir = config
            .export_dir
            .map(|dir| Self::expand_path(&dir).unwrap_or(dir));

        log::debug!("Loaded config from {}", config_path.display());
        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/scriby");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn default_data_path() -> PathBuf {
        let data_dir = shellexpand::tilde("~/.local/share/scriby");
        PathBuf::from(data_dir.as_ref()).join(DATA_FILE_NAME)
    }

    /// Directory for exported pages
    pub fn export_dir(&self) -> PathBuf {
        match (&self.export_dir, self.data_path.parent()) {
            (Some(dir), _) => dir.clone(),
            (None, Some(parent)) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            (None, _) => PathBuf::from("."),
        }
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    pub fn saving_indicator(&self) -> Duration {
        Duration::from_millis(self.saving_indicator_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
