// Config module - file-backed settings plus the runtime option store

mod options;

pub use options::{
    BoolOpt, ConfigStore, IntOpt, Options, StrOpt, SORT_KEYS, UPDATE_MS_MAX, UPDATE_MS_MIN,
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use directories::BaseDirs;

use crate::error::{Result, VitalsError};

const CONFIG_DIR: &str = "vitals";
const MAIN_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub update_ms: u64,
    /// Space separated names of the panels visible at start.
    pub shown_boxes: String,
    pub proc_sorting: String,
    pub proc_reversed: bool,
    pub proc_tree: bool,
    pub proc_per_core: bool,
    pub io_mode: bool,
    pub proc_filter: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            update_ms: 2000,
            shown_boxes: "cpu mem net proc".to_string(),
            proc_sorting: "cpu lazy".to_string(),
            proc_reversed: false,
            proc_tree: false,
            proc_per_core: false,
            io_mode: false,
            proc_filter: String::new(),
        }
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
    app_config: AppConfig,
}

impl ConfigManager {
    /// Loads from `path`, or from the platform config dir when `None`.
    pub fn new(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(VitalsError::ConfigNotFound {
                        path: path.to_path_buf(),
                    });
                }
                path.to_path_buf()
            }
            None => Self::default_path()?,
        };
        Ok(Self::for_path(config_path))
    }

    /// Manager bound to `config_path`, whether or not the file exists yet.
    pub fn for_path(config_path: PathBuf) -> Self {
        let app_config = Self::load_toml_file(&config_path).unwrap_or_default();
        Self {
            config_path,
            app_config,
        }
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join(MAIN_CONFIG_FILE))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn app_config(&self) -> &AppConfig {
        &self.app_config
    }

    pub fn app_config_mut(&mut self) -> &mut AppConfig {
        &mut self.app_config
    }

    fn get_config_dir() -> Result<PathBuf> {
        BaseDirs::new()
            .map(|dirs| dirs.config_dir().join(CONFIG_DIR))
            .ok_or_else(|| VitalsError::Config("Could not determine config directory".to_string()))
    }

    fn load_toml_file<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> Option<T> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Writes the defaults unless a config file already exists.
    pub fn write_default_config(&self) -> Result<()> {
        if self.config_path.exists() {
            return Ok(());
        }
        if let Some(dir) = self.config_path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| VitalsError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(&AppConfig::default())
            .map_err(|e| VitalsError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&self.config_path, content)
            .map_err(|e| VitalsError::Config(format!("Failed to write config: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();
        assert_eq!(config.monitor.update_ms, 2000);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_app_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.monitor.shown_boxes, config.monitor.shown_boxes);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[monitor]\nupdate_ms = 500\nproc_tree = true\n").unwrap();

        let manager = ConfigManager::new(Some(&path)).unwrap();
        assert_eq!(manager.app_config().monitor.update_ms, 500);
        assert!(manager.app_config().monitor.proc_tree);
        assert_eq!(manager.app_config().monitor.proc_sorting, "cpu lazy");
    }

    #[test]
    fn test_unparseable_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        let manager = ConfigManager::new(Some(&path)).unwrap();
        assert_eq!(manager.app_config().monitor.update_ms, 2000);
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigManager::new(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(VitalsError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_write_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let manager = ConfigManager::for_path(path.clone());
        manager.write_default_config().unwrap();
        let written: AppConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.monitor.update_ms, 2000);
    }
}
