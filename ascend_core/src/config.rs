//! Configuration file support for Ascend.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/ascend/config.toml`.

use crate::analytics::MAX_WINDOW_DAYS;
use crate::metabolic::DYNAMIC_TDEE_WINDOW_DAYS;
use crate::snapshot::EngineOptions;
use crate::{CalorieStrategy, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub metabolic: MetabolicConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Fallbacks for profile fields that are left unset
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetabolicConfig {
    #[serde(default = "default_dynamic_tdee_window_days")]
    pub dynamic_tdee_window_days: usize,

    #[serde(default)]
    pub calorie_strategy: CalorieStrategy,
}

impl Default for MetabolicConfig {
    fn default() -> Self {
        Self {
            dynamic_tdee_window_days: default_dynamic_tdee_window_days(),
            calorie_strategy: CalorieStrategy::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_window_days")]
    pub default_window_days: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_window_days: default_window_days(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("ascend")
}

fn default_dynamic_tdee_window_days() -> usize {
    DYNAMIC_TDEE_WINDOW_DAYS
}

fn default_window_days() -> usize {
    7
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.metabolic.dynamic_tdee_window_days == 0 {
            return Err(Error::Config(
                "metabolic.dynamic_tdee_window_days must be at least 1".into(),
            ));
        }
        if self.analytics.default_window_days == 0 {
            return Err(Error::Config(
                "analytics.default_window_days must be at least 1".into(),
            ));
        }
        if self.analytics.default_window_days > MAX_WINDOW_DAYS {
            return Err(Error::Config(format!(
                "analytics.default_window_days must be at most {}",
                MAX_WINDOW_DAYS
            )));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("ascend").join("config.toml")
    }

    /// Engine fallbacks derived from this configuration
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            dynamic_tdee_window_days: self.metabolic.dynamic_tdee_window_days,
            calorie_strategy: self.metabolic.calorie_strategy,
        }
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }
}
