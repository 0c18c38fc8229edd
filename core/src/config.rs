//! Application configuration
//!
//! Re-exports the shared config types from cadence-types and adds
//! validation and persistence: explicit TOML files for tests and scripted
//! runs, and confy for the per-user config of the CLI.

use std::path::Path;

pub use cadence_types::{AppConfig, DriverConfig, RegistryConfig};

use crate::error::ConfigError;

/// Application name used for the confy config location
pub const APP_NAME: &str = "cadence";

/// Config file stem used with confy
pub const CONFIG_NAME: &str = "config";

/// Range checks for values serde cannot express
pub trait Validate {
    fn validate(&self) -> Result<(), ConfigError>;
}

impl Validate for RegistryConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.tie_break_threshold_secs;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "registry.tie_break_threshold_secs",
                reason: format!("expected a finite value >= 0, got {threshold}"),
            });
        }
        Ok(())
    }
}

impl Validate for DriverConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.frames_per_second == 0 {
            return Err(ConfigError::InvalidValue {
                field: "driver.frames_per_second",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "driver.time_scale",
                reason: format!("expected a finite value >= 0, got {}", self.time_scale),
            });
        }
        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.registry.validate()?;
        self.driver.validate()
    }
}

/// Extension trait for AppConfig persistence
pub trait AppConfigExt: Sized {
    /// Load the per-user config, falling back to defaults if it is missing
    /// or unreadable
    fn load() -> Self;

    /// Store the per-user config
    fn save(&self) -> Result<(), ConfigError>;

    /// Load from an explicit TOML file. A missing file yields defaults.
    fn load_file(path: &Path) -> Result<Self, ConfigError>;

    /// Write to an explicit TOML file, creating parent directories
    fn save_file(&self, path: &Path) -> Result<(), ConfigError>;
}

impl AppConfigExt for AppConfig {
    fn load() -> Self {
        match confy::load::<AppConfig>(APP_NAME, CONFIG_NAME) {
            Ok(config) => match config.validate() {
                Ok(()) => config,
                Err(e) => {
                    tracing::warn!(error = %e, "invalid configuration, using defaults");
                    AppConfig::default()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to load configuration, using defaults");
                AppConfig::default()
            }
        }
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        let config: AppConfig =
            toml::from_str(&content).map_err(|source| ConfigError::ParseToml {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    fn save_file(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::WriteFile {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        std::fs::write(path, content).map_err(|source| ConfigError::WriteFile {
            path: path.to_path_buf(),
            source,
        })
    }
}
