use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Environment variable overriding [`BuildConfig::output_dir`].
pub const OUTPUT_DIR_ENV: &str = "WEIGHT_PLATE_OUTPUT_DIR";

/// Where and how finished plates are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory receiving saved documents. Created on demand.
    pub output_dir: PathBuf,
    /// Extension of saved documents, without the dot.
    pub file_extension: String,
    /// The through-all bore is cut `thickness * through_all_factor` deep.
    pub through_all_factor: f64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_extension: "step".to_string(),
            through_all_factor: 1.2,
        }
    }
}

/// `<documents>/WeightPlatePlugin/Models`, falling back to the home
/// directory and then the working directory.
pub fn default_output_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("WeightPlatePlugin")
        .join("Models")
}

impl BuildConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: BuildConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, with the output directory taken from
    /// `WEIGHT_PLATE_OUTPUT_DIR` when set.
    pub fn from_env() -> Self {
        Self::default().with_output_override(std::env::var_os(OUTPUT_DIR_ENV))
    }

    fn with_output_override(self, value: Option<OsString>) -> Self {
        match value {
            Some(dir) if !dir.is_empty() => self.with_output_dir(dir),
            _ => self,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = extension.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.through_all_factor.is_finite() && self.through_all_factor > 1.0) {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "through_all_factor must be a finite number above 1, got {}",
                    self.through_all_factor
                ),
            });
        }
        let ext = &self.file_extension;
        if ext.is_empty() || ext.contains(['.', '/', '\\']) {
            return Err(ConfigError::Invalid {
                reason: format!("file_extension must be a bare extension, got {ext:?}"),
            });
        }
        Ok(())
    }
}
