//! Configuration for merge and align runs.
//!
//! Every run parameter lives in these structs and is passed explicitly.
//! A JSON file supplies defaults; command-line flags override them.

use crate::core::stats::{parse_functions, AggregateFn};
use crate::error::ConfigError;
use crate::source::Modality;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub merge: MergeConfig,
    pub align: AlignConfig,
}

/// Parameters of a merge run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Directory holding the `Afdx` and `Leda` log directories
    pub data_root: PathBuf,
    /// Survey table to augment
    pub input_table: PathBuf,
    /// Where the augmented table is written
    pub output_path: PathBuf,
    /// Column with participant labels (`<prefix>_<device number>`)
    pub id_column: String,
    /// Screen timestamp columns, one output window each
    pub window_columns: Vec<String>,
    /// Sensor columns to aggregate, from either modality
    pub variables: Vec<String>,
    /// Aggregate function tokens
    pub functions: Vec<String>,
    /// Window length after each screen timestamp, in seconds
    pub window_secs: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("."),
            input_table: PathBuf::new(),
            output_path: PathBuf::from("merged.csv"),
            id_column: "participant_label".to_string(),
            window_columns: Vec::new(),
            variables: Vec::new(),
            functions: vec!["mean".to_string()],
            window_secs: 20.0,
        }
    }
}

impl MergeConfig {
    /// Check the configuration and resolve function tokens.
    pub fn validate(&self) -> Result<Vec<AggregateFn>, ConfigError> {
        let functions = parse_functions(&self.functions)?;
        if functions.is_empty() {
            return Err(ConfigError::Invalid("no aggregate functions".to_string()));
        }
        if self.input_table.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("no input table".to_string()));
        }
        if self.window_columns.is_empty() {
            return Err(ConfigError::Invalid("no window columns".to_string()));
        }
        if !(self.window_secs.is_finite() && self.window_secs >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "window length must be a non-negative number of seconds, got {}",
                self.window_secs
            )));
        }
        Ok(functions)
    }
}

/// Parameters of an align run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    pub data_root: PathBuf,
    /// Event table: device number in the first column, timestamp in the second
    pub input_table: PathBuf,
    pub output_path: PathBuf,
    pub modality: Modality,
    pub variable: String,
    /// Cross-device aggregate
    pub function: String,
    /// Seconds kept on each side of the stimulus
    pub span_secs: f64,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("."),
            input_table: PathBuf::new(),
            output_path: PathBuf::from("aligned.csv"),
            modality: Modality::Leda,
            variable: "analysis.phasicData".to_string(),
            function: "mean".to_string(),
            span_secs: 100.0,
        }
    }
}

impl AlignConfig {
    pub fn validate(&self) -> Result<AggregateFn, ConfigError> {
        let function = self.function.parse()?;
        if self.input_table.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("no input table".to_string()));
        }
        if !(self.span_secs.is_finite() && self.span_secs >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "span must be a non-negative number of seconds, got {}",
                self.span_secs
            )));
        }
        Ok(function)
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = Self::config_path();
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
            path: config_path.clone(),
            source,
        })?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(io_err)?;
        Ok(())
    }

    /// Get the path to the default configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sensor-query-merge")
            .join("config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn merge_config() -> MergeConfig {
        MergeConfig {
            input_table: PathBuf::from("survey.csv"),
            window_columns: vec!["player_time_screen3".to_string()],
            variables: vec!["joy".to_string()],
            functions: vec!["mean".to_string(), "sd".to_string()],
            ..MergeConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.merge.window_secs, 20.0);
        assert_eq!(config.merge.id_column, "participant_label");
        assert_eq!(config.align.modality, Modality::Leda);
    }

    #[test]
    fn test_validate_resolves_functions() {
        let functions = merge_config().validate().unwrap();
        assert_eq!(functions, vec![AggregateFn::Mean, AggregateFn::Std]);
    }

    #[test]
    fn test_validate_rejects_unknown_function() {
        let mut config = merge_config();
        config.functions.push("mode".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownFunction(_))
        ));
    }

    #[test]
    fn test_validate_rejects_missing_windows() {
        let mut config = merge_config();
        config.window_columns.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = merge_config();
        config.window_secs = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"merge": {"variables": ["joy", "anger"]}}"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.merge.variables, vec!["joy", "anger"]);
        assert_eq!(config.merge.functions, vec!["mean"]);
        assert_eq!(config.align.span_secs, 100.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.merge = merge_config();
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.merge.window_columns, config.merge.window_columns);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.json")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
