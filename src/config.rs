//! Configuration loading for the pose history engine.
//!
//! Loads from a single YAML file with sensible defaults; a missing file
//! just means defaults.
//!
//! ## Example YAML
//!
//! ```yaml
//! # Retention horizon for pose history (milliseconds)
//! window_ms: 3000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Config load error
#[derive(Debug, Clone)]
pub enum ConfigLoadError {
    /// I/O error
    Io(String),
    /// Parse error
    Parse(String),
}

impl std::fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigLoadError::Io(msg) => write!(f, "IO error: {}", msg),
            ConfigLoadError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigLoadError {}

/// Pose history configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Retention horizon in milliseconds.
    ///
    /// History older than this behind the newest odometry sample is
    /// evicted. Sized to the planning horizon of the robot; vision
    /// corrections for observations older than this can no longer be
    /// applied.
    ///
    /// Default: 3000 ms
    #[serde(default = "default_window_ms")]
    pub window_ms: u32,
}

fn default_window_ms() -> u32 {
    3000
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
        }
    }
}

impl HistoryConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Load from the default config path (configs/history.yaml), falling
    /// back to built-in defaults when the file does not exist.
    pub fn load_default() -> Result<Self, ConfigLoadError> {
        let path = Path::new("configs/history.yaml");
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigLoadError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window() {
        assert_eq!(HistoryConfig::default().window_ms, 3000);
    }

    #[test]
    fn test_from_yaml() {
        let config = HistoryConfig::from_yaml("window_ms: 5000").unwrap();
        assert_eq!(config.window_ms, 5000);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = HistoryConfig { window_ms: 1234 };
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back = HistoryConfig::from_yaml(&yaml).unwrap();
        assert_eq!(back.window_ms, 1234);
    }

    #[test]
    fn test_bad_yaml_is_parse_error() {
        let result = HistoryConfig::from_yaml("window_ms: [not a number");
        assert!(matches!(result, Err(ConfigLoadError::Parse(_))));
    }
}
