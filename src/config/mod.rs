//! Configuration for voxelpipe.
//!
//! Settings are stored as TOML in the platform config directory:
//! - **Linux**: `~/.config/voxelpipe/voxelpipe.toml`
//! - **macOS**: `~/Library/Application Support/voxelpipe/voxelpipe.toml`
//! - **Windows**: `%APPDATA%\voxelpipe\voxelpipe.toml`
//!
//! Environment variables override the file after loading:
//! - `VOXELPIPE_PARALLEL` - `0`/`false`/`off` disables parallel execution
//! - `VOXELPIPE_THREADS` - worker count for a dedicated pool
//!
//! # Example
//!
//! ```ignore
//! use voxelpipe::config::VoxelPipeConfig;
//!
//! let config = VoxelPipeConfig::load_or_default();
//! let mut pipeline = FilterPipeline::with_config(&config);
//! ```

use crate::error::{Result, VoxelPipeError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "voxelpipe";

/// Config filename
pub const CONFIG_FILE: &str = "voxelpipe.toml";

/// Environment variable toggling parallel execution
pub const ENV_PARALLEL: &str = "VOXELPIPE_PARALLEL";

/// Environment variable setting the worker count
pub const ENV_THREADS: &str = "VOXELPIPE_THREADS";

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "voxelpipe=info";

// ==================== Config Directory ====================

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Settings ====================

/// Parallel execution settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelSettings {
    /// Run parallel algorithms on a worker pool
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Dedicated pool size; `None` uses the global rayon pool
    #[serde(default)]
    pub num_threads: Option<usize>,

    /// Grain override; `None` derives it from the range and pool size
    #[serde(default)]
    pub grain: Option<usize>,
}

impl Default for ParallelSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            num_threads: None,
            grain: None,
        }
    }
}

/// Pipeline driver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Halt preflight at the first fatal error
    #[serde(default = "default_true")]
    pub stop_on_error: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            stop_on_error: true,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Directory for daily rolling log files; console only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            log_dir: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

// ==================== VoxelPipeConfig ====================

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxelPipeConfig {
    #[serde(default)]
    pub parallel: ParallelSettings,

    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl VoxelPipeConfig {
    /// Load from the default location, falling back to defaults if absent.
    /// Environment overrides are applied.
    pub fn load() -> Result<Self> {
        let path = config_path().ok_or_else(|| {
            VoxelPipeError::Config("Could not determine config path".to_string())
        })?;
        Self::load_with_env(path)
    }

    /// Load `path` (defaults if it does not exist) and apply environment
    /// overrides.
    pub fn load_with_env(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load, returning defaults on any error
    pub fn load_or_default() -> Self {
        let (config, error) = Self::load_or_default_reporting();
        if let Some(e) = error {
            tracing::warn!("Failed to load config, using defaults: {}", e);
        }
        config
    }

    /// Like [`load_or_default`](Self::load_or_default), but hands the load
    /// error back instead of logging it. For callers that configure logging
    /// from the returned settings.
    pub fn load_or_default_reporting() -> (Self, Option<VoxelPipeError>) {
        match config_path() {
            Some(path) => Self::load_from_or_default(path),
            None => (
                Self::env_defaults(),
                Some(VoxelPipeError::Config("Could not determine config path".to_string())),
            ),
        }
    }

    /// Load `path` with environment overrides; on failure, defaults with
    /// overrides plus the error.
    pub fn load_from_or_default(path: impl AsRef<Path>) -> (Self, Option<VoxelPipeError>) {
        match Self::load_with_env(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::env_defaults(), Some(e)),
        }
    }

    fn env_defaults() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Load a config file without environment overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            VoxelPipeError::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            VoxelPipeError::Config(format!("Failed to parse config {:?}: {}", path, e))
        })
    }

    /// Save to `path`, creating parent directories
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                VoxelPipeError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| VoxelPipeError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            VoxelPipeError::Config(format!("Failed to write config {:?}: {}", path, e))
        })
    }

    /// Save to the default location
    pub fn save(&self) -> Result<()> {
        let path = config_path().ok_or_else(|| {
            VoxelPipeError::Config("Could not determine config path".to_string())
        })?;
        self.save_to(path)
    }

    /// Apply `VOXELPIPE_PARALLEL` / `VOXELPIPE_THREADS`. Unparseable values
    /// are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(ENV_PARALLEL) {
            match parse_flag(&value) {
                Some(enabled) => self.parallel.enabled = enabled,
                None => tracing::warn!("Ignoring invalid {}={:?}", ENV_PARALLEL, value),
            }
        }
        if let Ok(value) = std::env::var(ENV_THREADS) {
            match value.trim().parse::<usize>() {
                Ok(0) => self.parallel.num_threads = None,
                Ok(n) => self.parallel.num_threads = Some(n),
                Err(_) => tracing::warn!("Ignoring invalid {}={:?}", ENV_THREADS, value),
            }
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_env() {
        std::env::remove_var(ENV_PARALLEL);
        std::env::remove_var(ENV_THREADS);
    }

    #[test]
    fn test_config_default() {
        let config = VoxelPipeConfig::default();
        assert!(config.parallel.enabled);
        assert_eq!(config.parallel.num_threads, None);
        assert!(config.pipeline.stop_on_error);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_config_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = VoxelPipeConfig::default();
        config.parallel.num_threads = Some(3);
        config.parallel.grain = Some(64);
        config.pipeline.stop_on_error = false;
        config.save_to(&path).unwrap();

        let loaded = VoxelPipeConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[parallel]\nenabled = false\n").unwrap();

        let loaded = VoxelPipeConfig::load_from(&path).unwrap();
        assert!(!loaded.parallel.enabled);
        assert!(loaded.pipeline.stop_on_error);
        assert_eq!(loaded.logging, LoggingSettings::default());
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "parallel = [").unwrap();

        let err = VoxelPipeConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, VoxelPipeError::Config(_)));
    }

    #[test]
    #[serial]
    fn test_broken_file_falls_back_with_error() {
        clear_env();
        std::env::set_var(ENV_THREADS, "2");
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[parallel]\nenabled = maybe\n").unwrap();

        let (config, error) = VoxelPipeConfig::load_from_or_default(&path);
        assert!(matches!(error, Some(VoxelPipeError::Config(_))));
        assert!(config.parallel.enabled);
        assert_eq!(config.parallel.num_threads, Some(2));

        let (_, missing) = VoxelPipeConfig::load_from_or_default(dir.path().join("absent.toml"));
        assert!(missing.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var(ENV_PARALLEL, "off");
        std::env::set_var(ENV_THREADS, "6");

        let mut config = VoxelPipeConfig::default();
        config.apply_env_overrides();
        assert!(!config.parallel.enabled);
        assert_eq!(config.parallel.num_threads, Some(6));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_ignored() {
        clear_env();
        std::env::set_var(ENV_PARALLEL, "maybe");
        std::env::set_var(ENV_THREADS, "lots");

        let mut config = VoxelPipeConfig::default();
        config.apply_env_overrides();
        assert_eq!(config, VoxelPipeConfig::default());
        clear_env();
    }
}
