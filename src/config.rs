//! Configuration for shufflebox
//!
//! A minimal TOML bootstrap file plus command-line overrides. Everything has
//! a built-in default so the player runs with no file at all.
//!
//! Settings priority:
//! 1. Command-line arguments
//! 2. Environment variables (via clap `env` attributes)
//! 3. TOML configuration file
//! 4. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::playback::watchdog::DEFAULT_STALL_THRESHOLD;

/// Bootstrap configuration loaded from a TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Folder to shuffle; defaults to the user's music directory
    #[serde(default)]
    pub shuffle_folder: Option<PathBuf>,

    /// Master volume at startup (0.0-1.0)
    #[serde(default = "default_volume")]
    pub initial_volume: f32,

    #[serde(default)]
    pub watchdog: WatchdogConfig,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Stall detection tuning
#[derive(Debug, Clone, Deserialize)]
pub struct WatchdogConfig {
    /// Position sampling interval
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Consecutive identical samples before a track is declared frozen
    #[serde(default = "default_stale_threshold")]
    pub stale_threshold: u32,

    /// Interval for the periodic progress broadcast
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

/// Terminal front end tuning
#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    /// Redraw / key poll delay
    #[serde(default = "default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path. Strongly recommended when the terminal front end is
    /// active, since stderr is not usable under raw mode.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_port() -> u16 {
    21212
}

fn default_volume() -> f32 {
    0.75
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_stale_threshold() -> u32 {
    DEFAULT_STALL_THRESHOLD
}

fn default_progress_interval_ms() -> u64 {
    1000
}

fn default_refresh_delay_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            shuffle_folder: None,
            initial_volume: default_volume(),
            watchdog: WatchdogConfig::default(),
            ui: UiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            stale_threshold: default_stale_threshold(),
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_delay_ms: default_refresh_delay_ms(),
        }
    }
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub shuffle_folder: Option<PathBuf>,
}

/// Complete resolved application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub shuffle_folder: PathBuf,
    pub initial_volume: f32,
    pub watchdog: WatchdogConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from an optional TOML file, then apply overrides.
    pub fn load(toml_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let toml_config = match toml_path {
            Some(path) => {
                let toml_str = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("failed to read config file {:?}: {}", path, e))
                })?;
                let parsed: TomlConfig = toml::from_str(&toml_str)
                    .map_err(|e| Error::Config(format!("failed to parse TOML: {}", e)))?;
                info!("loaded configuration from {:?}", path);
                parsed
            }
            None => TomlConfig::default(),
        };

        let shuffle_folder = overrides
            .shuffle_folder
            .or(toml_config.shuffle_folder)
            .unwrap_or_else(default_shuffle_folder);

        Ok(Config {
            port: overrides.port.unwrap_or(toml_config.port),
            shuffle_folder,
            initial_volume: toml_config.initial_volume.clamp(0.0, 1.0),
            watchdog: toml_config.watchdog,
            ui: toml_config.ui,
            logging: toml_config.logging,
        })
    }

    pub fn watchdog_poll_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog.poll_interval_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog.progress_interval_ms)
    }

    pub fn ui_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.ui.refresh_delay_ms)
    }
}

/// The user's music directory, falling back to `~/Music`
fn default_shuffle_folder() -> PathBuf {
    dirs::audio_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Music")))
        .unwrap_or_else(|| PathBuf::from("Music"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_a_file() {
        let config = Config::load(None, ConfigOverrides::default()).unwrap();
        assert_eq!(config.port, 21212);
        assert_eq!(config.watchdog.stale_threshold, 5);
        assert_eq!(config.watchdog.poll_interval_ms, 500);
        assert_eq!(config.ui.refresh_delay_ms, 500);
    }

    #[test]
    fn overrides_beat_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shufflebox.toml");
        std::fs::write(&path, "port = 9000\n\n[watchdog]\nstale_threshold = 3\n").unwrap();

        let overrides = ConfigOverrides {
            port: Some(1234),
            shuffle_folder: Some(PathBuf::from("/music")),
        };
        let config = Config::load(Some(&path), overrides).unwrap();
        assert_eq!(config.port, 1234);
        assert_eq!(config.shuffle_folder, PathBuf::from("/music"));
        assert_eq!(config.watchdog.stale_threshold, 3);
    }

    #[test]
    fn a_missing_named_file_is_an_error() {
        let err = Config::load(Some(Path::new("/no/such.toml")), ConfigOverrides::default())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "port = \"not a number").unwrap();
        let err = Config::load(Some(&path), ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
