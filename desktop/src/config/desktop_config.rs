//! Desktop host configuration with validation and versioning.

use crate::config::{
    BackendSettings, ConfigError, ConfigResult, LaunchSettings, LaunchStrategy, LoggingSettings,
    ReadinessSettings,
};

use std::panic::Location;
use std::path::{Path, PathBuf};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Configuration version for migration support.
/// Increment when adding new fields or changing structure.
pub const CONFIG_VERSION: u32 = 1;

pub const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 13560;
const DEFAULT_WORKING_DIR: &str = "backend";
const DEFAULT_HEALTH_PATH: &str = "/health";
const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 3000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_READINESS_TIMEOUT_MS: u64 = 20_000;
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5000;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_RETENTION_DAYS: usize = 7;

const MIN_PORT: u16 = 1024;
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopConfig {
    /// Config file format version
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub launch: LaunchSettings,

    #[serde(default)]
    pub readiness: ReadinessSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

// === Default Value Functions ===

fn default_version() -> u32 {
    CONFIG_VERSION
}
pub(crate) fn default_host() -> String {
    DEFAULT_HOST.into()
}
pub(crate) fn default_port() -> u16 {
    DEFAULT_PORT
}
pub(crate) fn default_working_dir() -> PathBuf {
    PathBuf::from(DEFAULT_WORKING_DIR)
}
pub(crate) fn default_health_path() -> String {
    DEFAULT_HEALTH_PATH.into()
}
pub(crate) fn default_shutdown_timeout() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_MS
}
pub(crate) fn default_strategies() -> Vec<LaunchStrategy> {
    vec![LaunchStrategy::uv(), LaunchStrategy::python()]
}
pub(crate) fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
pub(crate) fn default_readiness_timeout() -> u64 {
    DEFAULT_READINESS_TIMEOUT_MS
}
pub(crate) fn default_probe_timeout() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}
pub(crate) fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.into()
}
pub(crate) fn default_log_dir() -> String {
    DEFAULT_LOG_DIR.into()
}
pub(crate) fn default_log_retention() -> usize {
    DEFAULT_LOG_RETENTION_DAYS
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            backend: BackendSettings::default(),
            launch: LaunchSettings::default(),
            readiness: ReadinessSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

// === Configuration Operations ===

impl DesktopConfig {
    /// Load config from file, creating default if not exists.
    pub fn load_or_create(config_dir: &Path) -> ConfigResult<Self> {
        let config_path = config_dir.join(CONFIG_FILENAME);

        if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
                    path: config_path.clone(),
                    source,
                    location: ErrorLocation::from(Location::caller()),
                })?;
            let mut config: Self = toml::from_str(&content)?;

            if config.version < CONFIG_VERSION {
                config = Self::migrate(config);
                config.save(config_dir)?;
            }

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save(config_dir)?;
            info!("Wrote default config to {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to file atomically.
    ///
    /// Uses write-to-temp-then-rename so an interrupted write never leaves a
    /// truncated config behind.
    pub fn save(&self, config_dir: &Path) -> ConfigResult<()> {
        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = toml::to_string_pretty(self)?;

        let write_err = |source| ConfigError::Write {
            path: config_path.clone(),
            source,
            location: ErrorLocation::from(Location::caller()),
        };

        std::fs::create_dir_all(config_dir).map_err(write_err)?;
        let temp_path = config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, &content).map_err(write_err)?;
        std::fs::rename(&temp_path, &config_path).map_err(write_err)?;

        Ok(())
    }

    fn migrate(mut config: Self) -> Self {
        // Version 0 -> 1: launch strategies and readiness knobs introduced
        if config.version == 0 {
            config.launch = LaunchSettings::default();
            config.readiness = ReadinessSettings::default();
            config.version = 1;
        }

        config
    }

    /// Validate configuration values.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.backend.port < MIN_PORT {
            return Err(ConfigError::invalid(format!(
                "Port must be >= {MIN_PORT} (unprivileged)"
            )));
        }

        // Backend must only ever be reachable over loopback
        if self.backend.host != DEFAULT_HOST && self.backend.host != "localhost" {
            return Err(ConfigError::invalid(format!(
                "Host must be {DEFAULT_HOST} or localhost"
            )));
        }

        if !self.backend.health_path.starts_with('/') {
            return Err(ConfigError::invalid("Health path must start with '/'"));
        }

        if self.backend.shutdown_timeout_ms == 0 {
            return Err(ConfigError::invalid("Backend shutdown timeout must be > 0"));
        }

        if self.launch.strategies.is_empty() {
            return Err(ConfigError::invalid(
                "At least one launch strategy is required",
            ));
        }

        if let Some(strategy) = self
            .launch
            .strategies
            .iter()
            .find(|s| s.program.trim().is_empty())
        {
            return Err(ConfigError::invalid(format!(
                "Launch strategy '{}' has an empty program",
                strategy.name
            )));
        }

        let readiness = &self.readiness;
        if readiness.poll_interval_ms == 0 || readiness.timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "Readiness poll interval and timeout must be > 0",
            ));
        }

        if readiness.poll_interval_ms >= readiness.timeout_ms {
            return Err(ConfigError::invalid(format!(
                "Readiness poll interval ({}ms) must be shorter than the timeout ({}ms)",
                readiness.poll_interval_ms, readiness.timeout_ms
            )));
        }

        if readiness.probe_timeout_ms == 0 {
            return Err(ConfigError::invalid("Probe timeout must be > 0"));
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid(format!(
                "Unknown log level '{}'",
                self.logging.level
            )));
        }

        Ok(())
    }
}
