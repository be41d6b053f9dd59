mod backend_settings;
mod desktop_config;
mod error;
mod launch_settings;
mod launch_strategy;
mod logging_settings;
mod readiness_settings;

pub use backend_settings::BackendSettings;
pub use desktop_config::{CONFIG_FILENAME, CONFIG_VERSION, DesktopConfig};
pub use error::{ConfigError, Result as ConfigResult};
pub use launch_settings::LaunchSettings;
pub use launch_strategy::LaunchStrategy;
pub use logging_settings::LoggingSettings;
pub use readiness_settings::ReadinessSettings;
