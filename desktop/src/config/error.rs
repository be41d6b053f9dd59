use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source} {location}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Failed to write config at {path}: {source} {location}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Failed to parse config: {source} {location}")]
    Parse {
        #[source]
        source: toml::de::Error,
        location: ErrorLocation,
    },

    #[error("Failed to serialize config: {source} {location}")]
    Serialize {
        #[source]
        source: toml::ser::Error,
        location: ErrorLocation,
    },

    #[error("Configuration invalid: {message} {location}")]
    Invalid {
        message: String,
        location: ErrorLocation,
    },
}

impl ConfigError {
    #[track_caller]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    #[track_caller]
    fn from(source: toml::de::Error) -> Self {
        Self::Parse {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<toml::ser::Error> for ConfigError {
    #[track_caller]
    fn from(source: toml::ser::Error) -> Self {
        Self::Serialize {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
