use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadinessError {
    #[error("Health request failed: {source} {location}")]
    Http {
        #[source]
        source: reqwest::Error,
        location: ErrorLocation,
    },

    #[error("Health endpoint returned HTTP {status} {location}")]
    Status { status: u16, location: ErrorLocation },

    #[error("Health request aborted {location}")]
    Aborted { location: ErrorLocation },

    #[error("Failed to build HTTP client: {source} {location}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
        location: ErrorLocation,
    },
}

impl ReadinessError {
    #[track_caller]
    pub fn status(status: u16) -> Self {
        Self::Status {
            status,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn aborted() -> Self {
        Self::Aborted {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Whether the next poll might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Status { .. })
    }
}

impl From<reqwest::Error> for ReadinessError {
    #[track_caller]
    fn from(source: reqwest::Error) -> Self {
        Self::Http {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReadinessError>;
