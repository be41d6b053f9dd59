use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Backend is already running with PID {pid} {location}")]
    AlreadyRunning { pid: u32, location: ErrorLocation },

    #[error("Failed to spawn backend via '{strategy}': {source} {location}")]
    Spawn {
        strategy: String,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Backend spawned via '{strategy}' has no process id {location}")]
    PidUnavailable {
        strategy: String,
        location: ErrorLocation,
    },

    #[error("No launch strategy could start the backend (tried: {}) {location}", attempted.join(", "))]
    LaunchExhausted {
        attempted: Vec<String>,
        location: ErrorLocation,
    },

    #[error("Backend working directory not found: {path} {location}")]
    WorkingDirMissing {
        path: PathBuf,
        location: ErrorLocation,
    },
}

impl SupervisorError {
    #[track_caller]
    pub fn spawn(strategy: &str, source: std::io::Error) -> Self {
        Self::Spawn {
            strategy: strategy.into(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::AlreadyRunning { .. } => {
                "The backend is already running. Stop it before starting another instance."
            }
            Self::Spawn { .. } | Self::PidUnavailable { .. } | Self::LaunchExhausted { .. } => {
                "Could not start the Python backend. \
                   Make sure `uv` or Python 3 with uvicorn is installed and on PATH."
            }
            Self::WorkingDirMissing { .. } => {
                "The backend project directory is missing. \
                   Check `backend.working_dir` in the config file."
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
