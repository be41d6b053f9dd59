use crate::config::desktop_config::{
    default_health_path, default_host, default_port, default_shutdown_timeout,
    default_working_dir,
};

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Loopback address the backend binds to
    #[serde(default = "default_host")]
    pub host: String,

    /// Fixed backend port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Backend project root, used as the child's working directory
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// Route used solely to detect availability
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Grace period between SIGTERM and SIGKILL on shutdown (milliseconds)
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_ms: u64,
}

impl BackendSettings {
    /// Base URL handed to the UI, e.g. `http://127.0.0.1:13560`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn health_url(&self) -> String {
        let path = self.health_path.trim_start_matches('/');
        format!("{}/{path}", self.base_url())
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Resolve a relative working directory against `root`.
    pub fn resolved_working_dir(&self, root: &Path) -> PathBuf {
        if self.working_dir.is_absolute() {
            self.working_dir.clone()
        } else {
            root.join(&self.working_dir)
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            working_dir: default_working_dir(),
            health_path: default_health_path(),
            shutdown_timeout_ms: default_shutdown_timeout(),
        }
    }
}
