use crate::config::desktop_config::{
    default_poll_interval, default_probe_timeout, default_readiness_timeout,
};

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessSettings {
    /// Delay between failed health checks (milliseconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Give up after this long without a healthy answer (milliseconds)
    #[serde(default = "default_readiness_timeout")]
    pub timeout_ms: u64,

    /// Upper bound for a single health request (milliseconds)
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
}

impl ReadinessSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            timeout_ms: default_readiness_timeout(),
            probe_timeout_ms: default_probe_timeout(),
        }
    }
}
