use crate::config::desktop_config::default_strategies;
use crate::config::LaunchStrategy;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSettings {
    /// Launch strategies in order of preference
    #[serde(default = "default_strategies")]
    pub strategies: Vec<LaunchStrategy>,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
        }
    }
}
