/// Shown when the backend never answered within the timeout.
pub const BACKEND_UNAVAILABLE_MESSAGE: &str =
    "Unable to reach the backend service. Check the Python environment or try again later.";

/// What the UI knows about backend readiness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadinessState {
    /// Backend answered a health check
    pub ready: bool,
    /// User-facing message once the timeout elapsed
    pub error: Option<String>,
    /// Health requests issued in the current generation
    pub attempts: u32,
    /// Time since the generation started, updated on each failure
    pub elapsed_ms: u64,
    /// Incremented by every retry
    pub retry_token: u64,
}

impl ReadinessState {
    /// Fresh state for the generation identified by `retry_token`.
    pub fn for_generation(retry_token: u64) -> Self {
        Self {
            retry_token,
            ..Self::default()
        }
    }

    /// Neither ready nor failed: a polling loop is (or should be) running.
    pub fn is_pending(&self) -> bool {
        !self.ready && self.error.is_none()
    }

    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }
}
