//! Knowledge Studio desktop host.
//!
//! Supervises the locally spawned backend, answers the UI's "is the backend
//! ready" question, and owns the single shutdown path of the application.

pub mod app;
pub mod config;
pub mod console_shell;
pub mod lifecycle;
pub mod logging;
pub mod readiness;
pub mod supervisor;

#[cfg(test)]
mod tests;

pub use config::DesktopConfig;
pub use lifecycle::{ApplicationLifecycle, CloseOutcome, HostShell, ShutdownState, TrayAction};
pub use readiness::{
    CancelToken, HealthProbe, HttpHealthProbe, ReadinessOverlay, ReadinessPoller, ReadinessState,
    observe_readiness,
};
pub use supervisor::{BackendSupervisor, ProcessState, SupervisorError};
