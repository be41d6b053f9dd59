mod application_lifecycle;
mod close_outcome;
mod host_shell;
mod shutdown_state;
mod tray_action;

pub use application_lifecycle::ApplicationLifecycle;
pub use close_outcome::CloseOutcome;
pub use host_shell::HostShell;
pub use shutdown_state::ShutdownState;
pub use tray_action::TrayAction;
