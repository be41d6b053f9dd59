//! Single authoritative shutdown path for the whole application.

use crate::lifecycle::{CloseOutcome, HostShell, ShutdownState, TrayAction};
use crate::readiness::{OverlayAction, ReadinessPoller};
use crate::supervisor::{BackendSupervisor, SupervisorResult};

use std::sync::Arc;

use tracing::{debug, info};

const EXIT_CODE_SUCCESS: i32 = 0;

/// One per application run. Every exit trigger (confirmed window close,
/// quit request, tray exit, overlay exit) ends up in
/// [`Self::shutdown_application`], which runs at most once.
pub struct ApplicationLifecycle {
    shutdown: ShutdownState,
    supervisor: Arc<BackendSupervisor>,
    shell: Arc<dyn HostShell>,
}

impl ApplicationLifecycle {
    pub fn new(supervisor: Arc<BackendSupervisor>, shell: Arc<dyn HostShell>) -> Self {
        Self {
            shutdown: ShutdownState::new(),
            supervisor,
            shell,
        }
    }

    pub fn supervisor(&self) -> &Arc<BackendSupervisor> {
        &self.supervisor
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_shutting_down()
    }

    /// Start the backend. Failures are already logged by the supervisor;
    /// the readiness poller surfaces the consequence through its timeout.
    pub async fn launch_backend(&self) -> SupervisorResult<u32> {
        self.supervisor.start().await
    }

    /// Stop child, dispose tray, close window, terminate host, in that
    /// order. The child has exited (or been killed) before the tray goes.
    /// Returns `false` if a shutdown already ran.
    pub async fn shutdown_application(&self) -> bool {
        if !self.shutdown.try_begin() {
            debug!("Shutdown already in progress");
            return false;
        }

        info!("Shutting down Knowledge Studio");
        let backend = self.supervisor.shutdown().await;
        debug!("Backend state after stop: {backend:?}");
        self.shell.dispose_tray();
        self.shell.close_window_without_confirmation();
        self.shell.terminate(EXIT_CODE_SUCCESS);
        true
    }

    /// Close-confirmation gate for the primary window.
    pub async fn handle_close_request(&self) -> CloseOutcome {
        if self.is_shutting_down() {
            return CloseOutcome::Proceed;
        }

        if self.shell.confirm_exit().await {
            self.shutdown_application().await;
            CloseOutcome::Confirmed
        } else {
            info!("Exit cancelled by user");
            CloseOutcome::Cancelled
        }
    }

    /// Quit from the menu or a termination signal. No confirmation.
    pub async fn handle_quit_request(&self) -> bool {
        info!("Quit requested");
        self.shutdown_application().await
    }

    pub async fn handle_tray_action(&self, action: TrayAction) {
        debug!("Tray action: {action:?}");
        match action {
            TrayAction::ShowWindow => self.shell.show_window(),
            TrayAction::Exit => {
                self.shutdown_application().await;
            }
        }
    }

    pub async fn handle_overlay_action(&self, action: OverlayAction, poller: &ReadinessPoller) {
        match action {
            OverlayAction::Retry => poller.retry(),
            OverlayAction::Exit => {
                self.shutdown_application().await;
            }
        }
    }
}
