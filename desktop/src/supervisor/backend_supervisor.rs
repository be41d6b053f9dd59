//! Backend child-process lifetime.

use crate::config::{BackendSettings, DesktopConfig, LaunchStrategy};
use crate::supervisor::output::{self, StreamKind};
use crate::supervisor::{ProcessState, SupervisedProcess, SupervisorError, SupervisorResult};

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use error_location::ErrorLocation;
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};

/// How long to wait for the exit after SIGKILL.
const FORCED_EXIT_WAIT: Duration = Duration::from_secs(2);

/// Owns the backend server process.
///
/// Responsibilities:
/// - Spawn the backend, falling back through the launch strategies
/// - Log the child's output and observe its exit
/// - Terminate the child on request, escalating to a kill on shutdown
///
/// It never waits for the backend to become healthy; that is the readiness
/// poller's job.
pub struct BackendSupervisor {
    settings: BackendSettings,
    working_dir: PathBuf,
    strategies: Vec<LaunchStrategy>,
    process: Arc<Mutex<Option<SupervisedProcess>>>,
    state_tx: Arc<watch::Sender<ProcessState>>,
    state_rx: watch::Receiver<ProcessState>,
}

impl BackendSupervisor {
    pub fn new(
        settings: BackendSettings,
        working_dir: PathBuf,
        strategies: Vec<LaunchStrategy>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ProcessState::NotStarted);

        Self {
            settings,
            working_dir,
            strategies,
            process: Arc::new(Mutex::new(None)),
            state_tx: Arc::new(state_tx),
            state_rx,
        }
    }

    /// Build from config, resolving a relative backend directory against
    /// `root`.
    pub fn from_config(config: &DesktopConfig, root: &Path) -> Self {
        Self::new(
            config.backend.clone(),
            config.backend.resolved_working_dir(root),
            config.launch.strategies.clone(),
        )
    }

    /// Base URL the UI uses for every REST call.
    pub fn backend_base_url(&self) -> String {
        self.settings.base_url()
    }

    pub fn health_url(&self) -> String {
        self.settings.health_url()
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Current liveness state.
    pub fn state(&self) -> ProcessState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ProcessState> {
        self.state_rx.clone()
    }

    /// Spawn the backend and return its PID.
    ///
    /// Returns as soon as a child is spawned. Strategies are tried in order;
    /// a strategy that cannot be spawned is logged and the next one tried.
    /// Refuses to spawn while a previous child is still active.
    pub async fn start(&self) -> SupervisorResult<u32> {
        let mut slot = self.process.lock().await;

        if let Some(existing) = slot.as_ref() {
            warn!(
                "Backend already running (PID {}), not starting another",
                existing.pid
            );
            return Err(SupervisorError::AlreadyRunning {
                pid: existing.pid,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if !self.working_dir.is_dir() {
            error!(
                "Backend directory {} does not exist",
                self.working_dir.display()
            );
            return Err(SupervisorError::WorkingDirMissing {
                path: self.working_dir.clone(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut attempted = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            attempted.push(strategy.name.clone());

            match self.spawn_with(strategy) {
                Ok(process) => {
                    let pid = process.pid;
                    info!(
                        "Started backend via '{}' (PID {pid}): {}",
                        process.strategy,
                        process.command_line()
                    );
                    *slot = Some(process);
                    self.state_tx.send_replace(ProcessState::Running { pid });
                    return Ok(pid);
                }
                Err(e) => warn!("{e}"),
            }
        }

        let err = SupervisorError::LaunchExhausted {
            attempted,
            location: ErrorLocation::from(Location::caller()),
        };
        error!("{err}");
        Err(err)
    }

    fn spawn_with(&self, strategy: &LaunchStrategy) -> SupervisorResult<SupervisedProcess> {
        let args = strategy.resolved_args(&self.settings.host, self.settings.port);
        debug!(
            "Spawning '{}' in {}",
            strategy.program,
            self.working_dir.display()
        );

        let mut child = Command::new(&strategy.program)
            .args(&args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SupervisorError::spawn(&strategy.name, e))?;

        // Dropping `child` on error kills it
        let pid = pid_of(&child, &strategy.name)?;

        if let Some(stdout) = child.stdout.take() {
            output::observe(stdout, StreamKind::Stdout, pid);
        }
        if let Some(stderr) = child.stderr.take() {
            output::observe(stderr, StreamKind::Stderr, pid);
        }

        self.watch_exit(child, pid);

        Ok(SupervisedProcess::new(
            strategy.name.clone(),
            strategy.program.clone(),
            args,
            self.working_dir.clone(),
            pid,
        ))
    }

    /// Reap the child and publish its exit. Signals are sent by
    /// [`Self::stop`] and [`Self::shutdown`], never from here.
    fn watch_exit(&self, mut child: Child, pid: u32) {
        let process = self.process.clone();
        let state_tx = self.state_tx.clone();

        tokio::spawn(async move {
            let status = child.wait().await;
            let code = exit_code(status, pid);

            let mut slot = process.lock().await;
            let requested = matches!(*state_tx.borrow(), ProcessState::Stopping { pid: p } if p == pid);
            if requested {
                info!("Backend (PID {pid}) exited with code {code:?}");
            } else {
                // Backend and application lifetimes are decoupled: log only
                warn!("Backend (PID {pid}) exited unexpectedly with code {code:?}");
            }

            if slot.as_ref().is_some_and(|p| p.pid == pid) {
                *slot = None;
                state_tx.send_replace(ProcessState::Exited { code });
            }
        });
    }

    /// Send the termination signal to the running child, if any.
    ///
    /// The signal is delivered before this returns, so the child is told to
    /// exit even if the host goes away right after. Does not wait for the
    /// exit, which the exit watcher reports through [`Self::subscribe`].
    /// Idempotent; returns whether a signal was sent by this call.
    pub async fn stop(&self) -> bool {
        let mut slot = self.process.lock().await;

        let Some(process) = slot.as_mut() else {
            debug!("No backend running, nothing to stop");
            return false;
        };

        if !process.mark_stop_requested() {
            debug!("Backend (PID {}) already stopping", process.pid);
            return false;
        }

        let pid = process.pid;
        info!("Stopping backend (PID {pid})");
        self.state_tx.send_replace(ProcessState::Stopping { pid });
        send_signal(pid, Termination::Graceful).await;
        true
    }

    /// Stop the backend and wait for it to exit, force-killing it once
    /// `backend.shutdown_timeout_ms` has passed. Returns the final state.
    pub async fn shutdown(&self) -> ProcessState {
        let Some(pid) = self.state().pid() else {
            debug!("No backend running, nothing to shut down");
            return self.state();
        };

        self.stop().await;
        let timeout = self.settings.shutdown_timeout();
        if self.wait_until_inactive(timeout).await {
            return self.state();
        }

        warn!(
            "Backend (PID {pid}) still running {}ms after SIGTERM, killing it",
            timeout.as_millis()
        );
        {
            let slot = self.process.lock().await;
            if slot.as_ref().is_some_and(|p| p.pid == pid) {
                send_signal(pid, Termination::Forced).await;
            }
        }

        if !self.wait_until_inactive(FORCED_EXIT_WAIT).await {
            error!("Backend (PID {pid}) did not exit after being killed");
        }
        self.state()
    }

    async fn wait_until_inactive(&self, limit: Duration) -> bool {
        let mut rx = self.state_rx.clone();
        matches!(
            tokio::time::timeout(limit, rx.wait_for(|s| !s.is_active())).await,
            Ok(Ok(_))
        )
    }
}

/// Pid of a freshly spawned child. `None` means it was already reaped.
#[track_caller]
pub(crate) fn pid_of(child: &Child, strategy: &str) -> SupervisorResult<u32> {
    child.id().ok_or_else(|| SupervisorError::PidUnavailable {
        strategy: strategy.into(),
        location: ErrorLocation::from(Location::caller()),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    Graceful,
    Forced,
}

#[cfg(unix)]
async fn send_signal(pid: u32, termination: Termination) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        warn!("Backend PID {pid} out of range, not signalling");
        return;
    };
    let signal = match termination {
        Termination::Graceful => Signal::SIGTERM,
        Termination::Forced => Signal::SIGKILL,
    };

    info!("Sending {signal} to pid {pid}");
    if let Err(e) = kill(Pid::from_raw(raw), signal) {
        warn!("Failed to signal backend (PID {pid}): {e}");
    }
}

#[cfg(not(unix))]
async fn send_signal(pid: u32, termination: Termination) {
    let pid_arg = pid.to_string();
    let mut args = vec!["/PID", pid_arg.as_str(), "/T"];
    if termination == Termination::Forced {
        args.push("/F");
    }

    info!("Running taskkill {}", args.join(" "));
    match Command::new("taskkill").args(&args).output().await {
        Ok(output) if output.status.success() => {}
        Ok(output) => warn!(
            "taskkill for backend (PID {pid}) failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ),
        Err(e) => warn!("Failed to run taskkill for backend (PID {pid}): {e}"),
    }
}

fn exit_code(status: std::io::Result<ExitStatus>, pid: u32) -> Option<i32> {
    match status {
        Ok(status) => status.code(),
        Err(e) => {
            warn!("Failed to wait for backend (PID {pid}): {e}");
            None
        }
    }
}
