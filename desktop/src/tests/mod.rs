
use crate::config::{BackendSettings, LaunchStrategy};
use crate::lifecycle::HostShell;
use crate::readiness::{CancelToken, HealthProbe, ReadinessError, ReadinessResult};
use crate::supervisor::{BackendSupervisor, ProcessState};

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, watch};

pub(crate) fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Restores an environment variable on drop. Pair with `#[serial]`.
pub(crate) struct EnvGuard {
    key: &'static str,
    original: Option<String>,
}

impl EnvGuard {
    pub(crate) fn set(key: &'static str, value: &str) -> Self {
        let original = std::env::var(key).ok();
        unsafe { std::env::set_var(key, value) };
        Self { key, original }
    }

    pub(crate) fn remove(key: &'static str) -> Self {
        let original = std::env::var(key).ok();
        unsafe { std::env::remove_var(key) };
        Self { key, original }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        unsafe {
            match &self.original {
                Some(value) => std::env::set_var(self.key, value),
                None => std::env::remove_var(self.key),
            }
        }
    }
}

// =============================================================================
// Host shell double
// =============================================================================

/// Records every shell call in order.
pub(crate) struct RecordingShell {
    confirm: bool,
    calls: Mutex<Vec<String>>,
    process_rx: OnceLock<watch::Receiver<ProcessState>>,
    state_at_dispose: Mutex<Option<ProcessState>>,
    state_at_terminate: Mutex<Option<ProcessState>>,
}

impl RecordingShell {
    pub(crate) fn answering(confirm: bool) -> Arc<Self> {
        Arc::new(Self {
            confirm,
            calls: Mutex::new(Vec::new()),
            process_rx: OnceLock::new(),
            state_at_dispose: Mutex::new(None),
            state_at_terminate: Mutex::new(None),
        })
    }

    /// Capture the backend state when the tray is disposed and when the
    /// host is terminated.
    pub(crate) fn watch_process(&self, rx: watch::Receiver<ProcessState>) {
        let _ = self.process_rx.set(rx);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn state_at_dispose(&self) -> Option<ProcessState> {
        self.state_at_dispose.lock().unwrap().clone()
    }

    pub(crate) fn state_at_terminate(&self) -> Option<ProcessState> {
        self.state_at_terminate.lock().unwrap().clone()
    }

    fn snapshot(&self, slot: &Mutex<Option<ProcessState>>) {
        if let Some(rx) = self.process_rx.get() {
            *slot.lock().unwrap() = Some(rx.borrow().clone());
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl HostShell for RecordingShell {
    async fn confirm_exit(&self) -> bool {
        self.record("confirm_exit");
        self.confirm
    }

    fn show_window(&self) {
        self.record("show_window");
    }

    fn dispose_tray(&self) {
        self.snapshot(&self.state_at_dispose);
        self.record("dispose_tray");
    }

    fn close_window_without_confirmation(&self) {
        self.record("close_window");
    }

    fn terminate(&self, code: i32) {
        self.snapshot(&self.state_at_terminate);
        self.record(format!("terminate:{code}"));
    }
}

// =============================================================================
// Health probe doubles
// =============================================================================

/// Fails `failures` times, then answers healthy. `u32::MAX` never succeeds.
pub(crate) struct ScriptedProbe {
    failures: u32,
    calls: AtomicU32,
}

impl ScriptedProbe {
    pub(crate) fn healthy_after(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            failures,
            calls: AtomicU32::new(0),
        })
    }

    pub(crate) fn never_healthy() -> Arc<Self> {
        Self::healthy_after(u32::MAX)
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn check(&self, _cancel: &CancelToken) -> ReadinessResult<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(ReadinessError::status(503))
        } else {
            Ok(())
        }
    }
}

/// Never resolves on its own; ignores the cancel token on purpose so the
/// poller has to drop it.
pub(crate) struct HangingProbe {
    pub(crate) started: Notify,
    pub(crate) release: Notify,
    dropped: Arc<AtomicBool>,
    completed: AtomicBool,
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl HangingProbe {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Notify::new(),
            release: Notify::new(),
            dropped: Arc::new(AtomicBool::new(false)),
            completed: AtomicBool::new(false),
        })
    }

    pub(crate) fn was_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }

    pub(crate) fn completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for HangingProbe {
    async fn check(&self, _cancel: &CancelToken) -> ReadinessResult<()> {
        let _in_flight = DropFlag(self.dropped.clone());
        self.started.notify_one();
        self.release.notified().await;
        self.completed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Fails forever and remembers what the poller state looked like when each
/// request was issued.
pub(crate) struct ObservingProbe {
    state_rx: OnceLock<watch::Receiver<crate::readiness::ReadinessState>>,
    seen: Mutex<Vec<crate::readiness::ReadinessState>>,
}

impl ObservingProbe {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state_rx: OnceLock::new(),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn observe(&self, rx: watch::Receiver<crate::readiness::ReadinessState>) {
        let _ = self.state_rx.set(rx);
    }

    pub(crate) fn seen(&self) -> Vec<crate::readiness::ReadinessState> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl HealthProbe for ObservingProbe {
    async fn check(&self, _cancel: &CancelToken) -> ReadinessResult<()> {
        if let Some(rx) = self.state_rx.get() {
            self.seen.lock().unwrap().push(rx.borrow().clone());
        }
        Err(ReadinessError::status(503))
    }
}

// =============================================================================
// Supervisor helpers
// =============================================================================

pub(crate) fn supervisor_with(dir: &Path, strategies: Vec<LaunchStrategy>) -> BackendSupervisor {
    BackendSupervisor::new(BackendSettings::default(), dir.to_path_buf(), strategies)
}

/// Like [`supervisor_with`] with a custom SIGTERM grace period.
#[cfg(unix)]
pub(crate) fn supervisor_with_grace(
    dir: &Path,
    strategies: Vec<LaunchStrategy>,
    grace: Duration,
) -> BackendSupervisor {
    let settings = BackendSettings {
        shutdown_timeout_ms: u64::try_from(grace.as_millis()).unwrap(),
        ..BackendSettings::default()
    };
    BackendSupervisor::new(settings, dir.to_path_buf(), strategies)
}

pub(crate) fn missing_program() -> LaunchStrategy {
    LaunchStrategy::new("missing", "ks-test-no-such-launcher", &[])
}

#[cfg(unix)]
pub(crate) fn long_running() -> LaunchStrategy {
    LaunchStrategy::new("sleep", "sleep", &["30"])
}

/// Shell that ignores SIGTERM and only dies to SIGKILL.
#[cfg(unix)]
pub(crate) fn ignores_sigterm() -> LaunchStrategy {
    LaunchStrategy::new(
        "stubborn",
        "sh",
        &["-c", "trap '' TERM; while :; do sleep 0.05; done"],
    )
}

/// Whether `pid` is still running. A zombie child of the test process is
/// reaped here and counts as gone.
#[cfg(unix)]
pub(crate) fn process_exists(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
    use nix::unistd::Pid;

    let pid = Pid::from_raw(i32::try_from(pid).unwrap());
    match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
        Ok(WaitStatus::StillAlive) => true,
        Ok(_) => false,
        Err(Errno::ECHILD) => kill(pid, None).is_ok(),
        Err(e) => panic!("waitpid({pid}) failed: {e}"),
    }
}

/// Block the current thread until `pid` is gone or `limit` passes.
#[cfg(unix)]
pub(crate) fn gone_within(pid: u32, limit: Duration) -> bool {
    let deadline = std::time::Instant::now() + limit;
    while process_exists(pid) {
        if std::time::Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(ms(20));
    }
    true
}

/// Wait (bounded) until the supervisor reports an exit.
pub(crate) async fn wait_for_exit(supervisor: &BackendSupervisor) -> ProcessState {
    let mut rx = supervisor.subscribe();
    let state = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| matches!(s, ProcessState::Exited { .. })),
    )
    .await
    .expect("backend did not exit in time")
    .expect("state channel closed");
    state.clone()
}
