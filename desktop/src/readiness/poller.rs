//! Polls the health endpoint until the backend answers or a timeout elapses.

use crate::config::ReadinessSettings;
use crate::readiness::{BACKEND_UNAVAILABLE_MESSAGE, CancelToken, HealthProbe, ReadinessState};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Activate a poller with explicit interval and timeout.
pub fn observe_readiness(
    probe: Arc<dyn HealthProbe>,
    poll_interval: Duration,
    timeout: Duration,
) -> ReadinessPoller {
    ReadinessPoller::activate(probe, poll_interval, timeout)
}

/// Drives [`ReadinessState`] for one UI context.
///
/// At most one polling loop runs at a time. Every loop (generation) owns a
/// [`CancelToken`]; `retry()` and teardown cancel it, and the loop checks the
/// token before every state write, so an abandoned loop never publishes
/// anything. Dropping the poller tears it down.
pub struct ReadinessPoller {
    probe: Arc<dyn HealthProbe>,
    poll_interval: Duration,
    timeout: Duration,
    state_tx: Arc<watch::Sender<ReadinessState>>,
    generation: Mutex<CancelToken>,
}

impl ReadinessPoller {
    /// Start polling immediately. Must be called inside a Tokio runtime.
    pub fn activate(probe: Arc<dyn HealthProbe>, poll_interval: Duration, timeout: Duration) -> Self {
        let (state_tx, _) = watch::channel(ReadinessState::default());
        let token = CancelToken::new();

        let poller = Self {
            probe,
            poll_interval,
            timeout,
            state_tx: Arc::new(state_tx),
            generation: Mutex::new(token.clone()),
        };
        poller.spawn_generation(token);
        poller
    }

    pub fn from_settings(probe: Arc<dyn HealthProbe>, settings: &ReadinessSettings) -> Self {
        Self::activate(probe, settings.poll_interval(), settings.timeout())
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ReadinessState {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to state changes. The receiver keeps the last value after
    /// teardown.
    pub fn subscribe(&self) -> watch::Receiver<ReadinessState> {
        self.state_tx.subscribe()
    }

    /// Abandon the current loop and start over with fresh counters.
    pub fn retry(&self) {
        let mut current = self.lock_generation();
        self.cancel_generation(&current);

        let token = CancelToken::new();
        *current = token.clone();

        self.state_tx.send_modify(|state| {
            *state = ReadinessState::for_generation(state.retry_token + 1);
        });
        info!(
            "Retrying backend readiness check (retry {})",
            self.state_tx.borrow().retry_token
        );

        self.spawn_generation(token);
    }

    /// Stop polling for good. Idempotent.
    pub fn teardown(&self) {
        let current = self.lock_generation();
        self.cancel_generation(&current);
    }

    /// Cancel `token` and wait out any state write already in progress, so
    /// nothing from that generation becomes visible afterwards.
    fn cancel_generation(&self, token: &CancelToken) {
        token.cancel();
        drop(self.state_tx.borrow());
    }

    fn lock_generation(&self) -> MutexGuard<'_, CancelToken> {
        self.generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_generation(&self, token: CancelToken) {
        tokio::spawn(poll_until_settled(
            self.probe.clone(),
            self.poll_interval,
            self.timeout,
            self.state_tx.clone(),
            token,
        ));
    }
}

impl Drop for ReadinessPoller {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn poll_until_settled(
    probe: Arc<dyn HealthProbe>,
    poll_interval: Duration,
    timeout: Duration,
    state_tx: Arc<watch::Sender<ReadinessState>>,
    token: CancelToken,
) {
    let started = Instant::now();

    loop {
        if !publish(&state_tx, &token, |state| state.attempts += 1) {
            return;
        }

        let outcome = tokio::select! {
            outcome = probe.check(&token) => outcome,
            _ = token.cancelled() => return,
        };

        match outcome {
            Ok(()) => {
                if publish(&state_tx, &token, |state| state.ready = true) {
                    info!(
                        "Backend ready after {} attempt(s)",
                        state_tx.borrow().attempts
                    );
                }
                return;
            }
            Err(e) => {
                let elapsed = started.elapsed();
                let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
                let timed_out = elapsed >= timeout;
                if e.is_transient() {
                    debug!("Backend not ready after {elapsed_ms}ms: {e}");
                } else {
                    warn!("Health check abandoned after {elapsed_ms}ms, counting as failure: {e}");
                }

                let published = publish(&state_tx, &token, |state| {
                    state.elapsed_ms = elapsed_ms;
                    if timed_out {
                        state.error = Some(BACKEND_UNAVAILABLE_MESSAGE.to_string());
                    }
                });
                if !published {
                    return;
                }

                if timed_out {
                    warn!(
                        "Backend did not become ready within {}ms",
                        timeout.as_millis()
                    );
                    return;
                }

                tokio::select! {
                    _ = tokio::time::sleep(poll_interval) => {}
                    _ = token.cancelled() => return,
                }
            }
        }
    }
}

/// Apply `mutate` unless the generation was cancelled. The token is checked
/// under the channel's write lock; returns `false` once cancelled.
fn publish(
    state_tx: &watch::Sender<ReadinessState>,
    token: &CancelToken,
    mutate: impl FnOnce(&mut ReadinessState),
) -> bool {
    state_tx.send_if_modified(|state| {
        if token.is_cancelled() {
            return false;
        }
        mutate(state);
        true
    })
}
