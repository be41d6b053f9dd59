use std::sync::atomic::{AtomicBool, Ordering};

/// One-shot "shutting down" flag. Set once, never reset.
#[derive(Debug, Default)]
pub struct ShutdownState {
    is_shutting_down: AtomicBool,
}

impl ShutdownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the shutdown. Only the first caller gets `true`.
    pub fn try_begin(&self) -> bool {
        self.is_shutting_down
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.is_shutting_down.load(Ordering::Acquire)
    }
}
