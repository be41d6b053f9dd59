/// Liveness of the backend child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessState {
    /// No child has been spawned yet
    NotStarted,
    /// Child is alive
    Running { pid: u32 },
    /// Termination signal sent, exit not yet observed
    Stopping { pid: u32 },
    /// Child has exited, on request or on its own
    Exited { code: Option<i32> },
}

impl ProcessState {
    /// Whether a child currently occupies the single process slot.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running { .. } | Self::Stopping { .. })
    }

    pub fn pid(&self) -> Option<u32> {
        match self {
            Self::Running { pid } | Self::Stopping { pid } => Some(*pid),
            _ => None,
        }
    }
}
