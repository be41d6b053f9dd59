use crate::readiness::ReadinessState;

/// Affordances offered once the readiness check has given up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    /// Run the readiness procedure again
    Retry,
    /// Quit the application
    Exit,
}

impl OverlayAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Retry => "Retry",
            Self::Exit => "Exit",
        }
    }

    /// Parse a console shortcut (`r`/`retry`, `e`/`exit`).
    pub fn from_input(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "r" | "retry" => Some(Self::Retry),
            "e" | "exit" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Blocking overlay the UI shows until the backend is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessOverlay {
    /// Backend answered; the UI is interactive
    Hidden,
    /// Still polling
    StartingUp { attempts: u32, elapsed_ms: u64 },
    /// Gave up; only `actions` are available
    Failed {
        message: String,
        actions: [OverlayAction; 2],
    },
}

impl ReadinessOverlay {
    pub fn blocks_interaction(&self) -> bool {
        !matches!(self, Self::Hidden)
    }

    pub fn headline(&self) -> String {
        match self {
            Self::Hidden => "Backend ready".into(),
            Self::StartingUp {
                attempts,
                elapsed_ms,
            } => format!(
                "Starting backend service... (attempt {attempts}, {:.1}s)",
                *elapsed_ms as f64 / 1000.0
            ),
            Self::Failed { message, actions } => {
                let choices = actions
                    .iter()
                    .map(OverlayAction::label)
                    .collect::<Vec<_>>()
                    .join(" / ");
                format!("{message} [{choices}]")
            }
        }
    }
}

impl From<&ReadinessState> for ReadinessOverlay {
    fn from(state: &ReadinessState) -> Self {
        if state.ready {
            return Self::Hidden;
        }

        match &state.error {
            Some(message) => Self::Failed {
                message: message.clone(),
                actions: [OverlayAction::Retry, OverlayAction::Exit],
            },
            None => Self::StartingUp {
                attempts: state.attempts,
                elapsed_ms: state.elapsed_ms,
            },
        }
    }
}
