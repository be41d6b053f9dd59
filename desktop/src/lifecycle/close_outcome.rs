/// Result of a window close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Shutdown already under way; the close goes through untouched
    Proceed,
    /// User confirmed; the application shut down
    Confirmed,
    /// User cancelled; nothing changed
    Cancelled,
}
