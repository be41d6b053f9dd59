use async_trait::async_trait;

/// The windowing toolkit as seen by the lifecycle: primary window, tray and
/// the host process itself.
#[async_trait]
pub trait HostShell: Send + Sync {
    /// Blocking confirm/cancel prompt shown on window close. `true` means
    /// the user chose to exit.
    async fn confirm_exit(&self) -> bool;

    /// Bring the primary window to front, creating it if none exists.
    fn show_window(&self);

    /// Remove the tray icon and release its resources.
    fn dispose_tray(&self);

    /// Close the primary window, bypassing its close-confirmation flow.
    fn close_window_without_confirmation(&self);

    /// End the host process with `code`.
    fn terminate(&self, code: i32);
}
