/// Entries of the tray menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    /// Bring the window to front, or create it if none exists
    ShowWindow,
    /// Run the shutdown sequence
    Exit,
}

impl TrayAction {
    pub const ALL: [TrayAction; 2] = [TrayAction::ShowWindow, TrayAction::Exit];

    pub fn menu_id(&self) -> &'static str {
        match self {
            Self::ShowWindow => "show",
            Self::Exit => "quit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ShowWindow => "Show Window",
            Self::Exit => "Exit",
        }
    }

    pub fn from_menu_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.menu_id() == id)
    }
}
