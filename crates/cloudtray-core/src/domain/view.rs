//! Tray window view state

use serde::{Deserialize, Serialize};

use super::auth::AuthState;

/// Which page of the tray window is shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewTab {
    /// Drop area, login button and main menu
    #[default]
    Upload,
    /// Retention period and managed folder link
    Settings,
    /// Recent uploads with copy/delete actions
    Recents,
    /// Application information
    About,
}

impl ViewTab {
    /// Returns true if the tab may be shown in the given auth state
    pub fn is_reachable(&self, auth: AuthState) -> bool {
        match self {
            ViewTab::Upload | ViewTab::About => true,
            ViewTab::Settings | ViewTab::Recents => auth.is_authenticated(),
        }
    }

    /// Resolves a navigation request, falling back to `Upload` when gated
    pub fn resolve(requested: ViewTab, auth: AuthState) -> ViewTab {
        if requested.is_reachable(auth) {
            requested
        } else {
            ViewTab::Upload
        }
    }
}
