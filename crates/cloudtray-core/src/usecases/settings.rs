//! Settings use case
//!
//! Loads and updates the retention period and resolves the managed folder
//! link shown in the settings view.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::{domain::AppSettings, ports::ICommandBridge};

/// Use case backing the settings view
pub struct SettingsUseCase {
    bridge: Arc<dyn ICommandBridge>,
}

impl SettingsUseCase {
    pub fn new(bridge: Arc<dyn ICommandBridge>) -> Self {
        Self { bridge }
    }

    /// Current settings, created with defaults on first run
    pub async fn load(&self) -> Result<AppSettings> {
        self.bridge
            .load_or_create_config()
            .await
            .context("Failed to load settings")
    }

    /// Validates and persists a new retention period
    ///
    /// # Errors
    ///
    /// Returns an error if `hours` is not one of the offered options (nothing
    /// is saved) or the bridge fails to persist.
    pub async fn update_retention(&self, hours: i64) -> Result<AppSettings> {
        let settings = AppSettings::with_retention(hours)?;
        self.bridge
            .save_config(&settings)
            .await
            .context("Failed to save settings")?;
        info!(retention_hours = hours, "Retention updated");
        Ok(settings)
    }

    /// Browser URL of the managed folder
    pub async fn folder_url(&self) -> Result<String> {
        let folder = self
            .bridge
            .get_or_create_app_folder()
            .await
            .context("Failed to resolve managed folder")?;
        Ok(folder.web_url())
    }
}
