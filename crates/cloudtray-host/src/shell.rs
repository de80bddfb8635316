//! System browser and clipboard adapter

use std::sync::{Mutex, PoisonError};

use anyhow::Context;
use arboard::Clipboard;
use async_trait::async_trait;
use cloudtray_core::ports::IDesktopShell;
use tracing::debug;

use crate::HostError;

/// [`IDesktopShell`] backed by the desktop's default browser and clipboard
///
/// The clipboard handle is created on first use and kept for the lifetime of
/// the shell. On X11 and Wayland the copied text is only served while its
/// owner is alive.
#[derive(Default)]
pub struct SystemShell {
    clipboard: Mutex<Option<Clipboard>>,
}

impl std::fmt::Debug for SystemShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemShell").finish_non_exhaustive()
    }
}

impl SystemShell {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_clipboard_text(&self, text: &str) -> Result<(), HostError> {
        let mut slot = self.clipboard.lock().unwrap_or_else(PoisonError::into_inner);
        let clipboard = match slot.take() {
            Some(clipboard) => clipboard,
            None => Clipboard::new()
                .map_err(|e| HostError::Clipboard(format!("init failed: {e}")))?,
        };
        slot.insert(clipboard)
            .set_text(text)
            .map_err(|e| HostError::Clipboard(format!("write failed: {e}")))
    }
}

#[async_trait]
impl IDesktopShell for SystemShell {
    async fn open_url(&self, url: &str) -> anyhow::Result<()> {
        let target = url.to_string();
        tokio::task::spawn_blocking(move || {
            webbrowser::open(&target).map_err(|source| HostError::Browser {
                url: target.clone(),
                source,
            })
        })
        .await
        .context("Browser launch task failed")??;
        debug!(url, "Opened browser");
        Ok(())
    }

    async fn write_clipboard(&self, text: &str) -> anyhow::Result<()> {
        self.set_clipboard_text(text)?;
        debug!(len = text.len(), "Clipboard updated");
        Ok(())
    }
}
