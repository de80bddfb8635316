//! Desktop shell port (driven/secondary port)
//!
//! System services the tray needs from the desktop: a browser for the
//! OAuth consent page and the clipboard for share links.

/// Port trait for desktop integration
#[async_trait::async_trait]
pub trait IDesktopShell: Send + Sync {
    /// Opens `url` in the user's default browser
    async fn open_url(&self, url: &str) -> anyhow::Result<()>;

    /// Replaces the clipboard contents with `text`
    async fn write_clipboard(&self, text: &str) -> anyhow::Result<()>;
}
