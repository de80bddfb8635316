//! CloudTray Host - Desktop adapters for the CloudTray core
//!
//! This crate provides:
//! - [`callback::LoopbackListener`] - Captures the OAuth redirect on an ephemeral loopback port
//! - [`shell::SystemShell`] - System browser and clipboard behind `IDesktopShell`
//! - [`logging::init`] - Tracing subscriber setup driven by `LoggingConfig`

use thiserror::Error;

pub mod callback;
pub mod logging;
pub mod shell;

pub use callback::LoopbackListener;
pub use shell::SystemShell;

/// Errors raised by the host adapters
#[derive(Debug, Error)]
pub enum HostError {
    /// The loopback listener could not bind or query its socket
    #[error("Callback listener error: {0}")]
    Listener(#[from] std::io::Error),

    /// The system browser could not be launched
    #[error("Failed to open browser for {url}: {source}")]
    Browser {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// The clipboard is unavailable or rejected the write
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// The tracing subscriber could not be configured
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Convenience type alias for host adapter results
pub type Result<T> = std::result::Result<T, HostError>;
