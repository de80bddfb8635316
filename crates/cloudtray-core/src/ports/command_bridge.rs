//! Command bridge port (driven/secondary port)
//!
//! This module defines the request/response boundary to the backend that
//! talks to Google Drive, stores tokens and settings, and runs the OAuth
//! loopback listener. The core never performs these operations itself.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific
//!   and the use cases only need to know that a call failed.
//! - Uses `#[async_trait]` for async trait methods.
//! - While `upload_file` / `upload_file_path` run, the implementation publishes
//!   `upload-progress` ticks on the event bus keyed by the file name.

use std::path::Path;

use crate::domain::{AppSettings, ClientCredentials, FolderHandle, RemoteFile, TokenBundle};

/// Port trait for the backend command surface
///
/// Every method is one named operation of the backend and corresponds to a
/// single asynchronous request/response round trip.
#[async_trait::async_trait]
pub trait ICommandBridge: Send + Sync {
    /// Returns the managed folder, creating it on first use
    ///
    /// Must be idempotent: concurrent callers may both attempt creation.
    async fn get_or_create_app_folder(&self) -> anyhow::Result<FolderHandle>;

    /// Uploads in-memory contents into `folder_id`
    ///
    /// # Arguments
    /// * `content` - The file contents
    /// * `file_name` - Remote file name, also the progress key
    /// * `folder_id` - Target folder
    async fn upload_file(
        &self,
        content: &[u8],
        file_name: &str,
        folder_id: &str,
    ) -> anyhow::Result<RemoteFile>;

    /// Uploads a file the backend reads from `path`
    async fn upload_file_path(&self, path: &Path, folder_id: &str) -> anyhow::Result<RemoteFile>;

    /// Lists the most recently modified files of the managed folder
    async fn list_recent_files(&self) -> anyhow::Result<Vec<RemoteFile>>;

    /// Deletes a remote file by id
    async fn delete_file(&self, file_id: &str) -> anyhow::Result<()>;

    /// Registers the OAuth client used for code exchange and refresh
    async fn set_credentials(&self, credentials: &ClientCredentials) -> anyhow::Result<()>;

    /// Returns the cached token, validated or refreshed by the backend
    ///
    /// Fails when no token is stored (first run) or it cannot be refreshed.
    async fn get_tokens(&self) -> anyhow::Result<TokenBundle>;

    /// Exchanges an authorization code for tokens
    ///
    /// `redirect_uri` must equal the one used in the authorization request.
    async fn exchange_auth_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> anyhow::Result<TokenBundle>;

    /// Persists a token bundle
    async fn save_tokens(&self, tokens: &TokenBundle) -> anyhow::Result<()>;

    /// Deletes the stored token
    async fn logout(&self) -> anyhow::Result<()>;

    /// Starts the loopback listener and returns its ephemeral port
    ///
    /// The listener publishes the redirected URL on the `oauth_callback` topic.
    async fn start_oauth_server(&self) -> anyhow::Result<u16>;

    /// Loads settings, writing defaults when none exist
    async fn load_or_create_config(&self) -> anyhow::Result<AppSettings>;

    /// Persists settings
    async fn save_config(&self, settings: &AppSettings) -> anyhow::Result<()>;
}
