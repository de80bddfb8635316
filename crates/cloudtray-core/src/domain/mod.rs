//! Domain entities and business rules
//!
//! This module contains the core domain types for CloudTray:
//! - Authentication state machine and token hand-off types
//! - Upload batch, progress and result types
//! - Remote file and managed folder types
//! - Settings and UI view-state values
//! - Domain-specific error types

pub mod auth;
pub mod errors;
pub mod files;
pub mod newtypes;
pub mod settings;
pub mod upload;
pub mod view;

// Re-export commonly used types
pub use auth::{AuthState, ClientCredentials, TokenBundle};
pub use errors::DomainError;
pub use files::{FolderHandle, RecentFile, RemoteFile, APP_FOLDER_NAME};
pub use newtypes::BatchId;
pub use settings::{AppSettings, RETENTION_OPTIONS};
pub use upload::{
    FailurePolicy, UploadBatch, UploadBatchResult, UploadMode, UploadProgressMap, UploadSource,
    STARTED_PERCENT,
};
pub use view::ViewTab;
