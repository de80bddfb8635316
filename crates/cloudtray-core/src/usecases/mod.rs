//! Use cases (interactors) for CloudTray
//!
//! This module contains the application use cases that orchestrate
//! domain types and port interfaces. Use cases are thin coordinators
//! that delegate business rules to domain methods and I/O to ports.
//!
//! ## Use Cases
//!
//! - [`AuthController`] - Session check, browser login, logout
//! - [`UploadOrchestrator`] - Upload batches with progress and feedback
//! - [`RecentFilesStore`] - Recent uploads listing with optimistic deletes
//! - [`SettingsUseCase`] - Retention period and managed folder link

pub mod authenticate;
pub mod clipboard;
pub mod recent_files;
pub mod settings;
pub mod single_flight;
pub mod upload_batch;

#[cfg(test)]
pub(crate) mod mocks;

pub use authenticate::{AuthController, LoginOutcome};
pub use clipboard::LinkCopier;
pub use recent_files::RecentFilesStore;
pub use settings::SettingsUseCase;
pub use single_flight::SingleFlight;
pub use upload_batch::{UploadError, UploadOrchestrator};
