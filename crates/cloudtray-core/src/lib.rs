//! CloudTray Core - Client-side orchestration for tray uploads to Google Drive
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `AuthState`, `TokenBundle`, `UploadProgressMap`, `RemoteFile`, `ViewTab`
//! - **Use cases** - `AuthController`, `UploadOrchestrator`, `RecentFilesStore`, `SettingsUseCase`
//! - **Port definitions** - Traits for adapters: `ICommandBridge`, `IDesktopShell`, `INotificationService`
//! - **Event bus** - In-process publish/subscribe hub for progress ticks and OAuth redirects
//!
//! # Architecture
//!
//! The remote Drive API lives behind the [`ports::ICommandBridge`] boundary and
//! is never called directly. Use cases coordinate bridge calls, bus events and
//! transient view state; the host crate supplies the desktop adapters.

pub mod config;
pub mod domain;
pub mod events;
pub mod ports;
pub mod usecases;
