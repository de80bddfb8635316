//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the use cases depend
//! on, but whose implementations live in the host application.
//!
//! ## Ports Overview
//!
//! - [`ICommandBridge`] - Named remote operations (Drive API, token store, loopback listener)
//! - [`IDesktopShell`] - System browser and clipboard
//! - [`INotificationService`] - Transient feedback messages shown to the user

pub mod command_bridge;
pub mod desktop;
pub mod notification;

pub use command_bridge::ICommandBridge;
pub use desktop::IDesktopShell;
pub use notification::{INotificationService, Notification, NotificationKind};
