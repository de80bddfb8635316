//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including invalid state transitions and rejected setting values.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid state transition attempt
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },

    /// Retention period not among the offered options
    #[error("Invalid retention period: {0} hours")]
    InvalidRetention(i64),

    /// File name could not be derived from an upload source
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
