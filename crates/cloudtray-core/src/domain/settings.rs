//! User-facing settings record

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Retention periods (hours) offered by the settings view
pub const RETENTION_OPTIONS: &[i64] = &[1, 3, 12, 24, 48, 72];

/// Settings persisted by the bridge
///
/// Uploads older than `retention_hours` are pruned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    pub retention_hours: i64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            retention_hours: 24,
        }
    }
}

impl AppSettings {
    /// Builds settings with a retention period from [`RETENTION_OPTIONS`]
    pub fn with_retention(hours: i64) -> Result<Self, DomainError> {
        if RETENTION_OPTIONS.contains(&hours) {
            Ok(Self {
                retention_hours: hours,
            })
        } else {
            Err(DomainError::InvalidRetention(hours))
        }
    }
}
