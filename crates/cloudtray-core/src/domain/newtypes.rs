//! Domain newtypes
//!
//! Strongly-typed identifiers used by the use cases.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for one upload batch (a single drop or file-picker action)
///
/// Scheduled cleanups carry the id of the batch that created them and only
/// act while that batch still owns the upload view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    /// Create a new random BatchId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a BatchId from an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for BatchId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_ids_are_unique() {
        let a = BatchId::new();
        let b = BatchId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_batch_id_display_matches_uuid() {
        let uuid = Uuid::new_v4();
        let id = BatchId::from_uuid(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
        assert_eq!(id.as_uuid(), &uuid);
    }
}
