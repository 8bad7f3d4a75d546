//! String identifiers as issued by the document store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque entity ID.
///
/// IDs are compared by value only; display names live on the entity itself
/// and may collide across distinct IDs.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new EntityId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Type alias for player IDs
pub type PlayerId = EntityId;

/// Type alias for play IDs
pub type PlayId = EntityId;

/// Type alias for game definition IDs
pub type GameId = EntityId;

/// Type alias for scoring and misc field IDs
pub type FieldId = EntityId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_serializes_as_plain_string() {
        let id = EntityId::from("player-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"player-1\"");

        let deserialized: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_entity_id_display() {
        let id = EntityId::new("abc123");
        assert_eq!(format!("{}", id), "abc123");
    }

    #[test]
    fn test_entity_id_debug() {
        let id = EntityId::new("debug-test");
        let debug_str = format!("{:?}", id);
        assert!(debug_str.contains("debug-test"));
    }

    #[test]
    fn test_entity_id_ordering_is_lexicographic() {
        let a = EntityId::from("a");
        let b = EntityId::from("b");
        assert!(a < b);
    }

    #[test]
    fn test_entity_id_equality() {
        let id1 = EntityId::from("same");
        let id2 = EntityId::from("same".to_string());
        let id3 = EntityId::from("different");
        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }
}
