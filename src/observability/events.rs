//! Observable store events
//!
//! Events are explicit and typed; they are emitted as the `event` field of
//! `tracing` records under the `shelfdb::store` target.

use std::fmt;

/// Observable events in an entity store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    // Lifecycle
    /// Existing document adopted on initialize
    StoreInitialized,
    /// No document existed; a fresh one was written
    StoreCreated,
    /// Unreadable document replaced by a fresh one
    StoreRecovered,
    /// Unreadable document moved aside before recovery
    CorruptBackedUp,

    // Mutations
    /// Entity appended
    EntityInserted,
    /// Entity replaced in place
    EntityUpdated,
    /// Entity removed
    EntityDeleted,
}

impl StoreEvent {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreEvent::StoreInitialized => "STORE_INITIALIZED",
            StoreEvent::StoreCreated => "STORE_CREATED",
            StoreEvent::StoreRecovered => "STORE_RECOVERED",
            StoreEvent::CorruptBackedUp => "CORRUPT_DOCUMENT_BACKED_UP",
            StoreEvent::EntityInserted => "ENTITY_INSERTED",
            StoreEvent::EntityUpdated => "ENTITY_UPDATED",
            StoreEvent::EntityDeleted => "ENTITY_DELETED",
        }
    }

    /// Returns true if the event means previously stored data was discarded or moved
    pub fn is_recovery(&self) -> bool {
        matches!(self, StoreEvent::StoreRecovered | StoreEvent::CorruptBackedUp)
    }
}

impl fmt::Display for StoreEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(StoreEvent::StoreCreated.as_str(), "STORE_CREATED");
        assert_eq!(StoreEvent::EntityDeleted.to_string(), "ENTITY_DELETED");
    }

    #[test]
    fn test_recovery_events() {
        assert!(StoreEvent::StoreRecovered.is_recovery());
        assert!(StoreEvent::CorruptBackedUp.is_recovery());
        assert!(!StoreEvent::StoreCreated.is_recovery());
        assert!(!StoreEvent::EntityInserted.is_recovery());
    }
}
