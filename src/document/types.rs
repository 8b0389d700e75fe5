//! On-disk document model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::descriptor::TypeDescriptor;

/// The single persisted unit of an entity collection.
///
/// Serialized as `{"nextId": <n>, "items": [...]}`, fields in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDocument<T> {
    /// Strictly greater than every id ever issued for this collection
    pub next_id: u64,
    /// Items in insertion order
    pub items: Vec<T>,
}

impl<T> StorageDocument<T> {
    pub fn new(next_id: u64, items: Vec<T>) -> Self {
        Self { next_id, items }
    }

    /// `{nextId: 1, items: []}`
    pub fn empty() -> Self {
        Self::new(1, Vec::new())
    }
}

/// Transform from a validated wire item to the runtime item type.
///
/// Trusted: its input has already passed conformance and its output is not
/// checked again.
pub type Revive<T> = Arc<dyn Fn(Value) -> T + Send + Sync>;

/// Descriptor the whole document must satisfy for a given item descriptor.
pub fn document_descriptor(item: TypeDescriptor) -> TypeDescriptor {
    TypeDescriptor::shape([
        ("nextId", TypeDescriptor::number()),
        ("items", TypeDescriptor::array_of(item)),
    ])
}

/// Serialization options for [`write`](super::write).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Spaces per indentation level
    pub indent: usize,
    /// Write through a temp file and rename over the target
    pub atomic: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent: 4,
            atomic: true,
        }
    }
}
