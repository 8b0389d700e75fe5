//! Identifiable records

use serde_json::Value;

/// Entity identifier. `0` is never issued and is rejected as an argument.
pub type EntityId = u64;

/// A record carrying a mutable positive-integer id.
///
/// Otherwise opaque to the store.
pub trait Identifiable {
    fn id(&self) -> EntityId;
    fn set_id(&mut self, id: EntityId);
}

/// Implements [`Identifiable`] for a struct with a plain `EntityId` field
/// (named `id` unless given).
///
/// ```ignore
/// struct User { id: u64, name: String }
/// shelfdb::impl_identifiable!(User);
/// ```
#[macro_export]
macro_rules! impl_identifiable {
    ($ty:ty) => {
        $crate::impl_identifiable!($ty, id);
    };
    ($ty:ty, $field:ident) => {
        impl $crate::store::Identifiable for $ty {
            fn id(&self) -> $crate::store::EntityId {
                self.$field
            }

            fn set_id(&mut self, id: $crate::store::EntityId) {
                self.$field = id;
            }
        }
    };
}

/// Untyped records: the id lives in the `"id"` field of a JSON object.
///
/// A missing or non-integer `"id"` reads as `0`. `set_id` on a non-object
/// value is a no-op, so the store refuses to insert one.
impl Identifiable for Value {
    fn id(&self) -> EntityId {
        self.get("id").and_then(Value::as_u64).unwrap_or(0)
    }

    fn set_id(&mut self, id: EntityId) {
        if let Value::Object(fields) = self {
            fields.insert("id".to_string(), Value::from(id));
        }
    }
}
