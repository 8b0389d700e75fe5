//! Observability for shelfdb
//!
//! Logging goes through `tracing`; the library never installs a subscriber.
//! Store lifecycle and mutation records carry a typed [`StoreEvent`] name.

mod events;

pub use events::StoreEvent;
