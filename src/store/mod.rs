//! Entity store subsystem for shelfdb
//!
//! A generic repository over one JSON document per collection.
//!
//! # Guarantees
//!
//! - Every read is validated against the collection's descriptor
//! - Ids are positive, unique, and never reissued by an instance
//! - Mutations rewrite the whole document; nothing is cached but `nextId`
//! - Operations on one instance are serialized
//!
//! # Usage
//!
//! ```ignore
//! use shelfdb::descriptor::TypeDescriptor;
//! use shelfdb::store::EntityStore;
//!
//! let store = EntityStore::<User>::new("users.json", TypeDescriptor::shape([
//!     ("name", TypeDescriptor::string()),
//!     ("age", TypeDescriptor::number()),
//! ]))?;
//! store.initialize().await?;
//! let id = store.insert(user).await?;
//! ```

mod config;
mod entity;
mod errors;
mod store;

pub use config::{RecoveryPolicy, StoreConfig};
pub use entity::{EntityId, Identifiable};
pub use errors::{ConfigError, ConfigResult, StoreError, StoreResult};
pub use store::EntityStore;
