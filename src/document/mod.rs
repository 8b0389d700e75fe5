//! # shelfdb Document Codec
//!
//! Reads and writes the single JSON document that backs one entity
//! collection. Reads are validated against the collection's descriptor
//! before any item is handed out as typed data.

mod codec;
mod errors;
mod types;

pub use codec::{encode, read, read_with, write};
pub use errors::{DocumentError, DocumentResult};
pub use types::{document_descriptor, Revive, StorageDocument, WriteOptions};
