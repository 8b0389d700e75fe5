//! shelfdb - A schema-validated, file-backed JSON entity store
//!
//! Subsystems, leaves first:
//! - `descriptor`: type descriptors and the conformance evaluator
//! - `document`: the on-disk `{nextId, items}` document codec
//! - `store`: the CRUD repository with auto-assigned ids
//! - `observability`: typed store events for `tracing`

pub mod descriptor;
pub mod document;
pub mod observability;
pub mod store;
