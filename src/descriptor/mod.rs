//! Type descriptor subsystem for shelfdb
//!
//! Every document read from disk is checked against a descriptor before it is
//! trusted as typed data.
//!
//! # Design Principles
//!
//! - Closed set of descriptor kinds, evaluated by exhaustive match
//! - Structural, open-world object matching
//! - Absent values and `null` are distinct
//! - Malformed descriptors are errors, not `false`

mod conformance;
mod errors;
mod types;

pub use conformance::{check, conforms, conforms_value, narrow, Mismatch};
pub use errors::{DescriptorError, DescriptorResult};
pub use types::{Predicate, PrimitiveTag, TypeDescriptor};
