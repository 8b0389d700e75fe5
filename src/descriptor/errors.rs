//! Descriptor error types
//!
//! A descriptor error means the *descriptor* is malformed, never that a value
//! failed to match. It is always fatal to the operation that hit it.

use thiserror::Error;

/// Result type for descriptor operations
pub type DescriptorResult<T> = Result<T, DescriptorError>;

/// Malformed type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// A tuple (or arity-overloaded array) descriptor built from no elements
    #[error("type descriptor sequence at '{path}' requires at least one item")]
    EmptySequence { path: String },

    /// `TypeDescriptor::tuple` called with a single element
    #[error("fixed tuple descriptor requires at least two items, got {len}")]
    TupleTooShort { len: usize },
}

impl DescriptorError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            DescriptorError::EmptySequence { .. } => "SHELF_DESCRIPTOR_EMPTY_SEQUENCE",
            DescriptorError::TupleTooShort { .. } => "SHELF_DESCRIPTOR_TUPLE_TOO_SHORT",
        }
    }

    pub(crate) fn empty_sequence(path: impl Into<String>) -> Self {
        DescriptorError::EmptySequence { path: path.into() }
    }
}
