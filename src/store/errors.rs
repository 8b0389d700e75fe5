//! # Entity Store Errors

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::entity::EntityId;
use crate::descriptor::{DescriptorError, Mismatch};
use crate::document::DocumentError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Entity store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Caller supplied an id that can never be issued
    #[error("invalid entity id {0}: ids are positive integers")]
    InvalidId(EntityId),

    #[error("no entity under id {id} was found in '{}'", .path.display())]
    EntityNotFound { id: EntityId, path: PathBuf },

    /// Document parsed and conformed but breaks the id invariants
    #[error("'{}' violates store invariants: {reason}", .path.display())]
    InvariantViolation { path: PathBuf, reason: String },

    /// `set_id` did not take, e.g. an untyped value that is not an object
    #[error("value cannot carry entity id {id}")]
    IdRejected { id: EntityId },

    /// The counter already sits at the largest representable id
    #[error("no ids left to issue in '{}'", .path.display())]
    IdSpaceExhausted { path: PathBuf },

    /// Value would not pass the read-side check once written
    #[error("value does not conform to the store descriptor: {mismatch}")]
    Nonconforming { mismatch: Mismatch },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl StoreError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidId(_) => "SHELF_INVALID_ID",
            StoreError::EntityNotFound { .. } => "SHELF_ENTITY_NOT_FOUND",
            StoreError::InvariantViolation { .. } => "SHELF_INVARIANT_VIOLATION",
            StoreError::IdRejected { .. } => "SHELF_ID_REJECTED",
            StoreError::IdSpaceExhausted { .. } => "SHELF_ID_EXHAUSTED",
            StoreError::Nonconforming { .. } => "SHELF_NONCONFORMING_VALUE",
            StoreError::Descriptor(err) => err.code(),
            StoreError::Document(err) => err.code(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::EntityNotFound { .. })
    }

    /// The backing document exists but cannot be trusted
    pub fn is_corruption(&self) -> bool {
        match self {
            StoreError::InvariantViolation { .. } => true,
            StoreError::Document(err) => err.is_corruption(),
            _ => false,
        }
    }
}

/// Result type for config loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Config file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
