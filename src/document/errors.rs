//! # Document Codec Errors

use serde_json::Value;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::descriptor::{DescriptorError, Mismatch};

/// Result type for codec operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Document codec errors
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{}' is not well-formed JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Parsed data does not satisfy the document descriptor.
    /// Carries the raw value for diagnostics.
    #[error("'{}' does not conform to the required type: {mismatch}", .path.display())]
    Conformance {
        path: PathBuf,
        value: Value,
        mismatch: Mismatch,
    },

    /// A conforming item could not be turned into the runtime type
    #[error("failed to decode item in '{}': {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("failed to serialize document: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl DocumentError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            DocumentError::Io { .. } => "SHELF_IO",
            DocumentError::Parse { .. } => "SHELF_PARSE",
            DocumentError::Conformance { .. } => "SHELF_CONFORMANCE",
            DocumentError::Decode { .. } => "SHELF_DECODE",
            DocumentError::Descriptor(err) => err.code(),
            DocumentError::Serialize(_) => "SHELF_SERIALIZE",
        }
    }

    /// The file does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }

    /// The file exists but its content cannot be trusted
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            DocumentError::Parse { .. } | DocumentError::Conformance { .. } | DocumentError::Decode { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DocumentError::Io {
            path: path.into(),
            source,
        }
    }
}
