//! Size limits for documents
//!
//! Limits are enforced by the document engine on every committed revision
//! and on path construction. They are configurable through the `[document]`
//! section of `annota.toml`.

use crate::json::{JsonPath, JsonValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum serialized document size (16 MB)
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Default maximum nesting depth
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 100;

/// Default maximum path length in segments
pub const DEFAULT_MAX_PATH_LENGTH: usize = 256;

/// Error type for document limit violations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LimitError {
    /// Document exceeds maximum size
    #[error("document size {size} exceeds maximum of {max} bytes")]
    DocumentTooLarge {
        /// Actual document size
        size: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// Document nesting exceeds maximum depth
    #[error("document nesting depth {depth} exceeds maximum of {max} levels")]
    NestingTooDeep {
        /// Actual nesting depth
        depth: usize,
        /// Maximum allowed depth
        max: usize,
    },

    /// Path exceeds maximum length
    #[error("path length {length} exceeds maximum of {max} segments")]
    PathTooLong {
        /// Actual path length
        length: usize,
        /// Maximum allowed length
        max: usize,
    },
}

/// Size limits for documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentLimits {
    /// Maximum serialized document size in bytes
    pub max_document_size: usize,

    /// Maximum nesting depth
    pub max_nesting_depth: usize,

    /// Maximum path length in segments
    pub max_path_length: usize,
}

impl Default for DocumentLimits {
    fn default() -> Self {
        DocumentLimits {
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
        }
    }
}

impl DocumentLimits {
    /// Create limits with small values for testing
    pub fn with_small_limits() -> Self {
        DocumentLimits {
            max_document_size: 1000,
            max_nesting_depth: 4,
            max_path_length: 8,
        }
    }

    /// Validate a whole document
    pub fn validate_document(&self, value: &JsonValue) -> Result<(), LimitError> {
        let depth = value.nesting_depth();
        if depth > self.max_nesting_depth {
            return Err(LimitError::NestingTooDeep {
                depth,
                max: self.max_nesting_depth,
            });
        }
        let size = value.size_bytes();
        if size > self.max_document_size {
            return Err(LimitError::DocumentTooLarge {
                size,
                max: self.max_document_size,
            });
        }
        Ok(())
    }

    /// Validate a path length
    pub fn validate_path(&self, path: &JsonPath) -> Result<(), LimitError> {
        if path.len() > self.max_path_length {
            Err(LimitError::PathTooLong {
                length: path.len(),
                max: self.max_path_length,
            })
        } else {
            Ok(())
        }
    }
}
