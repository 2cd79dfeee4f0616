//! Error types for annota
//!
//! One error enum is shared by every layer (document engine, references,
//! context, diff engine). We use `thiserror` for the `Display` and `Error`
//! implementations.
//!
//! Error kinds map onto how callers are expected to react:
//! - Construction / stale lookups (`PathNotFound`, `KeyNotFound`, `NotText`,
//!   `OffsetOutOfRange`): recoverable, the caller skips the item
//! - `Unsupported`: a shape the code refuses to guess about; surfaced loudly
//! - `Config`, `Io`: configuration loading failures

use crate::json::{JsonPath, JsonPathError, JsonValue, PathParseError};
use crate::limits::LimitError;
use crate::types::Revision;
use std::io;
use thiserror::Error;

/// Result type alias for annota operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for annota
#[derive(Debug, Error)]
pub enum Error {
    /// Nothing exists at the path
    #[error("no value at path '{path}'")]
    PathNotFound {
        /// The path that failed to resolve
        path: JsonPath,
    },

    /// No element with the given key in the array at the path
    #[error("no element with {field} = {key} in array at '{path}'")]
    KeyNotFound {
        /// Path of the array
        path: JsonPath,
        /// Name of the key property
        field: String,
        /// Key value that was looked up
        key: JsonValue,
    },

    /// The value at the path is not text
    #[error("value at path '{path}' is not text")]
    NotText {
        /// The path holding a non-text value
        path: JsonPath,
    },

    /// A text offset past the end of the text
    #[error("offset {offset} is out of range for text of length {len}")]
    OffsetOutOfRange {
        /// Requested offset
        offset: usize,
        /// Length of the text in chars
        len: usize,
    },

    /// The document has no such revision
    #[error("revision {revision} does not exist")]
    RevisionNotFound {
        /// The missing revision
        revision: Revision,
    },

    /// An operation or patch shape that is not implemented
    #[error("not implemented: {0}")]
    Unsupported(String),

    /// Path syntax error
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathParseError),

    /// Path mutation error
    #[error("path operation failed at '{path}': {source}")]
    PathOperation {
        /// Path being mutated
        path: JsonPath,
        /// Underlying failure
        source: JsonPathError,
    },

    /// Document limit violated
    #[error("limit exceeded: {0}")]
    Limit(#[from] LimitError),

    /// Configuration could not be loaded or written
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this is a stale-location error the caller can recover from by
    /// skipping the item
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::PathNotFound { .. } | Error::KeyNotFound { .. } | Error::RevisionNotFound { .. }
        )
    }

    /// Convenience constructor for [`Error::Unsupported`]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::Unsupported(message.into())
    }

    /// Wrap a [`JsonPathError`] raised while mutating `path`
    pub fn path_operation(path: &JsonPath, source: JsonPathError) -> Self {
        match source {
            JsonPathError::NotFound => Error::PathNotFound { path: path.clone() },
            source => Error::PathOperation {
                path: path.clone(),
                source,
            },
        }
    }
}
