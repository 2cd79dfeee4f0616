//! Core types and traits for annota
//!
//! This crate defines the foundational types every other annota crate uses:
//! - JsonValue / JsonPath: the document model and addressing
//! - DocPatch: structural change records between revisions
//! - DocId, Revision, Cursor: document identity, history and text anchors
//! - DocumentEngine: the interface consumed from a document engine
//! - Error: the shared error taxonomy
//! - DocumentLimits, AnnotaConfig: limits and `annota.toml` configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod json;
pub mod limits;
pub mod patch;
pub mod traits;
pub mod types;

pub use config::{AnnotaConfig, DiffConfig, LoggingConfig, CONFIG_FILE_NAME};
pub use error::{Error, Result};
pub use json::{
    char_slice, delete_at_path, get_at_path, get_at_path_mut, insert_at_path, set_at_path,
    splice_chars, JsonPath, JsonPathError, JsonValue, PathParseError, PathSegment,
};
pub use limits::{
    DocumentLimits, LimitError, DEFAULT_MAX_DOCUMENT_SIZE, DEFAULT_MAX_NESTING_DEPTH,
    DEFAULT_MAX_PATH_LENGTH,
};
pub use patch::{DocPatch, PatchAction};
pub use traits::{ChangeListener, DocHandle, DocumentEngine};
pub use types::{Cursor, DocId, ListenerId, Revision};
