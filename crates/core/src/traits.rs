//! Document engine abstraction
//!
//! The annotation layer never owns documents. It talks to whatever engine
//! holds them through [`DocumentEngine`], so a CRDT-backed engine and the
//! in-memory engine from `annota-document` are interchangeable.
//!
//! Thread safety: implementations must be `Send + Sync`. The annotation layer
//! never holds its own locks while calling into an engine.

use crate::error::Result;
use crate::json::{JsonPath, JsonValue};
use crate::patch::DocPatch;
use crate::types::{Cursor, DocId, ListenerId, Revision};
use std::sync::Arc;

/// Callback invoked after a document commits a new revision
pub type ChangeListener = Arc<dyn Fn(Revision) + Send + Sync>;

/// Shared handle to a document engine
pub type DocHandle = Arc<dyn DocumentEngine>;

/// Interface consumed from the document engine
pub trait DocumentEngine: Send + Sync {
    /// Identity of this document instance
    fn doc_id(&self) -> DocId;

    /// The latest committed revision
    fn heads(&self) -> Revision;

    /// Resolve the value at `path`, at the latest revision or at `at`
    ///
    /// Returns `Ok(None)` when nothing exists at the path.
    ///
    /// # Errors
    ///
    /// `RevisionNotFound` when `at` is not part of the history.
    fn resolve(&self, path: &JsonPath, at: Option<Revision>) -> Result<Option<JsonValue>>;

    /// Structural patches turning revision `from` into revision `to`
    ///
    /// Patches are ordered; positions refer to the state after the
    /// preceding patches.
    fn diff(&self, from: Revision, to: Revision) -> Result<Vec<DocPatch>>;

    /// Create a stable cursor for char `offset` of the text at `path`
    ///
    /// # Errors
    ///
    /// `PathNotFound`, `NotText`, or `OffsetOutOfRange` when the offset is
    /// beyond the end of the text.
    fn cursor(&self, path: &JsonPath, offset: usize, at: Option<Revision>) -> Result<Cursor>;

    /// Resolve a cursor to a char offset in the text at `path`
    fn cursor_position(&self, path: &JsonPath, cursor: &Cursor, at: Option<Revision>)
        -> Result<usize>;

    /// Apply a mutation to the live document
    ///
    /// The mutator sees the whole document. If it returns an error nothing
    /// is committed. Returns the revision holding the result; a mutation
    /// that changes nothing commits no new revision.
    fn change(&self, mutator: &mut dyn FnMut(&mut JsonValue) -> Result<()>) -> Result<Revision>;

    /// Register a listener fired after every committed revision
    fn on_change(&self, listener: ChangeListener) -> ListenerId;

    /// Remove a listener; returns false if it was not registered
    fn off_change(&self, id: ListenerId) -> bool;
}
