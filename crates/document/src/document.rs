//! In-memory document with a linear revision history
//!
//! `MemoryDocument` keeps one snapshot per revision together with the text
//! edits that produced it. Diffs are computed structurally between any two
//! snapshots, and text cursors are carried across revisions by replaying the
//! recorded edits.
//!
//! ## Cursor anchoring
//!
//! A cursor names a char by the revision that inserted it and its offset in
//! that revision. Creating a cursor walks the edits backwards until the char
//! was inserted, so two cursors created independently for the same char are
//! equal. Resolving walks forward (or backward) to the requested revision; a
//! deleted char collapses to the position of the deletion.
//!
//! Cursors are keyed by path: a text moved to another path (for example by
//! an array insertion before it) is not followed.
//!
//! ## Thread Safety
//!
//! Snapshots sit behind a `parking_lot::RwLock`. Mutators and listeners run
//! without any lock held, so they may call back into the document.

use crate::structural::{Origin, StructuralDiff, TextEdit};
use annota_core::config::AnnotaConfig;
use annota_core::error::{Error, Result};
use annota_core::json::{
    delete_at_path, get_at_path, get_at_path_mut, insert_at_path, set_at_path, splice_chars,
    JsonPath, JsonValue,
};
use annota_core::limits::DocumentLimits;
use annota_core::patch::DocPatch;
use annota_core::traits::{ChangeListener, DocumentEngine};
use annota_core::types::{Cursor, DocId, ListenerId, Revision};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Snapshots and edits, indexed by revision number
#[derive(Debug)]
struct History {
    snapshots: Vec<JsonValue>,
    /// `edits[r]` turns the text of revision `r - 1` into revision `r`
    edits: Vec<Vec<TextEdit>>,
}

impl History {
    fn heads(&self) -> Revision {
        Revision::new(self.snapshots.len() as u64 - 1)
    }

    fn snapshot(&self, revision: Revision) -> Result<&JsonValue> {
        self.snapshots
            .get(revision.as_index())
            .ok_or(Error::RevisionNotFound { revision })
    }

    fn is_text(&self, index: usize, path: &JsonPath) -> bool {
        self.snapshots
            .get(index)
            .and_then(|s| get_at_path(s, path))
            .map_or(false, |v| v.is_string())
    }

    fn edit(&self, index: usize, path: &JsonPath) -> Option<&TextEdit> {
        self.edits.get(index)?.iter().find(|e| &e.path == path)
    }

    /// Char length of the text at `path`
    fn text_len(&self, revision: Revision, path: &JsonPath) -> Result<usize> {
        let value = get_at_path(self.snapshot(revision)?, path)
            .ok_or_else(|| Error::PathNotFound { path: path.clone() })?;
        value
            .char_len()
            .ok_or_else(|| Error::NotText { path: path.clone() })
    }

    /// Find the revision that inserted the char at `offset`
    fn anchor(&self, path: &JsonPath, offset: usize, revision: Revision) -> Cursor {
        let mut index = revision.as_index();
        let mut offset = offset;
        while index > 0 {
            if !self.is_text(index - 1, path) {
                break;
            }
            if let Some(edit) = self.edit(index, path) {
                match edit.origin(offset) {
                    Origin::Old(old) => offset = old,
                    Origin::Inserted => break,
                }
            }
            index -= 1;
        }
        Cursor::At {
            born: Revision::new(index as u64),
            offset,
        }
    }

    /// Carry an offset from revision `from` to revision `to`
    fn carry(&self, path: &JsonPath, offset: usize, from: Revision, to: Revision) -> usize {
        let (from, to) = (from.as_index(), to.as_index());
        let mut offset = offset;
        if to >= from {
            for index in from + 1..=to {
                if !self.is_text(index - 1, path) || !self.is_text(index, path) {
                    offset = 0;
                } else if let Some(edit) = self.edit(index, path) {
                    offset = edit.map_forward(offset);
                }
            }
        } else {
            for index in (to + 1..=from).rev() {
                if !self.is_text(index - 1, path) || !self.is_text(index, path) {
                    offset = 0;
                } else if let Some(edit) = self.edit(index, path) {
                    offset = edit.map_backward(offset);
                }
            }
        }
        offset
    }
}

/// In-memory document engine
///
/// # Example
///
/// ```
/// use annota_core::{DocumentEngine, JsonPath};
/// use annota_document::MemoryDocument;
///
/// let doc = MemoryDocument::new(serde_json::json!({"text": "hello"}).into()).unwrap();
/// let text = JsonPath::root().key("text");
/// let cursor = doc.cursor(&text, 1, None).unwrap();
///
/// doc.splice_text(&text, 0, 0, ">> ").unwrap();
/// assert_eq!(doc.cursor_position(&text, &cursor, None).unwrap(), 4);
/// ```
pub struct MemoryDocument {
    id: DocId,
    limits: DocumentLimits,
    history: RwLock<History>,
    listeners: Mutex<Vec<(ListenerId, ChangeListener)>>,
    next_listener: AtomicU64,
}

impl MemoryDocument {
    /// Create a document with default limits
    ///
    /// # Errors
    ///
    /// Returns `Error::Limit` if the initial value violates the limits.
    pub fn new(initial: JsonValue) -> Result<Arc<Self>> {
        Self::with_limits(initial, DocumentLimits::default())
    }

    /// Create a document using the `[document]` section of a config
    pub fn with_config(initial: JsonValue, config: &AnnotaConfig) -> Result<Arc<Self>> {
        Self::with_limits(initial, config.document.clone())
    }

    /// Create a document with explicit limits
    pub fn with_limits(initial: JsonValue, limits: DocumentLimits) -> Result<Arc<Self>> {
        limits.validate_document(&initial)?;
        let id = DocId::new();
        debug!(target: "annota::doc", doc = %id, "Document created");
        Ok(Arc::new(MemoryDocument {
            id,
            limits,
            history: RwLock::new(History {
                snapshots: vec![initial],
                edits: vec![Vec::new()],
            }),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        }))
    }

    /// The limits enforced on every revision
    pub fn limits(&self) -> &DocumentLimits {
        &self.limits
    }

    /// Full document value at the latest revision or at `at`
    pub fn snapshot(&self, at: Option<Revision>) -> Result<JsonValue> {
        let history = self.history.read();
        let revision = at.unwrap_or_else(|| history.heads());
        history.snapshot(revision).cloned()
    }

    /// Number of revisions, including the initial one
    pub fn revision_count(&self) -> usize {
        self.history.read().snapshots.len()
    }

    /// Replace `delete` chars at char offset `pos` of the text at `path`
    /// with `insert`
    pub fn splice_text(
        &self,
        path: &JsonPath,
        pos: usize,
        delete: usize,
        insert: &str,
    ) -> Result<Revision> {
        self.change(&mut |doc: &mut JsonValue| {
            let target =
                get_at_path_mut(doc, path).ok_or_else(|| Error::PathNotFound { path: path.clone() })?;
            let text = target
                .as_str()
                .ok_or_else(|| Error::NotText { path: path.clone() })?;
            let len = text.chars().count();
            if pos > len {
                return Err(Error::OffsetOutOfRange { offset: pos, len });
            }
            let updated = splice_chars(text, pos, delete, insert);
            *target = JsonValue::from(updated);
            Ok(())
        })
    }

    /// Set the value at `path`; its parent must exist
    pub fn put(&self, path: &JsonPath, value: JsonValue) -> Result<Revision> {
        self.limits.validate_path(path)?;
        self.change(&mut |doc: &mut JsonValue| {
            set_at_path(doc, path, value.clone()).map_err(|e| Error::path_operation(path, e))
        })
    }

    /// Remove the value at `path`
    pub fn delete(&self, path: &JsonPath) -> Result<Revision> {
        self.change(&mut |doc: &mut JsonValue| {
            match delete_at_path(doc, path).map_err(|e| Error::path_operation(path, e))? {
                Some(_) => Ok(()),
                None => Err(Error::PathNotFound { path: path.clone() }),
            }
        })
    }

    /// Insert array elements, the first one at `path`'s trailing index
    pub fn insert(&self, path: &JsonPath, values: Vec<JsonValue>) -> Result<Revision> {
        self.limits.validate_path(path)?;
        self.change(&mut |doc: &mut JsonValue| {
            insert_at_path(doc, path, values.clone()).map_err(|e| Error::path_operation(path, e))
        })
    }

    fn notify(&self, revision: Revision) {
        let listeners: Vec<ChangeListener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(revision);
        }
    }
}

impl std::fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("id", &self.id)
            .field("heads", &self.heads())
            .finish()
    }
}

impl DocumentEngine for MemoryDocument {
    fn doc_id(&self) -> DocId {
        self.id
    }

    fn heads(&self) -> Revision {
        self.history.read().heads()
    }

    fn resolve(&self, path: &JsonPath, at: Option<Revision>) -> Result<Option<JsonValue>> {
        let history = self.history.read();
        let revision = at.unwrap_or_else(|| history.heads());
        Ok(get_at_path(history.snapshot(revision)?, path).cloned())
    }

    fn diff(&self, from: Revision, to: Revision) -> Result<Vec<DocPatch>> {
        let history = self.history.read();
        let before = history.snapshot(from)?;
        let after = history.snapshot(to)?;
        Ok(StructuralDiff::between(before, after).patches)
    }

    fn cursor(&self, path: &JsonPath, offset: usize, at: Option<Revision>) -> Result<Cursor> {
        let history = self.history.read();
        let revision = at.unwrap_or_else(|| history.heads());
        let len = history.text_len(revision, path)?;
        if offset > len {
            return Err(Error::OffsetOutOfRange { offset, len });
        }
        if offset == len {
            return Ok(Cursor::End);
        }
        Ok(history.anchor(path, offset, revision))
    }

    fn cursor_position(
        &self,
        path: &JsonPath,
        cursor: &Cursor,
        at: Option<Revision>,
    ) -> Result<usize> {
        let history = self.history.read();
        let revision = at.unwrap_or_else(|| history.heads());
        let len = history.text_len(revision, path)?;
        match cursor {
            Cursor::End => Ok(len),
            Cursor::At { born, offset } => {
                history.snapshot(*born)?;
                Ok(history.carry(path, *offset, *born, revision).min(len))
            }
        }
    }

    fn change(&self, mutator: &mut dyn FnMut(&mut JsonValue) -> Result<()>) -> Result<Revision> {
        loop {
            let (base, mut draft) = {
                let history = self.history.read();
                let heads = history.heads();
                (heads, history.snapshots[heads.as_index()].clone())
            };

            mutator(&mut draft)?;
            self.limits.validate_document(&draft)?;

            let revision = {
                let mut history = self.history.write();
                if history.heads() != base {
                    trace!(target: "annota::doc", doc = %self.id, "Concurrent change, retrying");
                    continue;
                }
                let diff = StructuralDiff::between(&history.snapshots[base.as_index()], &draft);
                if diff.is_empty() {
                    return Ok(base);
                }
                history.snapshots.push(draft);
                history.edits.push(diff.text_edits);
                let revision = history.heads();
                debug!(
                    target: "annota::doc",
                    doc = %self.id,
                    revision = %revision,
                    patches = diff.patches.len(),
                    "Revision committed"
                );
                revision
            };

            self.notify(revision);
            return Ok(revision);
        }
    }

    fn on_change(&self, listener: ChangeListener) -> ListenerId {
        let id = ListenerId::new(self.next_listener.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().push((id, listener));
        id
    }

    fn off_change(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }
}
