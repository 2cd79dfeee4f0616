//! Diff engine: change annotations between two revisions
//!
//! [`DiffEngine::diff_of_doc`] turns the structural patches between a
//! baseline revision and the document's current heads into annotations
//! carrying [`DIFF`]:
//!
//! | Patch | Annotation |
//! |---|---|
//! | `Put`, `Insert` | `Added` on the new value (one per inserted element) |
//! | `Splice` | `Added` on a text span over the inserted chars |
//! | `Delete` of chars | `Deleted { before }` on a zero-width span at the deletion point |
//! | `Delete` of a key | `Deleted { before }` on the key, as of the baseline |
//! | `Delete` of array elements | `Error::Unsupported` |
//!
//! With `mark_ancestors` enabled every container above a patch is marked
//! `Changed { before }` (or `Added` if it did not exist at the baseline),
//! each at most once per diff.
//!
//! [`DiffTracker`] keeps a sub-context filled with the current diff and
//! recomputes it whenever the document changes.

use annota_context::{Annotation, Context, FieldType, Ref, WeakContext};
use annota_core::{
    char_slice, DiffConfig, DocHandle, DocPatch, DocumentEngine, Error, JsonPath, JsonValue,
    ListenerId, Result, Revision,
};
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// How a location differs from the baseline revision
#[derive(Debug, Clone, PartialEq)]
pub enum DiffValue {
    /// Did not exist at the baseline
    Added,
    /// Existed with a different value
    Changed {
        /// Value at the baseline
        before: JsonValue,
    },
    /// Removed since the baseline
    Deleted {
        /// Removed value (removed text for char deletions)
        before: JsonValue,
    },
}

impl DiffValue {
    /// Baseline value, if any
    pub fn before(&self) -> Option<&JsonValue> {
        match self {
            DiffValue::Added => None,
            DiffValue::Changed { before } | DiffValue::Deleted { before } => Some(before),
        }
    }
}

/// Change status of a location relative to a baseline revision
pub static DIFF: Lazy<FieldType<DiffValue>> = Lazy::new(|| FieldType::define("Diff"));

/// Computes diff annotations
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    config: DiffConfig,
}

impl DiffEngine {
    /// Create an engine with the given settings
    pub fn new(config: DiffConfig) -> Self {
        DiffEngine { config }
    }

    /// Settings in use
    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Annotations describing every change between `before` and the current
    /// heads of `handle`
    ///
    /// Returns nothing when `before` is `None`.
    ///
    /// # Errors
    ///
    /// `Unsupported` for deleted array elements; `RevisionNotFound` for an
    /// unknown baseline.
    pub fn diff_of_doc(
        &self,
        handle: &DocHandle,
        before: Option<Revision>,
    ) -> Result<Vec<Annotation>> {
        let Some(before) = before else {
            return Ok(Vec::new());
        };
        let heads = handle.heads();
        let patches = handle.diff(before, heads)?;

        let mut pass = DiffPass {
            handle,
            before,
            visited: FxHashSet::default(),
            annotations: Vec::new(),
        };
        for patch in &patches {
            if self.config.mark_ancestors {
                pass.mark_ancestors(patch.path())?;
            }
            pass.classify(patch)?;
        }

        debug!(target: "annota::diff", doc = %handle.doc_id(), from = %before, to = %heads, patches = patches.len(), annotations = pass.annotations.len(), "Diff computed");
        Ok(pass.annotations)
    }

    /// Keep a sub-context of `context` filled with the diff since `before`
    ///
    /// The diff is recomputed after every change of `handle`. Dropping the
    /// tracker stops listening and removes the sub-context.
    pub fn track(
        &self,
        context: &Context,
        handle: &DocHandle,
        before: Revision,
    ) -> Result<DiffTracker> {
        let initial = self.diff_of_doc(handle, Some(before))?;
        let sub = context.subcontext();
        sub.replace(initial);

        let state = Arc::new(TrackerState {
            engine: self.clone(),
            handle: Arc::downgrade(handle),
            sub: sub.downgrade(),
            before,
        });
        let listener_state = Arc::clone(&state);
        let listener = handle.on_change(Arc::new(move |revision: Revision| {
            if let Err(e) = listener_state.refresh() {
                warn!(target: "annota::diff", revision = %revision, error = %e, "Diff refresh failed");
            }
        }));

        Ok(DiffTracker {
            handle: Arc::clone(handle),
            listener,
            parent: context.clone(),
            sub,
            state,
        })
    }
}

/// Diff since `before` with the default settings
pub fn diff_of_doc(handle: &DocHandle, before: Option<Revision>) -> Result<Vec<Annotation>> {
    DiffEngine::default().diff_of_doc(handle, before)
}

/// Diff status stored for exactly `reference`
pub fn diff_at(context: &Context, reference: &Ref) -> Option<DiffValue> {
    context.get_field(reference, &DIFF)
}

/// Diff annotations strictly inside `reference`
pub fn refs_with_diff_at(context: &Context, reference: &Ref) -> Vec<Annotation> {
    context
        .get_all_with(&DIFF)
        .into_iter()
        .filter(|annotation| {
            annotation.reference().is_part_of(reference) && annotation.reference() != reference
        })
        .collect()
}

struct DiffPass<'a> {
    handle: &'a DocHandle,
    before: Revision,
    visited: FxHashSet<JsonPath>,
    annotations: Vec<Annotation>,
}

impl DiffPass<'_> {
    fn push(&mut self, reference: Ref, value: DiffValue) {
        self.annotations.push(reference.with(DIFF.of(value)));
    }

    /// Nearest first; stops at the first ancestor an earlier patch marked
    fn mark_ancestors(&mut self, path: &JsonPath) -> Result<()> {
        for ancestor in path.ancestors() {
            if !self.visited.insert(ancestor.clone()) {
                break;
            }
            let value = match self.handle.resolve(&ancestor, Some(self.before))? {
                Some(before) => DiffValue::Changed { before },
                None => DiffValue::Added,
            };
            let reference = Ref::path(self.handle, ancestor)?;
            self.push(reference, value);
        }
        Ok(())
    }

    fn classify(&mut self, patch: &DocPatch) -> Result<()> {
        match patch {
            DocPatch::Put { path, .. } => {
                self.visited.insert(path.clone());
                let reference = Ref::path(self.handle, path.clone())?;
                self.push(reference, DiffValue::Added);
            }
            DocPatch::Insert { path, values } => {
                let (array, start) = split_index(path)?;
                for index in start..start + values.len() {
                    let element = array.clone().index(index);
                    self.visited.insert(element.clone());
                    let reference = Ref::path(self.handle, element)?;
                    self.push(reference, DiffValue::Added);
                }
            }
            DocPatch::Splice { path, value } => {
                let (text, start) = split_index(path)?;
                let end = start + value.chars().count();
                let reference = Ref::text_span(self.handle, text, start, end)?;
                self.push(reference, DiffValue::Added);
            }
            DocPatch::Delete { path, length } => match path.last_index() {
                Some(_) => self.classify_index_delete(path, *length)?,
                None => {
                    let before = self
                        .handle
                        .resolve(path, Some(self.before))?
                        .ok_or_else(|| Error::PathNotFound { path: path.clone() })?;
                    let reference = Ref::path_at(self.handle, path.clone(), self.before)?;
                    self.push(reference, DiffValue::Deleted { before });
                }
            },
        }
        Ok(())
    }

    fn classify_index_delete(&mut self, path: &JsonPath, length: usize) -> Result<()> {
        let (container, position) = split_index(path)?;
        let parent = self
            .handle
            .resolve(&container, Some(self.before))?
            .ok_or_else(|| Error::PathNotFound {
                path: container.clone(),
            })?;

        if let Some(text) = parent.as_str() {
            let removed = char_slice(text, position, position + length);
            let reference = Ref::text_span(self.handle, container, position, position)?;
            self.push(
                reference,
                DiffValue::Deleted {
                    before: JsonValue::from(removed),
                },
            );
            return Ok(());
        }

        warn!(target: "annota::diff", path = %path, length, container = parent.type_name(), "Unsupported deletion in diff");
        if parent.is_array() {
            Err(Error::unsupported(format!(
                "diff of deleted array elements at {}",
                path
            )))
        } else {
            Err(Error::unsupported(format!(
                "index deletion inside {} at {}",
                parent.type_name(),
                path
            )))
        }
    }
}

fn split_index(path: &JsonPath) -> Result<(JsonPath, usize)> {
    match (path.parent(), path.last_index()) {
        (Some(parent), Some(index)) => Ok((parent, index)),
        _ => Err(Error::unsupported(format!(
            "patch path {} does not end with an index",
            path
        ))),
    }
}

struct TrackerState {
    engine: DiffEngine,
    handle: Weak<dyn DocumentEngine>,
    sub: WeakContext,
    before: Revision,
}

impl TrackerState {
    fn refresh(&self) -> Result<()> {
        let (Some(handle), Some(sub)) = (self.handle.upgrade(), self.sub.upgrade()) else {
            return Ok(());
        };
        match self.engine.diff_of_doc(&handle, Some(self.before)) {
            Ok(annotations) => {
                sub.replace(annotations);
                Ok(())
            }
            Err(e) => {
                // No diff is better than a diff of a state that is gone
                sub.replace(Vec::new());
                Err(e)
            }
        }
    }
}

/// Live diff producer returned by [`DiffEngine::track`]
pub struct DiffTracker {
    handle: DocHandle,
    listener: ListenerId,
    parent: Context,
    sub: Context,
    state: Arc<TrackerState>,
}

impl DiffTracker {
    /// Baseline revision
    pub fn baseline(&self) -> Revision {
        self.state.before
    }

    /// Sub-context holding the diff annotations
    pub fn context(&self) -> &Context {
        &self.sub
    }

    /// Recompute now
    ///
    /// # Errors
    ///
    /// Whatever [`DiffEngine::diff_of_doc`] reports. The tracked
    /// sub-context is left empty in that case.
    pub fn refresh(&self) -> Result<()> {
        self.state.refresh()
    }
}

impl Drop for DiffTracker {
    fn drop(&mut self) {
        self.handle.off_change(self.listener);
        self.parent.remove(&self.sub);
    }
}

impl std::fmt::Debug for DiffTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffTracker")
            .field("doc", &self.handle.doc_id())
            .field("baseline", &self.state.before)
            .finish()
    }
}
