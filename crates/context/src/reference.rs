//! References: stable names for locations inside a document
//!
//! A [`Ref`] names a place in a document independent of any particular
//! revision:
//! - `Path`: the value at a path
//! - `Keyed`: the element of an array whose `key_field` property equals a
//!   key, so identity survives reordering
//! - `TextSpan`: a char range inside a text value, anchored by cursors
//!
//! Refs are cheap to clone and compare by [`Ref::id`]. Two refs constructed
//! independently for the same location have the same id and therefore name
//! the same fact slot in a [`Context`](crate::Context).
//!
//! Constructors validate the location against the document and fail fast;
//! a dangling ref is never created.

use crate::annotation::Annotation;
use crate::field::Field;
use annota_core::error::{Error, Result};
use annota_core::json::{
    char_slice, get_at_path, get_at_path_mut, JsonPath, JsonPathError, JsonValue, PathSegment,
};
use annota_core::traits::DocHandle;
use annota_core::types::{Cursor, DocId, Revision};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// What a [`Ref`] names at its path
#[derive(Debug, Clone, PartialEq)]
pub enum RefKind {
    /// The value at the path
    Path,
    /// The element of the array at the path whose `key_field` equals `key`
    Keyed {
        /// Name of the identifying property
        key_field: String,
        /// Identifying value
        key: JsonValue,
    },
    /// The chars between two cursors of the text at the path
    TextSpan {
        /// Start anchor
        from: Cursor,
        /// End anchor
        to: Cursor,
    },
}

/// A stable reference to a location in a document
#[derive(Clone)]
pub struct Ref {
    handle: DocHandle,
    path: JsonPath,
    kind: RefKind,
    id: Arc<str>,
}

impl Ref {
    fn build(handle: &DocHandle, path: JsonPath, kind: RefKind) -> Self {
        let id = make_id(handle.doc_id(), &path, &kind);
        Ref {
            handle: Arc::clone(handle),
            path,
            kind,
            id: id.into(),
        }
    }

    /// Reference the value at `path`
    ///
    /// # Errors
    ///
    /// `PathNotFound` if nothing exists at the path now.
    pub fn path(handle: &DocHandle, path: JsonPath) -> Result<Self> {
        if handle.resolve(&path, None)?.is_none() {
            return Err(Error::PathNotFound { path });
        }
        Ok(Self::build(handle, path, RefKind::Path))
    }

    /// Reference the value at `path` as it was at `revision`
    ///
    /// Used for locations that have been deleted since.
    pub fn path_at(handle: &DocHandle, path: JsonPath, revision: Revision) -> Result<Self> {
        if handle.resolve(&path, Some(revision))?.is_none() {
            return Err(Error::PathNotFound { path });
        }
        Ok(Self::build(handle, path, RefKind::Path))
    }

    /// Reference the element of the array at `path` whose `key_field`
    /// property equals `key`
    ///
    /// # Errors
    ///
    /// `PathNotFound` if the array is missing, `KeyNotFound` if no element
    /// carries the key.
    pub fn keyed(
        handle: &DocHandle,
        path: JsonPath,
        key_field: impl Into<String>,
        key: impl Into<JsonValue>,
    ) -> Result<Self> {
        let key_field = key_field.into();
        let key = key.into();
        let container = handle
            .resolve(&path, None)?
            .ok_or_else(|| Error::PathNotFound { path: path.clone() })?;
        find_keyed(&container, &path, &key_field, &key)?;
        Ok(Self::build(handle, path, RefKind::Keyed { key_field, key }))
    }

    /// Reference chars `[from, to)` of the text at `path`
    ///
    /// # Errors
    ///
    /// `PathNotFound`, `NotText`, or `OffsetOutOfRange` if an offset is past
    /// the end of the text.
    pub fn text_span(handle: &DocHandle, path: JsonPath, from: usize, to: usize) -> Result<Self> {
        let from = handle.cursor(&path, from, None)?;
        let to = handle.cursor(&path, to, None)?;
        Ok(Self::build(handle, path, RefKind::TextSpan { from, to }))
    }

    /// Reference the whole document
    pub fn doc_ref(&self) -> Ref {
        Self::build(&self.handle, JsonPath::root(), RefKind::Path)
    }

    /// Identity string; equal ids name the same fact slot
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Owned copy of [`Ref::id`]
    pub fn to_id(&self) -> String {
        self.id.to_string()
    }

    pub(crate) fn shared_id(&self) -> &Arc<str> {
        &self.id
    }

    /// Identity of the document this ref points into
    pub fn doc_id(&self) -> DocId {
        self.handle.doc_id()
    }

    /// Handle of the document this ref points into
    pub fn handle(&self) -> &DocHandle {
        &self.handle
    }

    /// Path from the document root (the array path for keyed refs)
    pub fn json_path(&self) -> &JsonPath {
        &self.path
    }

    /// Variant of this ref
    pub fn kind(&self) -> &RefKind {
        &self.kind
    }

    /// Whether this is a text span
    pub fn is_text_span(&self) -> bool {
        matches!(self.kind, RefKind::TextSpan { .. })
    }

    /// Current content
    ///
    /// # Errors
    ///
    /// `PathNotFound` if the location no longer exists, `KeyNotFound` for a
    /// keyed ref whose element was removed.
    pub fn value(&self) -> Result<JsonValue> {
        self.read(None)
    }

    /// Content at a historical revision
    pub fn value_at(&self, revision: Revision) -> Result<JsonValue> {
        self.read(Some(revision))
    }

    fn read(&self, at: Option<Revision>) -> Result<JsonValue> {
        let value = self
            .handle
            .resolve(&self.path, at)?
            .ok_or_else(|| Error::PathNotFound {
                path: self.path.clone(),
            })?;
        match &self.kind {
            RefKind::Path => Ok(value),
            RefKind::Keyed { key_field, key } => {
                let index = find_keyed(&value, &self.path, key_field, key)?;
                let element = value
                    .as_array()
                    .and_then(|items| items.get(index))
                    .cloned()
                    .unwrap_or_default();
                Ok(JsonValue::from_value(element))
            }
            RefKind::TextSpan { from, to } => {
                let text = value.as_str().ok_or_else(|| Error::NotText {
                    path: self.path.clone(),
                })?;
                let from = self.handle.cursor_position(&self.path, from, at)?;
                let to = self.handle.cursor_position(&self.path, to, at)?;
                Ok(JsonValue::from(char_slice(text, from, to)))
            }
        }
    }

    /// Path of the value this ref names right now
    ///
    /// For keyed refs this is the array path plus the element's current
    /// index; for text spans it is the path of the text.
    pub fn current_path(&self) -> Result<JsonPath> {
        match &self.kind {
            RefKind::Keyed { key_field, key } => {
                let container = self.handle.resolve(&self.path, None)?.ok_or_else(|| {
                    Error::PathNotFound {
                        path: self.path.clone(),
                    }
                })?;
                let index = find_keyed(&container, &self.path, key_field, key)?;
                Ok(self.path.clone().index(index))
            }
            _ => Ok(self.path.clone()),
        }
    }

    /// Current start offset of a text span
    pub fn from(&self) -> Result<usize> {
        match &self.kind {
            RefKind::TextSpan { from, .. } => self.handle.cursor_position(&self.path, from, None),
            _ => Err(Error::unsupported("offsets of a non-text reference")),
        }
    }

    /// Current end offset of a text span
    pub fn to(&self) -> Result<usize> {
        match &self.kind {
            RefKind::TextSpan { to, .. } => self.handle.cursor_position(&self.path, to, None),
            _ => Err(Error::unsupported("offsets of a non-text reference")),
        }
    }

    /// Current `(start, end)` of a text span, ordered
    fn span(&self) -> Option<(usize, usize)> {
        let (from, to) = (self.from().ok()?, self.to().ok()?);
        Some((from.min(to), from.max(to)))
    }

    /// Apply `mutator` to the live value at this location
    ///
    /// Produces one new document revision.
    ///
    /// # Errors
    ///
    /// `Unsupported` for text spans; not-found errors if the location is
    /// gone.
    pub fn change(&self, mut mutator: impl FnMut(&mut JsonValue)) -> Result<Revision> {
        match &self.kind {
            RefKind::TextSpan { .. } => Err(Error::unsupported("in-place mutation of a text span")),
            RefKind::Path => {
                let path = &self.path;
                self.handle.change(&mut |doc: &mut JsonValue| {
                    let target = get_at_path_mut(doc, path)
                        .ok_or_else(|| Error::PathNotFound { path: path.clone() })?;
                    mutator(target);
                    Ok(())
                })
            }
            RefKind::Keyed { key_field, key } => {
                let path = &self.path;
                self.handle.change(&mut |doc: &mut JsonValue| {
                    let container = get_at_path(doc, path)
                        .ok_or_else(|| Error::PathNotFound { path: path.clone() })?;
                    let element = path.clone().index(find_keyed(container, path, key_field, key)?);
                    let target = get_at_path_mut(doc, &element)
                        .ok_or(Error::PathNotFound { path: element })?;
                    mutator(target);
                    Ok(())
                })
            }
        }
    }

    /// Derive a text span over `[from, to)` of this location
    ///
    /// Offsets are relative to the start of the text, or to the start of
    /// the span when called on a text span.
    ///
    /// # Errors
    ///
    /// `NotText` if the value is not text.
    pub fn slice(&self, from: usize, to: usize) -> Result<Ref> {
        match &self.kind {
            RefKind::TextSpan { .. } => {
                let base = self.from()?;
                Ref::text_span(&self.handle, self.path.clone(), base + from, base + to)
            }
            _ => {
                let path = self.current_path()?;
                let value = self
                    .handle
                    .resolve(&path, None)?
                    .ok_or_else(|| Error::PathNotFound { path: path.clone() })?;
                if !value.is_string() {
                    return Err(Error::NotText { path });
                }
                Ref::text_span(&self.handle, path, from, to)
            }
        }
    }

    /// Whether two refs name overlapping locations
    ///
    /// Text spans over the same text overlap when their ranges cross
    /// (touching ends do not count). Everything else overlaps only when the
    /// ids are equal.
    pub fn does_overlap(&self, other: &Ref) -> bool {
        match (&self.kind, &other.kind) {
            (RefKind::TextSpan { .. }, RefKind::TextSpan { .. }) => {
                if self.doc_id() != other.doc_id() || self.path != other.path {
                    return false;
                }
                match (self.span(), other.span()) {
                    (Some((a_start, a_end)), Some((b_start, b_end))) => {
                        a_end > b_start && b_end > a_start
                    }
                    _ => false,
                }
            }
            _ => self.id == other.id,
        }
    }

    /// Whether `other`'s location is an equal or strict prefix of this
    /// ref's location within the same document
    ///
    /// Keyed refs are compared at the element they currently resolve to, so
    /// two keyed refs into one array are only part of each other when they
    /// name the same element. A keyed ref whose element is gone contains
    /// nothing.
    pub fn is_part_of(&self, other: &Ref) -> bool {
        if self.doc_id() != other.doc_id() {
            return false;
        }
        let Ok(outer) = other.current_path() else {
            return false;
        };
        match self.current_path() {
            Ok(inner) => outer.is_ancestor_of(&inner),
            Err(_) => outer.is_ancestor_of(&self.path),
        }
    }

    /// Start an annotation on this ref carrying `field`
    pub fn with(&self, field: Field) -> Annotation {
        Annotation::new(self.clone()).with(field)
    }
}

fn make_id(doc: DocId, path: &JsonPath, kind: &RefKind) -> String {
    let path = encode_path(path);
    match kind {
        RefKind::Path => format!("{}|path|{}", doc, path),
        RefKind::Keyed { key_field, key } => {
            format!("{}|keyed|{}|{}={}", doc, path, quoted(key_field), key)
        }
        RefKind::TextSpan { from, to } => format!("{}|span|{}|{}..{}", doc, path, from, to),
    }
}

/// Unambiguous path encoding for ids: keys are JSON-quoted, indexes are
/// bare numbers
fn encode_path(path: &JsonPath) -> String {
    let segments: Vec<String> = path
        .segments()
        .iter()
        .map(|segment| match segment {
            PathSegment::Key(key) => quoted(key),
            PathSegment::Index(index) => index.to_string(),
        })
        .collect();
    format!("[{}]", segments.join(","))
}

fn quoted(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

/// Index of the element with `key_field == key` in the array `container`
fn find_keyed(container: &JsonValue, path: &JsonPath, key_field: &str, key: &JsonValue) -> Result<usize> {
    let items = container.as_array().ok_or_else(|| {
        Error::path_operation(
            path,
            JsonPathError::TypeMismatch {
                expected: "array",
                found: container.type_name(),
            },
        )
    })?;
    items
        .iter()
        .position(|item| item.get(key_field) == Some(key.as_inner()))
        .ok_or_else(|| Error::KeyNotFound {
            path: path.clone(),
            field: key_field.to_string(),
            key: key.clone(),
        })
}

impl PartialEq for Ref {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Ref {}

impl Hash for Ref {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&self.id).finish()
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RefKind::Path => write!(f, "{}", self.path),
            RefKind::Keyed { key_field, key } => {
                write!(f, "{}{{{}={}}}", self.path, key_field, key)
            }
            RefKind::TextSpan { .. } => match (self.from(), self.to()) {
                (Ok(from), Ok(to)) => write!(f, "{}[{}:{}]", self.path, from, to),
                _ => write!(f, "{}[?:?]", self.path),
            },
        }
    }
}
