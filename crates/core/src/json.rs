//! JSON document model
//!
//! Documents handled by annota are JSON trees. This module defines:
//! - JsonValue: Newtype wrapper around serde_json::Value
//! - JsonPath: Path from the document root (e.g., `todos[0].title`)
//! - PathSegment: Individual path component (Key or Index)
//! - Path operations: get, get_mut, set, insert, delete
//! - Text helpers operating on char offsets
//!
//! Text offsets everywhere in annota count Unicode scalar values (`char`s),
//! never bytes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use thiserror::Error;

/// JSON value wrapper
///
/// Newtype around serde_json::Value providing direct access through
/// Deref/DerefMut plus easy construction from common types.
///
/// # Examples
///
/// ```
/// use annota_core::JsonValue;
///
/// let obj = JsonValue::object();
/// let s = JsonValue::from("hello");
///
/// assert!(obj.is_object());
/// assert_eq!(s.as_str(), Some("hello"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct JsonValue(serde_json::Value);

impl JsonValue {
    /// Create a null JSON value
    pub fn null() -> Self {
        JsonValue(serde_json::Value::Null)
    }

    /// Create an empty JSON object
    pub fn object() -> Self {
        JsonValue(serde_json::Value::Object(serde_json::Map::new()))
    }

    /// Create an empty JSON array
    pub fn array() -> Self {
        JsonValue(serde_json::Value::Array(Vec::new()))
    }

    /// Create from a serde_json::Value
    pub fn from_value(value: serde_json::Value) -> Self {
        JsonValue(value)
    }

    /// Get the underlying serde_json::Value
    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }

    /// Get a reference to the underlying serde_json::Value
    pub fn as_inner(&self) -> &serde_json::Value {
        &self.0
    }

    /// Get a mutable reference to the underlying serde_json::Value
    pub fn as_inner_mut(&mut self) -> &mut serde_json::Value {
        &mut self.0
    }

    /// Serialize to a compact JSON string
    pub fn to_json_string(&self) -> String {
        self.0.to_string()
    }

    /// Approximate serialized size in bytes
    pub fn size_bytes(&self) -> usize {
        self.to_json_string().len()
    }

    /// Maximum nesting depth of this value (scalars are depth 0)
    pub fn nesting_depth(&self) -> usize {
        fn depth(value: &serde_json::Value) -> usize {
            match value {
                serde_json::Value::Array(arr) => 1 + arr.iter().map(depth).max().unwrap_or(0),
                serde_json::Value::Object(obj) => 1 + obj.values().map(depth).max().unwrap_or(0),
                _ => 0,
            }
        }
        depth(&self.0)
    }

    /// Name of the JSON type, for error messages
    pub fn type_name(&self) -> &'static str {
        value_type_name(&self.0)
    }

    /// Length in chars if this value is a string
    pub fn char_len(&self) -> Option<usize> {
        self.0.as_str().map(|s| s.chars().count())
    }
}

impl FromStr for JsonValue {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map(JsonValue)
    }
}

impl Deref for JsonValue {
    type Target = serde_json::Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for JsonValue {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for JsonValue {
    fn default() -> Self {
        Self::null()
    }
}

impl From<serde_json::Value> for JsonValue {
    fn from(v: serde_json::Value) -> Self {
        JsonValue(v)
    }
}

impl From<JsonValue> for serde_json::Value {
    fn from(v: JsonValue) -> Self {
        v.0
    }
}

impl From<bool> for JsonValue {
    fn from(v: bool) -> Self {
        JsonValue(serde_json::Value::Bool(v))
    }
}

impl From<i64> for JsonValue {
    fn from(v: i64) -> Self {
        JsonValue(serde_json::Value::Number(v.into()))
    }
}

impl From<i32> for JsonValue {
    fn from(v: i32) -> Self {
        JsonValue(serde_json::Value::Number(v.into()))
    }
}

impl From<u64> for JsonValue {
    fn from(v: u64) -> Self {
        JsonValue(serde_json::Value::Number(v.into()))
    }
}

impl From<f64> for JsonValue {
    fn from(v: f64) -> Self {
        serde_json::Number::from_f64(v)
            .map(|n| JsonValue(serde_json::Value::Number(n)))
            .unwrap_or_else(JsonValue::null)
    }
}

impl From<&str> for JsonValue {
    fn from(v: &str) -> Self {
        JsonValue(serde_json::Value::String(v.to_string()))
    }
}

impl From<String> for JsonValue {
    fn from(v: String) -> Self {
        JsonValue(serde_json::Value::String(v))
    }
}

// =============================================================================
// JsonPath and PathSegment
// =============================================================================

/// Error type for JSON path parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// Empty key in path
    #[error("empty key in path at position {0}")]
    EmptyKey(usize),
    /// Unclosed bracket
    #[error("unclosed bracket starting at position {0}")]
    UnclosedBracket(usize),
    /// Invalid array index
    #[error("invalid array index at position {0}: {1}")]
    InvalidIndex(usize, String),
    /// Unexpected character
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
}

/// A segment in a JSON path
///
/// Key segments address object properties, index segments address array
/// elements or, as the last segment of a text patch, a char offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PathSegment {
    /// Object key: `.foo`
    Key(String),
    /// Array index or text offset: `[0]`
    Index(usize),
}

impl PathSegment {
    /// The index, if this is an index segment
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(i) => Some(*i),
            PathSegment::Key(_) => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, ".{}", k),
            PathSegment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

/// A path into a JSON document
///
/// # Path Syntax
///
/// | Syntax | Meaning | Example |
/// |--------|---------|---------|
/// | `key` | Object property | `content` |
/// | `[n]` | Array index | `[0]` |
/// | `a.b` | Nested property | `user.name` |
/// | `a[n].b` | Mixed | `todos[0].title` |
/// | (empty) | Root | `` |
///
/// # Examples
///
/// ```
/// use annota_core::JsonPath;
///
/// let title = JsonPath::root().key("todos").index(0).key("title");
/// let parsed: JsonPath = "todos[0].title".parse().unwrap();
/// assert_eq!(parsed, title);
///
/// let todos = JsonPath::root().key("todos");
/// assert!(todos.is_ancestor_of(&title));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

impl JsonPath {
    /// Create the root path (empty path)
    pub fn root() -> Self {
        JsonPath {
            segments: Vec::new(),
        }
    }

    /// Create a path from a vector of segments
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        JsonPath { segments }
    }

    /// Get the path segments
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if this is the root path (empty)
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Check if this is the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a key segment (builder pattern)
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Append an index segment (builder pattern)
    pub fn index(mut self, idx: usize) -> Self {
        self.segments.push(PathSegment::Index(idx));
        self
    }

    /// Append an arbitrary segment (builder pattern)
    pub fn join(mut self, segment: PathSegment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Get the parent path (None if root)
    pub fn parent(&self) -> Option<JsonPath> {
        if self.segments.is_empty() {
            None
        } else {
            Some(JsonPath::from_segments(
                self.segments[..self.segments.len() - 1].to_vec(),
            ))
        }
    }

    /// Get the last segment (None if root)
    pub fn last_segment(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// The trailing index, if the path ends with an index segment
    pub fn last_index(&self) -> Option<usize> {
        self.segments.last().and_then(PathSegment::as_index)
    }

    /// Check if this path is an ancestor of another (or equal)
    ///
    /// The root path is an ancestor of all paths; a path is an ancestor of
    /// itself.
    pub fn is_ancestor_of(&self, other: &JsonPath) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| a == b)
    }

    /// Check if this path is a descendant of another (or equal)
    pub fn is_descendant_of(&self, other: &JsonPath) -> bool {
        other.is_ancestor_of(self)
    }

    /// Check if this path is a strict ancestor of another (not equal)
    pub fn is_strict_ancestor_of(&self, other: &JsonPath) -> bool {
        self.segments.len() < other.segments.len() && self.is_ancestor_of(other)
    }

    /// Strict, non-root ancestors of this path, nearest first
    ///
    /// For `a.b.c` this yields `a.b` then `a`.
    pub fn ancestors(&self) -> impl Iterator<Item = JsonPath> + '_ {
        (1..self.segments.len())
            .rev()
            .map(move |len| JsonPath::from_segments(self.segments[..len].to_vec()))
    }

    /// Convert to a string representation
    pub fn to_path_string(&self) -> String {
        let mut result = String::new();
        for seg in &self.segments {
            match seg {
                PathSegment::Key(k) => {
                    if !result.is_empty() {
                        result.push('.');
                    }
                    result.push_str(k);
                }
                PathSegment::Index(i) => {
                    result.push('[');
                    result.push_str(&i.to_string());
                    result.push(']');
                }
            }
        }
        result
    }
}

impl FromIterator<PathSegment> for JsonPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        JsonPath::from_segments(iter.into_iter().collect())
    }
}

impl From<Vec<PathSegment>> for JsonPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        JsonPath::from_segments(segments)
    }
}

impl FromStr for JsonPath {
    type Err = PathParseError;

    /// Parse a path from a string
    ///
    /// Supported syntax: `foo`, `.foo`, `[0]`, `foo.bar`, `foo[0]`, `foo[0].bar`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        let mut segments = Vec::new();
        let mut i = 0;

        if chars.first() == Some(&'.') {
            i += 1;
        }

        while i < chars.len() {
            if chars[i] == '.' {
                i += 1;
                if i >= chars.len() {
                    return Err(PathParseError::EmptyKey(i));
                }
            }

            if chars[i] == '[' {
                let start = i;
                i += 1;
                let idx_start = i;
                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(PathParseError::UnclosedBracket(start));
                }
                let idx_str: String = chars[idx_start..i].iter().collect();
                let idx = idx_str
                    .parse::<usize>()
                    .map_err(|_| PathParseError::InvalidIndex(idx_start, idx_str))?;
                segments.push(PathSegment::Index(idx));
                i += 1;
            } else if is_key_char(chars[i]) {
                let key_start = i;
                while i < chars.len() && is_key_char(chars[i]) {
                    i += 1;
                }
                segments.push(PathSegment::Key(chars[key_start..i].iter().collect()));
            } else if chars[i] == '.' {
                return Err(PathParseError::EmptyKey(i));
            } else {
                return Err(PathParseError::UnexpectedChar(chars[i], i));
            }
        }

        Ok(JsonPath { segments })
    }
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '@'
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_string())
    }
}

// =============================================================================
// Path Operations
// =============================================================================

/// Error type for path operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonPathError {
    /// Type mismatch during path traversal
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected type
        expected: &'static str,
        /// Actual type found
        found: &'static str,
    },

    /// Array index out of bounds
    #[error("index out of bounds: {index} > {len}")]
    IndexOutOfBounds {
        /// The requested index
        index: usize,
        /// The array length
        len: usize,
    },

    /// Path not found
    #[error("path not found")]
    NotFound,
}

/// Get value at path within a JSON document
///
/// Returns `None` if the path doesn't exist or crosses a value of the wrong
/// type.
///
/// ```
/// use annota_core::json::{get_at_path, JsonPath, JsonValue};
///
/// let doc: JsonValue = serde_json::json!({"todos": [{"title": "milk"}]}).into();
/// let path: JsonPath = "todos[0].title".parse().unwrap();
/// assert_eq!(get_at_path(&doc, &path).unwrap().as_str(), Some("milk"));
/// ```
pub fn get_at_path<'a>(value: &'a JsonValue, path: &JsonPath) -> Option<&'a JsonValue> {
    let mut current: &serde_json::Value = value.as_inner();

    for segment in path.segments() {
        current = match (segment, current) {
            (PathSegment::Key(key), serde_json::Value::Object(obj)) => obj.get(key)?,
            (PathSegment::Index(idx), serde_json::Value::Array(arr)) => arr.get(*idx)?,
            _ => return None,
        };
    }

    // SAFETY: JsonValue is #[repr(transparent)] over serde_json::Value, so the
    // layouts are identical and the lifetime stays tied to `value`.
    Some(unsafe { &*(current as *const serde_json::Value as *const JsonValue) })
}

/// Get mutable reference to value at path within a JSON document
pub fn get_at_path_mut<'a>(value: &'a mut JsonValue, path: &JsonPath) -> Option<&'a mut JsonValue> {
    let mut current: &mut serde_json::Value = value.as_inner_mut();

    for segment in path.segments() {
        current = match (segment, current) {
            (PathSegment::Key(key), serde_json::Value::Object(obj)) => obj.get_mut(key)?,
            (PathSegment::Index(idx), serde_json::Value::Array(arr)) => arr.get_mut(*idx)?,
            _ => return None,
        };
    }

    // SAFETY: see get_at_path
    Some(unsafe { &mut *(current as *mut serde_json::Value as *mut JsonValue) })
}

/// Set value at path within a JSON document
///
/// The parent of `path` must already exist. An index segment equal to the
/// array length appends.
pub fn set_at_path(
    root: &mut JsonValue,
    path: &JsonPath,
    value: JsonValue,
) -> Result<(), JsonPathError> {
    let Some(last) = path.last_segment() else {
        *root = value;
        return Ok(());
    };
    let parent_path = path.parent().unwrap_or_default();
    let parent = get_at_path_mut(root, &parent_path).ok_or(JsonPathError::NotFound)?;

    match (last, parent.as_inner_mut()) {
        (PathSegment::Key(key), serde_json::Value::Object(obj)) => {
            obj.insert(key.clone(), value.into_inner());
            Ok(())
        }
        (PathSegment::Index(idx), serde_json::Value::Array(arr)) => {
            if *idx < arr.len() {
                arr[*idx] = value.into_inner();
                Ok(())
            } else if *idx == arr.len() {
                arr.push(value.into_inner());
                Ok(())
            } else {
                Err(JsonPathError::IndexOutOfBounds {
                    index: *idx,
                    len: arr.len(),
                })
            }
        }
        (PathSegment::Key(_), other) => Err(JsonPathError::TypeMismatch {
            expected: "object",
            found: value_type_name(other),
        }),
        (PathSegment::Index(_), other) => Err(JsonPathError::TypeMismatch {
            expected: "array",
            found: value_type_name(other),
        }),
    }
}

/// Insert values into the array addressed by `path`'s parent, starting at
/// `path`'s trailing index, shifting later elements right.
pub fn insert_at_path(
    root: &mut JsonValue,
    path: &JsonPath,
    values: Vec<JsonValue>,
) -> Result<(), JsonPathError> {
    let idx = path.last_index().ok_or(JsonPathError::TypeMismatch {
        expected: "array",
        found: "object",
    })?;
    let parent_path = path.parent().unwrap_or_default();
    let parent = get_at_path_mut(root, &parent_path).ok_or(JsonPathError::NotFound)?;
    let found = parent.type_name();
    let arr = parent
        .as_array_mut()
        .ok_or(JsonPathError::TypeMismatch {
            expected: "array",
            found,
        })?;
    if idx > arr.len() {
        return Err(JsonPathError::IndexOutOfBounds {
            index: idx,
            len: arr.len(),
        });
    }
    for (offset, value) in values.into_iter().enumerate() {
        arr.insert(idx + offset, value.into_inner());
    }
    Ok(())
}

/// Delete value at path within a JSON document
///
/// Returns the removed value, or `None` if nothing was there. Deleting the
/// root replaces the document with null.
pub fn delete_at_path(
    root: &mut JsonValue,
    path: &JsonPath,
) -> Result<Option<JsonValue>, JsonPathError> {
    let Some(last) = path.last_segment() else {
        return Ok(Some(std::mem::take(root)));
    };
    let parent_path = path.parent().unwrap_or_default();
    let parent = get_at_path_mut(root, &parent_path).ok_or(JsonPathError::NotFound)?;

    match (last, parent.as_inner_mut()) {
        (PathSegment::Key(key), serde_json::Value::Object(obj)) => {
            Ok(obj.remove(key).map(JsonValue::from_value))
        }
        (PathSegment::Index(idx), serde_json::Value::Array(arr)) => {
            if *idx < arr.len() {
                Ok(Some(JsonValue::from_value(arr.remove(*idx))))
            } else {
                Ok(None)
            }
        }
        (PathSegment::Key(_), other) => Err(JsonPathError::TypeMismatch {
            expected: "object",
            found: value_type_name(other),
        }),
        (PathSegment::Index(_), other) => Err(JsonPathError::TypeMismatch {
            expected: "array",
            found: value_type_name(other),
        }),
    }
}

/// Helper to get type name for error messages
fn value_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// =============================================================================
// Text helpers
// =============================================================================

/// Slice `text` by char offsets, clamping both ends to the text length.
///
/// Returns an empty string when `from >= to`.
pub fn char_slice(text: &str, from: usize, to: usize) -> String {
    if from >= to {
        return String::new();
    }
    text.chars().skip(from).take(to - from).collect()
}

/// Replace `delete` chars at char offset `pos` with `insert`.
pub fn splice_chars(text: &str, pos: usize, delete: usize, insert: &str) -> String {
    let mut out = String::with_capacity(text.len() + insert.len());
    let mut chars = text.chars();
    out.extend(chars.by_ref().take(pos));
    out.push_str(insert);
    out.extend(chars.skip(delete));
    out
}
