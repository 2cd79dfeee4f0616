//! Structural change records between two document revisions
//!
//! A document engine describes the difference between two revisions as an
//! ordered list of [`DocPatch`]es. Positions in a patch refer to the document
//! state after all preceding patches in the same list have been applied.
//!
//! | Action | Path ends with | Meaning |
//! |--------|----------------|---------|
//! | `Put` | key or index | value set (created or replaced) |
//! | `Insert` | index | elements inserted into an array |
//! | `Delete` | key | object property removed |
//! | `Delete` | index | `length` array elements or text chars removed |
//! | `Splice` | index | text inserted at a char offset |

use crate::json::{JsonPath, JsonValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a patch, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatchAction {
    /// Value set at a key or index
    Put,
    /// Array elements inserted
    Insert,
    /// Key, elements or chars removed
    Delete,
    /// Text inserted
    Splice,
}

impl fmt::Display for PatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatchAction::Put => "put",
            PatchAction::Insert => "insert",
            PatchAction::Delete => "delete",
            PatchAction::Splice => "splice",
        };
        f.write_str(name)
    }
}

/// A structural change record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocPatch {
    /// Set value at path
    Put {
        /// The path that was set
        path: JsonPath,
        /// The new value
        value: JsonValue,
    },
    /// Insert array elements, the first one at `path`
    Insert {
        /// Array path plus index of the first inserted element
        path: JsonPath,
        /// Inserted elements, in order
        values: Vec<JsonValue>,
    },
    /// Remove an object key, or `length` elements/chars starting at an index
    Delete {
        /// Key path, or container path plus start index
        path: JsonPath,
        /// Number of elements or chars removed (1 for keys)
        length: usize,
    },
    /// Insert text at a char offset
    Splice {
        /// Text path plus char offset
        path: JsonPath,
        /// Inserted text
        value: String,
    },
}

impl DocPatch {
    /// Get the path affected by this patch
    pub fn path(&self) -> &JsonPath {
        match self {
            DocPatch::Put { path, .. }
            | DocPatch::Insert { path, .. }
            | DocPatch::Delete { path, .. }
            | DocPatch::Splice { path, .. } => path,
        }
    }

    /// Get the kind of this patch
    pub fn action(&self) -> PatchAction {
        match self {
            DocPatch::Put { .. } => PatchAction::Put,
            DocPatch::Insert { .. } => PatchAction::Insert,
            DocPatch::Delete { .. } => PatchAction::Delete,
            DocPatch::Splice { .. } => PatchAction::Splice,
        }
    }
}

impl fmt::Display for DocPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocPatch::Put { path, value } => write!(f, "PUT {} = {}", path, value),
            DocPatch::Insert { path, values } => {
                write!(f, "INSERT {} x{}", path, values.len())
            }
            DocPatch::Delete { path, length } => write!(f, "DELETE {} x{}", path, length),
            DocPatch::Splice { path, value } => write!(f, "SPLICE {} {:?}", path, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_accessors() {
        let patch = DocPatch::Splice {
            path: JsonPath::root().key("content").index(4),
            value: "abc".to_string(),
        };
        assert_eq!(patch.action(), PatchAction::Splice);
        assert_eq!(patch.path().last_index(), Some(4));
        assert_eq!(patch.to_string(), "SPLICE content[4] \"abc\"");
    }

    #[test]
    fn test_action_display() {
        assert_eq!(PatchAction::Delete.to_string(), "delete");
        assert_eq!(PatchAction::Put.to_string(), "put");
    }
}
