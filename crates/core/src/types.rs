//! Core identity types
//!
//! - DocId: identity of a document instance
//! - Revision: position in a document's linear history
//! - Cursor: stable anchor into a text value
//! - ListenerId: handle for document change listeners

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a document instance
///
/// A DocId wraps a UUID v4. Two handles with equal DocIds refer to the same
/// document; references from different documents never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocId(Uuid);

impl DocId {
    /// Create a new random DocId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a DocId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Parse a DocId from its string form
    ///
    /// Returns None if the string is not a valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for DocId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc:{}", self.0)
    }
}

/// A position in a document's history
///
/// Revision 0 is the initial content; every committed change produces the
/// next revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Revision(u64);

impl Revision {
    /// The initial revision of every document
    pub const INITIAL: Revision = Revision(0);

    /// Create a revision from its number
    pub const fn new(n: u64) -> Self {
        Revision(n)
    }

    /// The revision number
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The revision following this one
    pub const fn next(self) -> Self {
        Revision(self.0 + 1)
    }

    /// Index into a revision history
    pub fn as_index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A stable anchor into a text value
///
/// `At` names one character by the revision that inserted it and its offset
/// in that revision, so it keeps pointing at the same character while text
/// is inserted or deleted around it. `End` sticks to the end of the text.
/// Cursors are produced by [`DocumentEngine::cursor`] and turned back into
/// offsets with [`DocumentEngine::cursor_position`].
///
/// [`DocumentEngine::cursor`]: crate::traits::DocumentEngine::cursor
/// [`DocumentEngine::cursor_position`]: crate::traits::DocumentEngine::cursor_position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cursor {
    /// The character inserted at `offset` in revision `born`
    At {
        /// Revision in which the character was inserted
        born: Revision,
        /// Offset of the character in that revision
        offset: usize,
    },
    /// The end of the text
    End,
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::At { born, offset } => write!(f, "{}@{}", offset, born),
            Cursor::End => write!(f, "end"),
        }
    }
}

/// Handle returned when registering a document change listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Create a listener id from its number
    pub const fn new(n: u64) -> Self {
        ListenerId(n)
    }
}
