//! In-memory document engine for annota
//!
//! [`MemoryDocument`] is a reference implementation of
//! [`annota_core::DocumentEngine`]: a JSON document with a linear revision
//! history, structural diffs between any two revisions and stable text
//! cursors. It backs the tests of every other crate and is suitable for
//! single-process use.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod structural;

pub use document::MemoryDocument;
pub use structural::{StructuralDiff, TextEdit};
