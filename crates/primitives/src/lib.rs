//! Producers and queries built on the annota context
//!
//! - [`DiffEngine`] / [`DIFF`]: change annotations between revisions, plus
//!   a live [`DiffTracker`]
//! - [`Selection`] / [`IS_SELECTED`]: shared selection state
//! - [`LINK`] and [`EXTENSION`]: link and extension-slot facts with their
//!   queries
//! - [`Computation`]: a value derived from a context, kept up to date
//! - [`render_dump`]: plain-text context viewer

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod computation;
pub mod diff;
pub mod extension;
pub mod link;
pub mod selection;
pub mod viewer;

pub use computation::Computation;
pub use diff::{
    diff_at, diff_of_doc, refs_with_diff_at, DiffEngine, DiffTracker, DiffValue, DIFF,
};
pub use extension::{extensions_at, slot_values, ExtensionValue, EXTENSION};
pub use link::{link_targets, links_from, LinkValue, LINK};
pub use selection::{Selection, IS_SELECTED};
pub use viewer::{render_context, render_dump};
