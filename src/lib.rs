//! Annota - transactional annotation context over live documents
//!
//! Producers (diff computers, selection trackers, link parsers, plugins)
//! attach typed, transient facts to stable references into a mutable JSON
//! document. Consumers read the merged set of live facts for any location
//! and subscribe to net changes.
//!
//! # Quick Start
//!
//! ```
//! use annota::{Context, DocHandle, FieldType, JsonPath, MemoryDocument, Ref};
//!
//! let doc = MemoryDocument::new(serde_json::json!({"title": "hello world"}).into())?;
//! let handle: DocHandle = doc.clone();
//! let title = Ref::path(&handle, JsonPath::root().key("title"))?;
//! let word = title.slice(6, 11)?;
//!
//! let spelling: FieldType<&'static str> = FieldType::define("Spelling");
//! let context = Context::new();
//! let txn = context.change(|c| {
//!     c.add(&word).with(spelling.of("ok"));
//! });
//!
//! doc.splice_text(&JsonPath::root().key("title"), 0, 0, "oh, ")?;
//! assert_eq!(word.value()?, "world".into());
//! assert_eq!(context.get_field(&word, &spelling), Some("ok"));
//!
//! txn.retract();
//! assert!(context.is_empty());
//! # Ok::<(), annota::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `annota-core`: document model, patches, cursors, `DocumentEngine`,
//!   errors and configuration
//! - `annota-document`: in-memory `DocumentEngine`
//! - `annota-context`: refs, fields and the context itself
//! - `annota-primitives`: diff, selection, link and extension producers

pub use annota_context::{
    Annotation, ChangeSet, Context, DumpRow, Field, FieldData, FieldKey, FieldType, Ref,
    RefChange, RefKind, Subscriber, SubscriptionId, Transaction, TxnId, WeakContext,
};
pub use annota_core::{
    AnnotaConfig, Cursor, DiffConfig, DocHandle, DocId, DocPatch, DocumentEngine,
    DocumentLimits, Error, JsonPath, JsonValue, ListenerId, LoggingConfig, PatchAction,
    Result, Revision, CONFIG_FILE_NAME,
};
pub use annota_document::MemoryDocument;
pub use annota_primitives::{
    diff_at, diff_of_doc, extensions_at, link_targets, links_from, refs_with_diff_at,
    render_context, render_dump, slot_values, Computation, DiffEngine, DiffTracker, DiffValue,
    ExtensionValue, LinkValue, Selection, DIFF, EXTENSION, IS_SELECTED, LINK,
};

use tracing_subscriber::EnvFilter;

/// Install a `tracing-subscriber` fmt subscriber writing to stderr
///
/// `RUST_LOG` takes precedence over `config.filter`; an unparsable filter
/// falls back to `info`. Returns false if a global subscriber was already
/// installed, so calling it twice is harmless.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
