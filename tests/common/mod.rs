//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

pub use annota::{
    Context, DocHandle, DocumentEngine, FieldType, JsonPath, JsonValue, MemoryDocument, Ref,
    Revision,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Documents
// ============================================================================

/// An in-memory document plus its engine handle.
pub struct TestDoc {
    pub doc: Arc<MemoryDocument>,
    pub handle: DocHandle,
}

impl TestDoc {
    pub fn new(value: Value) -> Self {
        let doc = MemoryDocument::new(value.into()).expect("valid document");
        let handle: DocHandle = doc.clone();
        TestDoc { doc, handle }
    }

    pub fn heads(&self) -> Revision {
        self.handle.heads()
    }

    /// PathRef for a path given as dotted keys (`"a.b"`; empty for the root).
    pub fn at(&self, dotted: &str) -> Ref {
        Ref::path(&self.handle, path(dotted)).expect("path resolves")
    }
}

/// JsonPath from dotted keys.
pub fn path(dotted: &str) -> JsonPath {
    dotted
        .split('.')
        .filter(|key| !key.is_empty())
        .fold(JsonPath::root(), |p, key| p.key(key))
}

// ============================================================================
// Notifications
// ============================================================================

/// Counts subscriber calls on a context.
pub struct NotificationCounter {
    count: Arc<AtomicUsize>,
}

impl NotificationCounter {
    pub fn attach(context: &Context) -> Self {
        let count = Arc::new(AtomicUsize::new(0));
        let bump = Arc::clone(&count);
        context.subscribe(move || {
            bump.fetch_add(1, Ordering::SeqCst);
        });
        NotificationCounter { count }
    }

    pub fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}
