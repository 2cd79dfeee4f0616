//! Annotation context: the transactional fact store
//!
//! Producers contribute facts through [`Context::change`], which returns a
//! [`Transaction`] handle. Calling [`Transaction::change`] again reconciles:
//! the new contribution is compared structurally with the previous one and
//! nothing happens when they are equal. This is what keeps re-running
//! producers from accumulating duplicate facts or firing spurious
//! notifications.
//!
//! ## Reference counting
//!
//! Every stored ref carries the number of live transactions contributing
//! it (one per transaction, however often that transaction added it). A ref
//! is visible to reads iff its count is non-zero.
//!
//! ## Sub-contexts
//!
//! [`Context::subcontext`] creates a child whose contributions are merged
//! into the parent's reads and whose notifications propagate to the
//! parent's subscribers. The parent's own store never contains the child's
//! facts, so a self-contained producer can [`Context::replace`] its whole
//! output without knowing what else is stored.
//!
//! ## Locking
//!
//! Each context has one `parking_lot::Mutex`. Producer closures run before
//! it is taken and subscribers after it is released, so both may call back
//! into the context. A failing or panicking producer leaves the store as it
//! was.

use crate::annotation::{Annotation, Contribution};
use crate::field::{Field, FieldType};
use crate::reference::Ref;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Callback fired after every net change
pub type Subscriber = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`Context::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Identifier of a transaction, unique within a context tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxnId(u64);

/// One row of [`Context::dump`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpRow {
    /// Rendered ref (path, plus `[from:to]` for text spans)
    pub reference: String,
    /// Field name
    pub field: String,
    /// Debug rendering of the value
    pub value: String,
}

/// Contributions of one transaction: refs in first-add order with their
/// fields
type Staged = Vec<(Ref, Vec<Field>)>;

fn same_state(a: &Staged, b: &Staged) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|((ref_a, fields_a), (ref_b, fields_b))| ref_a == ref_b && fields_a == fields_b)
}

/// Builder handed to producer closures
///
/// Adding the same ref twice within one change merges into one entry.
#[derive(Default)]
pub struct ChangeSet {
    entries: Staged,
    index: FxHashMap<Arc<str>, usize>,
}

impl ChangeSet {
    /// Contribute `reference`, returning a builder for its fields
    pub fn add(&mut self, reference: &Ref) -> RefChange<'_> {
        let position = match self.index.get(reference.id()) {
            Some(&position) => position,
            None => {
                self.entries.push((reference.clone(), Vec::new()));
                self.index
                    .insert(Arc::clone(reference.shared_id()), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        RefChange {
            fields: &mut self.entries[position].1,
        }
    }

    /// Contribute an annotation's ref and all its fields
    pub fn annotate(&mut self, annotation: &Annotation) {
        let mut change = self.add(annotation.reference());
        for field in annotation.fields() {
            change = change.with(field.clone());
        }
    }

    /// Number of distinct refs added so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been added
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn into_staged(self) -> Staged {
        self.entries
    }
}

/// Field builder for one ref inside a [`ChangeSet`]
pub struct RefChange<'a> {
    fields: &'a mut Vec<Field>,
}

impl RefChange<'_> {
    /// Attach a field to the ref (chainable)
    pub fn with(self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

struct Stored {
    txn: TxnId,
    contribution: Contribution,
}

struct RefEntry {
    reference: Ref,
    count: usize,
    order: u64,
    contributions: SmallVec<[Stored; 2]>,
}

/// Counters shared by a context and all its sub-contexts
struct Shared {
    next_seq: AtomicU64,
    next_txn: AtomicU64,
    next_subscription: AtomicU64,
    next_context: AtomicU64,
}

impl Shared {
    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }
}

#[derive(Default)]
struct Store {
    entries: FxHashMap<Arc<str>, RefEntry>,
    transactions: FxHashMap<TxnId, Staged>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    children: Vec<Context>,
    parent: Option<Weak<ContextInner>>,
    replace_txn: Option<TxnId>,
}

impl Store {
    fn apply(&mut self, txn: TxnId, staged: Staged, shared: &Shared) {
        for (reference, fields) in &staged {
            let entry = self
                .entries
                .entry(Arc::clone(reference.shared_id()))
                .or_insert_with(|| RefEntry {
                    reference: reference.clone(),
                    count: 0,
                    order: shared.next_seq(),
                    contributions: SmallVec::new(),
                });
            entry.count += 1;
            for field in fields {
                entry.contributions.push(Stored {
                    txn,
                    contribution: Contribution {
                        seq: shared.next_seq(),
                        field: field.clone(),
                    },
                });
            }
        }
        self.transactions.insert(txn, staged);
    }

    /// Remove a transaction's contributions; true if it had any
    fn retract(&mut self, txn: TxnId) -> bool {
        let Some(staged) = self.transactions.remove(&txn) else {
            return false;
        };
        for (reference, _) in &staged {
            let emptied = match self.entries.get_mut(reference.id()) {
                Some(entry) => {
                    entry.count -= 1;
                    entry.contributions.retain(|stored| stored.txn != txn);
                    entry.count == 0
                }
                None => false,
            };
            if emptied {
                self.entries.remove(reference.id());
            }
        }
        !staged.is_empty()
    }
}

struct ContextInner {
    id: u64,
    shared: Arc<Shared>,
    store: Mutex<Store>,
}

/// Merged view entry: first-contribution order, ref, contributions
type Merged = FxHashMap<Arc<str>, (u64, Ref, SmallVec<[Contribution; 2]>)>;

/// The annotation context
///
/// A cheap handle; clones share the same store.
///
/// # Example
///
/// ```
/// use annota_context::{Context, FieldType, Ref};
/// use annota_core::{DocHandle, JsonPath};
/// use annota_document::MemoryDocument;
///
/// let doc: DocHandle = MemoryDocument::new(serde_json::json!({"title": "hi"}).into()).unwrap();
/// let title = Ref::path(&doc, JsonPath::root().key("title")).unwrap();
/// let bold: FieldType<bool> = FieldType::define("Bold");
///
/// let context = Context::new();
/// let txn = context.change(|c| {
///     c.add(&title).with(bold.of(true));
/// });
/// assert_eq!(context.get_field(&title, &bold), Some(true));
///
/// txn.retract();
/// assert!(context.is_empty());
/// ```
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create an empty root context
    pub fn new() -> Self {
        let shared = Arc::new(Shared {
            next_seq: AtomicU64::new(0),
            next_txn: AtomicU64::new(1),
            next_subscription: AtomicU64::new(1),
            next_context: AtomicU64::new(1),
        });
        Self::with_shared(shared, None)
    }

    fn with_shared(shared: Arc<Shared>, parent: Option<Weak<ContextInner>>) -> Self {
        let id = shared.next_context.fetch_add(1, Ordering::Relaxed);
        Context {
            inner: Arc::new(ContextInner {
                id,
                shared,
                store: Mutex::new(Store {
                    parent,
                    ..Store::default()
                }),
            }),
        }
    }

    /// Whether two handles refer to the same context
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// A handle that does not keep the context alive
    ///
    /// Subscribers that need to read the context they are registered on
    /// capture this to avoid a reference cycle.
    pub fn downgrade(&self) -> WeakContext {
        WeakContext {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn next_txn(&self) -> TxnId {
        TxnId(self.inner.shared.next_txn.fetch_add(1, Ordering::Relaxed))
    }

    // ========================================================================
    // Producing
    // ========================================================================

    /// Run a producer and store its contributions as a new transaction
    ///
    /// Subscribers are notified once if anything was contributed.
    pub fn change(&self, f: impl FnOnce(&mut ChangeSet)) -> Transaction {
        let mut changes = ChangeSet::default();
        f(&mut changes);
        let id = self.next_txn();
        self.reconcile(id, changes.into_staged());
        Transaction {
            context: self.clone(),
            id,
        }
    }

    /// Fallible [`Context::change`]; an `Err` leaves the context untouched
    pub fn try_change<E>(
        &self,
        f: impl FnOnce(&mut ChangeSet) -> std::result::Result<(), E>,
    ) -> std::result::Result<Transaction, E> {
        let mut changes = ChangeSet::default();
        f(&mut changes)?;
        let id = self.next_txn();
        self.reconcile(id, changes.into_staged());
        Ok(Transaction {
            context: self.clone(),
            id,
        })
    }

    /// Replace everything previously contributed through `replace` on this
    /// context with `annotations`
    ///
    /// Backed by one context-owned transaction, so identical successive
    /// calls do not notify.
    pub fn replace(&self, annotations: impl IntoIterator<Item = Annotation>) {
        let mut changes = ChangeSet::default();
        for annotation in annotations {
            changes.annotate(&annotation);
        }
        let id = {
            let mut store = self.inner.store.lock();
            match store.replace_txn {
                Some(id) => id,
                None => {
                    let id = self.next_txn();
                    store.replace_txn = Some(id);
                    id
                }
            }
        };
        self.reconcile(id, changes.into_staged());
    }

    /// Install `staged` as the state of transaction `txn`; true on net change
    fn reconcile(&self, txn: TxnId, staged: Staged) -> bool {
        let changed = {
            let mut store = self.inner.store.lock();
            let unchanged = store
                .transactions
                .get(&txn)
                .map(|previous| same_state(previous, &staged));
            match unchanged {
                Some(true) => {
                    trace!(target: "annota::context", context = self.inner.id, txn = txn.0, "Reconciliation skipped, state unchanged");
                    false
                }
                Some(false) => {
                    let had_content = store.retract(txn);
                    let has_content = !staged.is_empty();
                    debug!(target: "annota::context", context = self.inner.id, txn = txn.0, refs = staged.len(), "Transaction reconciled");
                    store.apply(txn, staged, &self.inner.shared);
                    had_content || has_content
                }
                None => {
                    let has_content = !staged.is_empty();
                    debug!(target: "annota::context", context = self.inner.id, txn = txn.0, refs = staged.len(), "Transaction applied");
                    store.apply(txn, staged, &self.inner.shared);
                    has_content
                }
            }
        };
        if changed {
            self.notify();
        }
        changed
    }

    fn retract_txn(&self, txn: TxnId) -> bool {
        let removed = {
            let mut store = self.inner.store.lock();
            store.retract(txn)
        };
        if removed {
            debug!(target: "annota::context", context = self.inner.id, txn = txn.0, "Transaction retracted");
            self.notify();
        }
        removed
    }

    fn is_txn_active(&self, txn: TxnId) -> bool {
        self.inner.store.lock().transactions.contains_key(&txn)
    }

    // ========================================================================
    // Reading
    // ========================================================================

    fn collect(&self, merged: &mut Merged) {
        let children = {
            let store = self.inner.store.lock();
            for (id, entry) in &store.entries {
                let contributions = entry.contributions.iter().map(|s| s.contribution.clone());
                match merged.entry(Arc::clone(id)) {
                    Entry::Occupied(mut slot) => {
                        let (order, _, existing) = slot.get_mut();
                        *order = (*order).min(entry.order);
                        existing.extend(contributions);
                    }
                    Entry::Vacant(slot) => {
                        slot.insert((entry.order, entry.reference.clone(), contributions.collect()));
                    }
                }
            }
            store.children.clone()
        };
        for child in children {
            child.collect(merged);
        }
    }

    fn lookup(&self, id: &str, found: &mut SmallVec<[Contribution; 2]>) -> bool {
        let (present, children) = {
            let store = self.inner.store.lock();
            let present = match store.entries.get(id) {
                Some(entry) => {
                    found.extend(entry.contributions.iter().map(|s| s.contribution.clone()));
                    true
                }
                None => false,
            };
            (present, store.children.clone())
        };
        children
            .iter()
            .fold(present, |any, child| child.lookup(id, found) || any)
    }

    /// Annotations for every live ref, merged across sub-contexts, in
    /// first-contribution order
    pub fn get_all(&self) -> Vec<Annotation> {
        let mut merged = Merged::default();
        self.collect(&mut merged);
        let mut rows: Vec<_> = merged.into_values().collect();
        rows.sort_by_key(|(order, _, _)| *order);
        rows.into_iter()
            .map(|(_, reference, contributions)| {
                Annotation::from_contributions(reference, contributions)
            })
            .collect()
    }

    /// Annotations carrying `field_type`
    pub fn get_all_with<T>(&self, field_type: &FieldType<T>) -> Vec<Annotation> {
        let key = field_type.key();
        self.get_all()
            .into_iter()
            .filter(|annotation| annotation.has_key(key))
            .collect()
    }

    /// Refs of the annotations carrying `field_type`
    pub fn refs_with<T>(&self, field_type: &FieldType<T>) -> Vec<Ref> {
        self.get_all_with(field_type)
            .into_iter()
            .map(Annotation::into_reference)
            .collect()
    }

    /// Merged annotation for exactly `reference`
    ///
    /// Has no fields when nothing is stored for it.
    pub fn resolve(&self, reference: &Ref) -> Annotation {
        let mut found = SmallVec::new();
        self.lookup(reference.id(), &mut found);
        Annotation::from_contributions(reference.clone(), found)
    }

    /// Last-written value of `field_type` on `reference`
    pub fn get_field<T>(&self, reference: &Ref, field_type: &FieldType<T>) -> Option<T>
    where
        T: Clone + fmt::Debug + PartialEq + Send + Sync + 'static,
    {
        self.resolve(reference).get(field_type)
    }

    /// Number of distinct live refs, sub-contexts included
    pub fn len(&self) -> usize {
        let mut merged = Merged::default();
        self.collect(&mut merged);
        merged.len()
    }

    /// Whether no ref is live, sub-contexts included
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live transactions of this context contributing `reference`
    pub fn ref_count(&self, reference: &Ref) -> usize {
        self.inner
            .store
            .lock()
            .entries
            .get(reference.id())
            .map_or(0, |entry| entry.count)
    }

    /// One row per stored field value, for inspection
    pub fn dump(&self) -> Vec<DumpRow> {
        self.get_all()
            .iter()
            .flat_map(|annotation| {
                let reference = annotation.reference().to_string();
                annotation
                    .fields()
                    .map(|field| DumpRow {
                        reference: reference.clone(),
                        field: field.name().to_string(),
                        value: field.value_debug(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Call `f` after every net change of this context or a sub-context
    pub fn subscribe(&self, f: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(
            self.inner
                .shared
                .next_subscription
                .fetch_add(1, Ordering::Relaxed),
        );
        self.inner.store.lock().subscribers.push((id, Arc::new(f)));
        id
    }

    /// Remove a subscriber; false if it was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut store = self.inner.store.lock();
        let before = store.subscribers.len();
        store.subscribers.retain(|(existing, _)| *existing != id);
        store.subscribers.len() != before
    }

    fn notify(&self) {
        let (subscribers, parent) = {
            let store = self.inner.store.lock();
            let subscribers: Vec<Subscriber> = store
                .subscribers
                .iter()
                .map(|(_, subscriber)| Arc::clone(subscriber))
                .collect();
            (subscribers, store.parent.as_ref().and_then(Weak::upgrade))
        };
        for subscriber in subscribers {
            subscriber();
        }
        if let Some(parent) = parent {
            Context { inner: parent }.notify();
        }
    }

    // ========================================================================
    // Sub-contexts
    // ========================================================================

    /// Create a child context merged into this one
    pub fn subcontext(&self) -> Context {
        let child = Self::with_shared(
            Arc::clone(&self.inner.shared),
            Some(Arc::downgrade(&self.inner)),
        );
        self.inner.store.lock().children.push(child.clone());
        debug!(target: "annota::context", parent = self.inner.id, child = child.inner.id, "Subcontext attached");
        child
    }

    /// Detach a sub-context; its facts leave this context's reads
    ///
    /// Returns false if `sub` is not a child of this context.
    pub fn remove(&self, sub: &Context) -> bool {
        let removed = {
            let mut store = self.inner.store.lock();
            let before = store.children.len();
            store.children.retain(|child| !child.ptr_eq(sub));
            store.children.len() != before
        };
        if !removed {
            return false;
        }
        sub.inner.store.lock().parent = None;
        debug!(target: "annota::context", parent = self.inner.id, child = sub.inner.id, "Subcontext detached");
        if !sub.is_empty() {
            self.notify();
        }
        true
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.inner.id)
            .field("refs", &self.len())
            .finish()
    }
}

/// Non-owning handle from [`Context::downgrade`]
#[derive(Clone)]
pub struct WeakContext {
    inner: Weak<ContextInner>,
}

impl WeakContext {
    /// The context, if it is still alive
    pub fn upgrade(&self) -> Option<Context> {
        self.inner.upgrade().map(|inner| Context { inner })
    }
}

impl fmt::Debug for WeakContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakContext")
    }
}

/// One producer's contribution to a context
///
/// Dropping the handle does not retract; call [`Transaction::retract`].
#[must_use = "a transaction's contributions stay live until it is retracted"]
pub struct Transaction {
    context: Context,
    id: TxnId,
}

impl Transaction {
    /// Identifier of this transaction
    pub fn id(&self) -> TxnId {
        self.id
    }

    /// The context this transaction contributes to
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Recompute the contribution, reconciling with the previous one
    ///
    /// Returns true if the stored state changed (and subscribers were
    /// notified). A retracted transaction becomes active again.
    pub fn change(&self, f: impl FnOnce(&mut ChangeSet)) -> bool {
        let mut changes = ChangeSet::default();
        f(&mut changes);
        self.context.reconcile(self.id, changes.into_staged())
    }

    /// Fallible [`Transaction::change`]; an `Err` keeps the previous state
    pub fn try_change<E>(
        &self,
        f: impl FnOnce(&mut ChangeSet) -> std::result::Result<(), E>,
    ) -> std::result::Result<bool, E> {
        let mut changes = ChangeSet::default();
        f(&mut changes)?;
        Ok(self.context.reconcile(self.id, changes.into_staged()))
    }

    /// Remove exactly this transaction's contributions
    ///
    /// A second call is a no-op. Returns true if anything was removed.
    pub fn retract(&self) -> bool {
        self.context.retract_txn(self.id)
    }

    /// Whether the transaction has not been retracted
    pub fn is_active(&self) -> bool {
        self.context.is_txn_active(self.id)
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
