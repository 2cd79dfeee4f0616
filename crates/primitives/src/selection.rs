//! Selection producer
//!
//! A [`Selection`] owns a sub-context holding `IS_SELECTED(true)` on the
//! currently selected refs. Queries read the parent context's merged view,
//! so selections made by other producers on the same parent count too.

use annota_context::{Context, FieldType, Ref};
use once_cell::sync::Lazy;

/// Marks a ref as selected
pub static IS_SELECTED: Lazy<FieldType<bool>> = Lazy::new(|| FieldType::define("IsSelected"));

/// Selection state published into a context
///
/// # Example
///
/// ```
/// use annota_context::{Context, Ref};
/// use annota_core::{DocHandle, JsonPath};
/// use annota_document::MemoryDocument;
/// use annota_primitives::Selection;
///
/// let doc: DocHandle = MemoryDocument::new(serde_json::json!({"text": "hello world"}).into()).unwrap();
/// let text = Ref::path(&doc, JsonPath::root().key("text")).unwrap();
///
/// let context = Context::new();
/// let selection = Selection::new(&context);
/// selection.set_selection([text.slice(0, 5).unwrap()]);
///
/// assert!(selection.is_selected(&text.slice(3, 8).unwrap()));
/// assert!(!selection.is_selected(&text.slice(5, 8).unwrap()));
/// ```
pub struct Selection {
    parent: Context,
    sub: Context,
}

impl Selection {
    /// Attach a selection producer to `context`
    pub fn new(context: &Context) -> Self {
        Selection {
            parent: context.clone(),
            sub: context.subcontext(),
        }
    }

    /// Replace this producer's selection with exactly `refs`
    pub fn set_selection(&self, refs: impl IntoIterator<Item = Ref>) {
        self.sub.replace(
            refs.into_iter()
                .map(|reference| reference.with(IS_SELECTED.of(true))),
        );
    }

    /// Deselect everything this producer selected
    pub fn clear(&self) {
        self.sub.replace(Vec::new());
    }

    /// Every selected ref in the parent context
    pub fn selected_refs(&self) -> Vec<Ref> {
        self.parent
            .get_all_with(&IS_SELECTED)
            .into_iter()
            .filter(|annotation| annotation.get(&IS_SELECTED) == Some(true))
            .map(|annotation| annotation.into_reference())
            .collect()
    }

    /// Whether any selected ref overlaps `reference`
    pub fn is_selected(&self, reference: &Ref) -> bool {
        self.selected_refs()
            .iter()
            .any(|selected| selected.does_overlap(reference))
    }

    /// Sub-context holding this producer's selection
    pub fn context(&self) -> &Context {
        &self.sub
    }
}

impl Drop for Selection {
    fn drop(&mut self) {
        self.parent.remove(&self.sub);
    }
}

impl std::fmt::Debug for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("selected", &self.sub.len())
            .finish()
    }
}
