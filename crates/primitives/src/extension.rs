//! Extension facts: named slots that plugins fill for a location

use annota_context::{Annotation, Context, FieldType, Ref};
use once_cell::sync::Lazy;

/// Content contributed to an extension slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionValue {
    /// Slot name
    pub slot: String,
    /// Contributed content
    pub value: String,
}

impl ExtensionValue {
    /// Create a slot value
    pub fn new(slot: impl Into<String>, value: impl Into<String>) -> Self {
        ExtensionValue {
            slot: slot.into(),
            value: value.into(),
        }
    }
}

/// Attaches extension content to a ref
pub static EXTENSION: Lazy<FieldType<ExtensionValue>> =
    Lazy::new(|| FieldType::define("Extension"));

/// Extension annotations strictly inside `reference`
pub fn extensions_at(context: &Context, reference: &Ref) -> Vec<Annotation> {
    context
        .get_all_with(&EXTENSION)
        .into_iter()
        .filter(|annotation| {
            annotation.reference().is_part_of(reference) && annotation.reference() != reference
        })
        .collect()
}

/// Values contributed to `slot` strictly inside `reference`
pub fn slot_values(context: &Context, reference: &Ref, slot: &str) -> Vec<String> {
    extensions_at(context, reference)
        .iter()
        .flat_map(|annotation| annotation.get_all(&EXTENSION))
        .filter(|extension| extension.slot == slot)
        .map(|extension| extension.value)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use annota_core::{DocHandle, JsonPath};
    use annota_document::MemoryDocument;
    use serde_json::json;

    #[test]
    fn test_extensions_exclude_the_ref_itself() {
        let handle: DocHandle =
            MemoryDocument::new(json!({"doc": {"title": "x", "body": "y"}}).into()).unwrap();
        let doc = Ref::path(&handle, JsonPath::root().key("doc")).unwrap();
        let title = Ref::path(&handle, JsonPath::root().key("doc").key("title")).unwrap();

        let context = Context::new();
        context.replace(vec![
            doc.with(EXTENSION.of(ExtensionValue::new("badge", "on doc"))),
            title
                .with(EXTENSION.of(ExtensionValue::new("badge", "draft")))
                .with(EXTENSION.of(ExtensionValue::new("tooltip", "title"))),
        ]);

        let inside = extensions_at(&context, &doc);
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0].reference(), &title);
        assert_eq!(slot_values(&context, &doc, "badge"), vec!["draft".to_string()]);
        assert!(extensions_at(&context, &title).is_empty());
    }
}
