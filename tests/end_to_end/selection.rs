//! Shared selection across components

use crate::common::*;
use annota::{render_context, Selection, IS_SELECTED};
use serde_json::json;
use std::sync::Arc;

#[test]
fn shared_selection_scenario() {
    let doc = TestDoc::new(json!({"a": 1, "b": 2, "c": 3}));
    let (ref1, ref2, ref3) = (doc.at("a"), doc.at("b"), doc.at("c"));

    let context = Context::new();
    let notifications = NotificationCounter::attach(&context);
    let shared = Arc::new(Selection::new(&context));
    let component_a = Arc::clone(&shared);
    let component_b = Arc::clone(&shared);

    component_a.set_selection([ref1.clone()]);
    assert!(component_b.is_selected(&ref1));

    component_b.set_selection([ref1.clone(), ref2.clone()]);
    assert!(component_a.is_selected(&ref1));
    assert!(component_a.is_selected(&ref2));
    assert!(!component_a.is_selected(&ref3));

    component_b.clear();
    for reference in [&ref1, &ref2, &ref3] {
        assert!(!component_a.is_selected(reference));
    }
    assert_eq!(notifications.get(), 3);
}

#[test]
fn independent_selections_merge_in_the_parent() {
    let doc = TestDoc::new(json!({"a": 1, "b": 2}));
    let context = Context::new();
    let left = Selection::new(&context);
    let right = Selection::new(&context);

    left.set_selection([doc.at("a")]);
    right.set_selection([doc.at("b")]);
    assert_eq!(context.refs_with(&IS_SELECTED).len(), 2);

    drop(right);
    assert_eq!(left.selected_refs(), vec![doc.at("a")]);
    assert_eq!(render_context(&context), "ref  field       value\na    IsSelected  true\n");
}
