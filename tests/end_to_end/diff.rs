//! Diff annotations driven by document changes

use crate::common::*;
use annota::{diff_at, diff_of_doc, refs_with_diff_at, DiffEngine, DiffValue, Error, DIFF};
use serde_json::json;

#[test]
fn added_key_is_the_only_annotation() {
    let doc = TestDoc::new(json!({"a": 1}));
    let before = doc.heads();
    doc.doc.put(&path("b"), 2.into()).unwrap();

    let annotations = diff_of_doc(&doc.handle, Some(before)).unwrap();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].reference(), &doc.at("b"));
    assert_eq!(annotations[0].get(&DIFF), Some(DiffValue::Added));

    let context = Context::new();
    context.replace(annotations);
    assert_eq!(diff_at(&context, &doc.at("a")), None);
}

#[test]
fn nested_change_marks_the_container() {
    let doc = TestDoc::new(json!({"x": {"y": 1}}));
    let before = doc.heads();
    doc.doc.put(&path("x.y"), 2.into()).unwrap();

    let context = Context::new();
    context.replace(diff_of_doc(&doc.handle, Some(before)).unwrap());

    assert_eq!(
        diff_at(&context, &doc.at("x")),
        Some(DiffValue::Changed {
            before: json!({"y": 1}).into()
        })
    );
    assert!(diff_at(&context, &doc.at("x.y")).is_some());
    assert_eq!(refs_with_diff_at(&context, &doc.at("x")).len(), 1);
    assert_eq!(refs_with_diff_at(&context, &doc.at("")).len(), 2);
}

#[test]
fn tracked_diff_reflects_every_edit() {
    let doc = TestDoc::new(json!({"title": "draft", "tags": []}));
    let context = Context::new();
    let notifications = NotificationCounter::attach(&context);
    let tracker = DiffEngine::default()
        .track(&context, &doc.handle, doc.heads())
        .unwrap();

    doc.doc.splice_text(&path("title"), 5, 0, " two").unwrap();
    doc.doc
        .insert(&path("tags").index(0), vec!["new".into()])
        .unwrap();

    let title_changes = refs_with_diff_at(&context, &doc.at("title"));
    assert_eq!(title_changes.len(), 1);
    assert_eq!(title_changes[0].reference().value().unwrap(), " two".into());
    assert_eq!(
        diff_at(&context, &doc.at("tags")),
        Some(DiffValue::Changed {
            before: json!([]).into()
        })
    );
    assert_eq!(notifications.get(), 2);

    drop(tracker);
    assert!(context.is_empty());
    assert_eq!(notifications.get(), 3);
}

#[test]
fn array_deletions_are_reported_not_dropped() {
    let doc = TestDoc::new(json!({"items": ["a", "b"]}));
    let before = doc.heads();
    doc.doc.delete(&path("items").index(0)).unwrap();

    let err = diff_of_doc(&doc.handle, Some(before)).unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)));
}
