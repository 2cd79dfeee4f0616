//! Cursor stability across text edits

use annota_core::{DocumentEngine, JsonPath, JsonValue, Revision};
use annota_document::MemoryDocument;
use proptest::prelude::*;
use serde_json::json;

fn text_path() -> JsonPath {
    JsonPath::root().key("text")
}

fn text_of(doc: &MemoryDocument) -> String {
    doc.resolve(&text_path(), None)
        .unwrap()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap()
}

#[test]
fn cursor_follows_char_through_many_edits() {
    let doc = MemoryDocument::new(json!({"text": "hello world"}).into()).unwrap();
    let path = text_path();
    let w = doc.cursor(&path, 6, None).unwrap();

    doc.splice_text(&path, 0, 0, "say: ").unwrap();
    doc.splice_text(&path, 10, 1, ",").unwrap();
    doc.splice_text(&path, 0, 3, "SAY").unwrap();

    let text = text_of(&doc);
    let pos = doc.cursor_position(&path, &w, None).unwrap();
    assert_eq!(text.chars().nth(pos), Some('w'));
}

#[test]
fn text_replaced_by_non_text_is_not_a_cursor_target() {
    let doc = MemoryDocument::new(json!({"text": "abc"}).into()).unwrap();
    let path = text_path();
    let c = doc.cursor(&path, 1, None).unwrap();
    doc.put(&path, JsonValue::from(3)).unwrap();
    assert!(doc.cursor_position(&path, &c, None).is_err());
    assert_eq!(
        doc.cursor_position(&path, &c, Some(Revision::INITIAL)).unwrap(),
        1
    );
}

#[test]
fn nested_text_in_array_element() {
    let doc = MemoryDocument::new(json!({"todos": [{"title": "buy milk"}]}).into()).unwrap();
    let path: JsonPath = "todos[0].title".parse().unwrap();
    let m = doc.cursor(&path, 4, None).unwrap();
    doc.splice_text(&path, 4, 0, "oat ").unwrap();
    assert_eq!(doc.cursor_position(&path, &m, None).unwrap(), 8);
}

proptest! {
    #[test]
    fn cursor_survives_insertions(
        initial in "[a-z]{1,20}",
        pick in 0usize..20,
        inserts in prop::collection::vec((0usize..40, "[A-Z]{1,4}"), 1..6),
    ) {
        let doc = MemoryDocument::new(json!({ "text": initial.clone() }).into()).unwrap();
        let path = text_path();
        let index = pick % initial.chars().count();
        let expected = initial.chars().nth(index).unwrap();
        let cursor = doc.cursor(&path, index, None).unwrap();

        for (at, insert) in inserts {
            let len = text_of(&doc).chars().count();
            doc.splice_text(&path, at % (len + 1), 0, &insert).unwrap();
        }

        let pos = doc.cursor_position(&path, &cursor, None).unwrap();
        prop_assert_eq!(text_of(&doc).chars().nth(pos), Some(expected));
    }

    #[test]
    fn independent_cursors_for_same_char_are_equal(
        initial in "[a-z]{1,12}",
        pick in 0usize..12,
        prefix in "[A-Z]{0,5}",
    ) {
        let doc = MemoryDocument::new(json!({ "text": initial.clone() }).into()).unwrap();
        let path = text_path();
        let index = pick % initial.chars().count();
        let before = doc.cursor(&path, index, None).unwrap();
        doc.splice_text(&path, 0, 0, &prefix).unwrap();
        let after = doc.cursor(&path, index + prefix.chars().count(), None).unwrap();
        prop_assert_eq!(before, after);
    }
}
