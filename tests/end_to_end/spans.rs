//! Text spans across document edits

use crate::common::*;
use proptest::prelude::*;
use serde_json::json;

#[test]
fn span_follows_insertion_before_it() {
    let doc = TestDoc::new(json!({"text": "hello world"}));
    let span = doc.at("text").slice(2, 5).unwrap();
    assert_eq!(span.value().unwrap(), "llo".into());

    doc.doc.splice_text(&path("text"), 0, 0, "oh, ").unwrap();
    assert_eq!(span.value().unwrap(), "llo".into());
    assert_eq!((span.from().unwrap(), span.to().unwrap()), (6, 9));
}

#[test]
fn span_overlap_is_strict() {
    let doc = TestDoc::new(json!({"text": "hello world"}));
    let text = doc.at("text");
    let a = text.slice(0, 5).unwrap();
    let b = text.slice(4, 8).unwrap();
    let c = text.slice(0, 4).unwrap();

    assert!(a.does_overlap(&b));
    assert!(b.does_overlap(&a));
    assert!(!c.does_overlap(&b));
}

#[test]
fn collapsed_span_reads_empty() {
    let doc = TestDoc::new(json!({"text": "hello world"}));
    let span = doc.at("text").slice(2, 5).unwrap();
    doc.doc.splice_text(&path("text"), 0, 8, "").unwrap();
    assert_eq!(span.value().unwrap(), "".into());
}

#[test]
fn span_annotation_keeps_its_slot() {
    let doc = TestDoc::new(json!({"text": "hello world"}));
    let word = doc.at("text").slice(6, 11).unwrap();
    let typo: FieldType<bool> = FieldType::define("Typo");
    let context = Context::new();
    let _txn = context.change(|c| {
        c.add(&word).with(typo.of(true));
    });

    doc.doc.splice_text(&path("text"), 0, 0, ">> ").unwrap();
    let again = doc.at("text").slice(9, 14).unwrap();
    assert_eq!(again, word);
    assert_eq!(context.get_field(&again, &typo), Some(true));
}

proptest! {
    #[test]
    fn span_content_survives_unrelated_inserts(
        prefix_inserts in proptest::collection::vec("[a-z]{1,4}", 0..6),
    ) {
        let doc = TestDoc::new(json!({"text": "hello world"}));
        let span = doc.at("text").slice(2, 5).unwrap();
        for insert in &prefix_inserts {
            doc.doc.splice_text(&path("text"), 0, 0, insert).unwrap();
        }
        prop_assert_eq!(span.value().unwrap(), JsonValue::from("llo"));
    }
}
